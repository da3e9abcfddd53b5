//! View models handed to the page templates.

use ramhorns::Content;
use uuid::Uuid;

use yablog_core::domain::{Comment, Post, Tag};
use yablog_core::forms::{FormErrors, NON_FIELD_ERRORS};
use yablog_core::pagination::Page;

/// Words of the body shown in lists, search results and the feed.
pub const EXCERPT_WORDS: usize = 30;

const DATE_FORMAT: &str = "%B %-d, %Y";
const DATE_TIME_FORMAT: &str = "%B %-d, %Y %H:%M";

/// Pages whose only dynamic content is their heading.
#[derive(Content)]
pub struct TitledPage<'a> {
    pub title: &'a str,
}

#[derive(Content)]
pub struct Message {
    pub message: String,
}

/// Error messages of one form field.
pub fn messages(errors: Option<&FormErrors>, field: &str) -> Vec<Message> {
    errors
        .map(|errors| {
            errors
                .field(field)
                .iter()
                .map(|message| Message {
                    message: message.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn non_field_messages(errors: Option<&FormErrors>) -> Vec<Message> {
    messages(errors, NON_FIELD_ERRORS)
}

#[derive(Content)]
pub struct TagLink {
    pub name: String,
    pub url: String,
}

impl From<&Tag> for TagLink {
    fn from(tag: &Tag) -> Self {
        Self {
            name: tag.name.clone(),
            url: tag_url(&tag.slug),
        }
    }
}

pub fn tag_url(slug: &str) -> String {
    format!("/posts/tag/{}/", slug)
}

pub fn share_url(post_id: Uuid) -> String {
    format!("/{}/share/", post_id)
}

pub fn comment_url(post_id: Uuid) -> String {
    format!("/{}/comment/", post_id)
}

pub fn delete_comment_url(comment_id: Uuid) -> String {
    format!("/comment/{}/delete/", comment_id)
}

/// A post as it appears in lists and search results.
#[derive(Content)]
pub struct PostSummary {
    pub title: String,
    pub url: String,
    pub publish: String,
    pub excerpt: String,
    pub tags: Vec<TagLink>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            url: post.canonical_path(),
            publish: post.publish.format(DATE_FORMAT).to_string(),
            excerpt: post.summary(EXCERPT_WORDS),
            tags: post.tags.iter().map(TagLink::from).collect(),
        }
    }
}

#[derive(Content)]
pub struct Pager {
    pub number: u64,
    pub num_pages: u64,
    pub has_previous: bool,
    pub previous_number: u64,
    pub has_next: bool,
    pub next_number: u64,
}

impl<T> From<&Page<T>> for Pager {
    fn from(page: &Page<T>) -> Self {
        Self {
            number: page.number,
            num_pages: page.num_pages(),
            has_previous: page.has_previous(),
            previous_number: page.previous_number().unwrap_or(page.number),
            has_next: page.has_next(),
            next_number: page.next_number().unwrap_or(page.number),
        }
    }
}

#[derive(Content)]
pub struct ListPage {
    pub tag: Option<TagLink>,
    pub posts: Vec<PostSummary>,
    pub pager: Pager,
}

#[derive(Content)]
pub struct PostView {
    pub title: String,
    pub publish: String,
    pub author: String,
    pub body: String,
    pub tags: Vec<TagLink>,
    pub share_url: String,
}

impl PostView {
    pub fn new(post: &Post, author: String) -> Self {
        Self {
            title: post.title.clone(),
            publish: post.publish.format(DATE_FORMAT).to_string(),
            author,
            body: post.body.clone(),
            tags: post.tags.iter().map(TagLink::from).collect(),
            share_url: share_url(post.id),
        }
    }
}

#[derive(Content)]
pub struct CommentView {
    pub email: String,
    pub created: String,
    pub body: String,
    pub can_delete: bool,
    pub delete_url: String,
}

impl CommentView {
    pub fn new(comment: &Comment, viewer: Uuid) -> Self {
        Self {
            email: comment.email.clone(),
            created: comment.created_at.format(DATE_TIME_FORMAT).to_string(),
            body: comment.body.clone(),
            can_delete: comment.is_owned_by(viewer),
            delete_url: delete_comment_url(comment.id),
        }
    }
}

#[derive(Content)]
pub struct CommentFormView {
    pub action: String,
    pub body: String,
    pub body_errors: Vec<Message>,
}

impl CommentFormView {
    pub fn new(post_id: Uuid, body: &str, errors: Option<&FormErrors>) -> Self {
        Self {
            action: comment_url(post_id),
            body: body.to_string(),
            body_errors: messages(errors, "body"),
        }
    }
}

#[derive(Content)]
pub struct DetailPage {
    pub post: PostView,
    pub similar: Vec<PostSummary>,
    pub comment_count: usize,
    pub comments: Vec<CommentView>,
    pub form: CommentFormView,
}

#[derive(Content)]
pub struct ShareFormView {
    pub name: String,
    pub to: String,
    pub comments: String,
    pub name_errors: Vec<Message>,
    pub to_errors: Vec<Message>,
    pub comments_errors: Vec<Message>,
}

#[derive(Content)]
pub struct SharePage {
    pub post_title: String,
    pub sent: bool,
    pub to: String,
    pub form: ShareFormView,
}

#[derive(Content)]
pub struct CommentPage {
    pub post_url: String,
    pub comment: Option<CommentView>,
    pub form: CommentFormView,
}

#[derive(Content)]
pub struct SearchPage {
    pub searched: bool,
    pub query: String,
    pub query_errors: Vec<Message>,
    pub count: usize,
    pub results: Vec<PostSummary>,
}

#[derive(Content)]
pub struct DeleteCommentPage {
    pub post_title: String,
    pub post_url: String,
    pub body: String,
}

#[derive(Content)]
pub struct RegisterPage {
    pub username: String,
    pub email: String,
    pub non_field_errors: Vec<Message>,
    pub username_errors: Vec<Message>,
    pub email_errors: Vec<Message>,
    pub password1_errors: Vec<Message>,
    pub password2_errors: Vec<Message>,
}

#[derive(Content)]
pub struct LoginPage {
    pub username: String,
    pub next: String,
    pub non_field_errors: Vec<Message>,
    pub username_errors: Vec<Message>,
    pub password_errors: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_summary_links_to_canonical_path() {
        let post = Post::new(
            Uuid::new_v4(),
            "Borrowing".to_string(),
            "borrowing".to_string(),
            "Shared and mutable references.".to_string(),
        )
        .published_at(Utc.with_ymd_and_hms(2024, 3, 7, 10, 0, 0).unwrap())
        .with_tags(vec![Tag::new("Rust", "rust")]);

        let summary = PostSummary::from(&post);

        assert_eq!(summary.url, "/2024/3/7/borrowing/");
        assert_eq!(summary.publish, "March 7, 2024");
        assert_eq!(summary.tags[0].url, "/posts/tag/rust/");
    }

    #[test]
    fn test_messages_for_field() {
        let mut errors = FormErrors::new();
        errors.add("to", "Enter a valid email address.");

        assert_eq!(messages(Some(&errors), "to").len(), 1);
        assert!(messages(Some(&errors), "name").is_empty());
        assert!(messages(None, "to").is_empty());
    }
}
