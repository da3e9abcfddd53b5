//! Blog views: post lists, detail, sharing, comments, search and the feed.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::NaiveDate;
use uuid::Uuid;

use yablog_core::domain::{Comment, Post, Tag};
use yablog_core::error::DomainError;
use yablog_core::forms::{FormErrors, validate_comment, validate_search, validate_share};
use yablog_core::mail::{mask_address, share_recommendation};
use yablog_core::pagination::{POSTS_PER_PAGE, PageRequest};
use yablog_core::ports::BaseRepository;
use yablog_core::search::{SIMILAR_POSTS_LIMIT, SIMILARITY_THRESHOLD};
use yablog_shared::dto::{CommentForm, ListQuery, SearchQuery, ShareForm};

use super::{html, see_other, site_root};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::rate_limit;
use crate::state::AppState;
use crate::views::pages::{
    CommentFormView, CommentPage, CommentView, DeleteCommentPage, DetailPage, ListPage, Pager,
    PostSummary, PostView, SearchPage, ShareFormView, SharePage, TagLink, TitledPage, messages,
};
use crate::views::rss::{FEED_ITEMS, FeedChannel};

const POST_LIST_PATH: &str = "/blog/";

/// GET / - landing page, or the post list once logged in.
pub async fn index(state: web::Data<AppState>, identity: OptionalIdentity) -> HttpResponse {
    if identity.0.is_some() {
        return see_other(POST_LIST_PATH);
    }

    let page = TitledPage { title: "Yablog" };
    html(state.templates.render(&state.templates.index, "Yablog", None, &page))
}

/// GET /blog/
pub async fn post_list(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    render_list(&state, &identity, None, &query).await
}

/// GET /posts/tag/{tag_slug}/
pub async fn post_list_by_tag(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let tag = state
        .posts
        .find_tag_by_slug(&slug)
        .await?
        .ok_or_else(|| DomainError::not_found("Tag", &slug))?;

    render_list(&state, &identity, Some(tag), &query).await
}

async fn render_list(
    state: &AppState,
    identity: &Identity,
    tag: Option<Tag>,
    query: &ListQuery,
) -> AppResult<HttpResponse> {
    let request = PageRequest::parse(query.page.as_deref(), POSTS_PER_PAGE)?;
    let page = state.posts.list_published(tag.as_ref(), request).await?;

    let view = ListPage {
        tag: tag.as_ref().map(TagLink::from),
        posts: page.items.iter().map(PostSummary::from).collect(),
        pager: Pager::from(&page),
    };

    Ok(html(state.templates.render(
        &state.templates.list,
        "My Blog",
        Some(identity),
        &view,
    )))
}

fn parse_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// GET /{year}/{month}/{day}/{slug}/
pub async fn post_detail(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, String, String, String)>,
) -> AppResult<HttpResponse> {
    let (year, month, day, slug) = path.into_inner();
    let not_found = || DomainError::not_found("Post", &slug);

    let date = parse_date(&year, &month, &day).ok_or_else(not_found)?;
    let post = state
        .posts
        .find_published_by_date(date, &slug)
        .await?
        .ok_or_else(not_found)?;

    let comments = state.comments.active_for_post(post.id).await?;
    let similar = state.posts.similar_posts(&post, SIMILAR_POSTS_LIMIT).await?;
    let author = state
        .users
        .find_by_id(post.author_id)
        .await?
        .map(|user| user.username)
        .unwrap_or_default();

    let view = DetailPage {
        post: PostView::new(&post, author),
        similar: similar.iter().map(PostSummary::from).collect(),
        comment_count: comments.len(),
        comments: comments
            .iter()
            .map(|comment| CommentView::new(comment, identity.user_id))
            .collect(),
        form: CommentFormView::new(post.id, "", None),
    };

    Ok(html(state.templates.render(
        &state.templates.detail,
        &post.title,
        Some(&identity),
        &view,
    )))
}

/// A published post addressed by its raw id path segment.
async fn published_post(state: &AppState, raw_id: &str) -> AppResult<Post> {
    let id = Uuid::parse_str(raw_id).map_err(|_| DomainError::not_found("Post", raw_id))?;

    state
        .posts
        .find_published(id)
        .await?
        .ok_or_else(|| AppError::from(DomainError::not_found("Post", id)))
}

fn render_share(
    state: &AppState,
    identity: &Identity,
    post: &Post,
    form: &ShareForm,
    errors: Option<&FormErrors>,
    sent: bool,
) -> HttpResponse {
    let view = SharePage {
        post_title: post.title.clone(),
        sent,
        to: form.to.trim().to_string(),
        form: ShareFormView {
            name: form.name.clone(),
            to: form.to.clone(),
            comments: form.comments.clone(),
            name_errors: messages(errors, "name"),
            to_errors: messages(errors, "to"),
            comments_errors: messages(errors, "comments"),
        },
    };

    html(state.templates.render(
        &state.templates.share,
        "Share a post",
        Some(identity),
        &view,
    ))
}

/// GET /{post_id}/share/
pub async fn post_share_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = published_post(&state, &path).await?;
    Ok(render_share(
        &state,
        &identity,
        &post,
        &ShareForm::default(),
        None,
        false,
    ))
}

/// POST /{post_id}/share/ - email a recommendation with the user's
/// account address as Reply-To.
pub async fn post_share(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    form: web::Form<ShareForm>,
) -> AppResult<HttpResponse> {
    let post = published_post(&state, &path).await?;

    let form = form.into_inner();
    let share = match validate_share(&form.name, &form.to, &form.comments) {
        Ok(share) => share,
        Err(errors) => {
            return Ok(render_share(&state, &identity, &post, &form, Some(&errors), false));
        }
    };

    // Only submissions that would send mail count against the quota.
    rate_limit::enforce(
        state.share_limiter.as_ref(),
        &format!("share:{}", identity.user_id),
    )
    .await?;

    let post_url = format!("{}{}", site_root(&req, &state.site), post.canonical_path());
    let message = share_recommendation(
        &share,
        &post,
        &post_url,
        &identity.email,
        &state.site.mail_from,
    );
    state.mailer.send(message).await?;

    tracing::info!(
        post_id = %post.id,
        to = %mask_address(&share.to),
        "Post shared by email"
    );

    Ok(render_share(&state, &identity, &post, &form, None, true))
}

/// POST /{post_id}/comment/
pub async fn post_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post = published_post(&state, &path).await?;
    let form = form.into_inner();

    let view = match validate_comment(&form.body) {
        Ok(body) => {
            let comment = Comment::new(post.id, identity.user_id, identity.email.clone(), body);
            let comment = state.comments.save(comment).await?;
            tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment added");

            CommentPage {
                post_url: post.canonical_path(),
                comment: Some(CommentView::new(&comment, identity.user_id)),
                form: CommentFormView::new(post.id, "", None),
            }
        }
        Err(errors) => CommentPage {
            post_url: post.canonical_path(),
            comment: None,
            form: CommentFormView::new(post.id, &form.body, Some(&errors)),
        },
    };

    Ok(html(state.templates.render(
        &state.templates.comment,
        "Add a comment",
        Some(&identity),
        &view,
    )))
}

/// GET /search/ - trigram title search over published posts.
pub async fn post_search(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let view = match query.query.as_deref() {
        None => SearchPage {
            searched: false,
            query: String::new(),
            query_errors: Vec::new(),
            count: 0,
            results: Vec::new(),
        },
        Some(raw) => match validate_search(raw) {
            Ok(cleaned) => {
                let results = state
                    .posts
                    .search_by_title(&cleaned, SIMILARITY_THRESHOLD)
                    .await?;
                tracing::debug!(results = results.len(), "Title search");

                SearchPage {
                    searched: true,
                    query: cleaned,
                    query_errors: Vec::new(),
                    count: results.len(),
                    results: results
                        .iter()
                        .map(|(post, _score)| PostSummary::from(post))
                        .collect(),
                }
            }
            Err(errors) => SearchPage {
                searched: false,
                query: raw.to_string(),
                query_errors: messages(Some(&errors), "query"),
                count: 0,
                results: Vec::new(),
            },
        },
    };

    Ok(html(state.templates.render(
        &state.templates.search,
        "Search",
        Some(&identity),
        &view,
    )))
}

/// A comment owned by the current user. Someone else's comment is
/// reported exactly like a missing one.
async fn owned_comment(state: &AppState, identity: &Identity, raw_id: &str) -> AppResult<Comment> {
    let id = Uuid::parse_str(raw_id).map_err(|_| DomainError::not_found("Comment", raw_id))?;

    state
        .comments
        .find_owned(id, identity.user_id)
        .await?
        .ok_or_else(|| AppError::from(DomainError::not_found("Comment", id)))
}

/// GET /comment/{comment_id}/delete/
pub async fn delete_comment_confirm(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let comment = owned_comment(&state, &identity, &path).await?;
    let post = state.posts.find_published(comment.post_id).await?;

    let view = DeleteCommentPage {
        post_title: post.as_ref().map(|p| p.title.clone()).unwrap_or_default(),
        post_url: post
            .as_ref()
            .map(Post::canonical_path)
            .unwrap_or_else(|| POST_LIST_PATH.to_string()),
        body: comment.body,
    };

    Ok(html(state.templates.render(
        &state.templates.delete_comment,
        "Delete comment",
        Some(&identity),
        &view,
    )))
}

/// POST /comment/{comment_id}/delete/ - delete and return to the post.
pub async fn delete_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let comment = owned_comment(&state, &identity, &path).await?;
    state.comments.delete(comment.id).await?;
    tracing::info!(comment_id = %comment.id, "Comment deleted");

    let location = state
        .posts
        .find_published(comment.post_id)
        .await?
        .map(|post| post.canonical_path())
        .unwrap_or_else(|| POST_LIST_PATH.to_string());

    Ok(see_other(&location))
}

/// GET /feed/ - RSS of the latest published posts.
pub async fn feed(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.latest_published(FEED_ITEMS).await?;
    let site_url = site_root(&req, &state.site);

    let channel = FeedChannel {
        title: "My blog",
        site_url: &site_url,
        description: "New posts of my blog.",
    };
    let xml = channel.render(&posts)?;

    Ok(HttpResponse::Ok()
        .content_type("application/rss+xml; charset=utf-8")
        .body(xml))
}
