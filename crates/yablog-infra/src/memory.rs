//! In-memory repositories - used when no database is configured, and by tests.
//!
//! All three repositories share one [`MemoryStore`], so a comment can be
//! checked against the posts and users it points at.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use yablog_core::domain::{Comment, Post, Tag, User};
use yablog_core::error::RepoError;
use yablog_core::pagination::{Page, PageRequest, paginate};
use yablog_core::ports::{BaseRepository, CommentRepository, PostRepository, UserRepository};
use yablog_core::search::{rank_by_title, rank_similar};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    tags: HashMap<Uuid, Tag>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    /// Published posts, newest first.
    fn published(&self) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .values()
            .filter(|p| p.is_published())
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.publish.cmp(&a.publish).then_with(|| a.id.cmp(&b.id)));
        posts
    }
}

/// Shared in-memory tables. Data is lost on process restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> MemoryUserRepository {
        MemoryUserRepository {
            store: self.clone(),
        }
    }

    pub fn posts(&self) -> MemoryPostRepository {
        MemoryPostRepository {
            store: self.clone(),
        }
    }

    pub fn comments(&self) -> MemoryCommentRepository {
        MemoryCommentRepository {
            store: self.clone(),
        }
    }
}

pub struct MemoryUserRepository {
    store: MemoryStore,
}

#[async_trait]
impl BaseRepository<User, Uuid> for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.store.tables.write().await;
        let taken = tables.users.values().any(|u| {
            u.id != user.id && (u.username == user.username || u.email == user.email)
        });
        if taken {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.users.remove(&id).ok_or(RepoError::NotFound)?;
        tables.comments.retain(|_, c| c.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }
}

pub struct MemoryCommentRepository {
    store: MemoryStore,
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for MemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.comments.get(&id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint(
                "Referenced entity does not exist".to_string(),
            ));
        }
        if !tables.users.contains_key(&comment.user_id) {
            return Err(RepoError::Constraint(
                "Referenced entity does not exist".to_string(),
            ));
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.comments.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for MemoryCommentRepository {
    async fn active_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id && c.active)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn find_owned(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .comments
            .get(&comment_id)
            .filter(|c| c.is_owned_by(user_id))
            .cloned())
    }
}

pub struct MemoryPostRepository {
    store: MemoryStore,
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
    async fn find_published(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.posts.get(&id).filter(|p| p.is_published()).cloned())
    }

    async fn find_published_by_date(
        &self,
        date: NaiveDate,
        slug: &str,
    ) -> Result<Option<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .published()
            .into_iter()
            .find(|p| p.slug == slug && p.publish.date_naive() == date))
    }

    async fn list_published(
        &self,
        tag: Option<&Tag>,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        let posts: Vec<Post> = tables
            .published()
            .into_iter()
            .filter(|p| tag.is_none_or(|tag| p.tags.iter().any(|t| t.id == tag.id)))
            .collect();

        paginate(posts, page).map_err(|_| RepoError::NotFound)
    }

    async fn similar_posts(&self, post: &Post, limit: u64) -> Result<Vec<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(rank_similar(post, tables.published(), limit))
    }

    async fn search_by_title(
        &self,
        query: &str,
        threshold: f32,
    ) -> Result<Vec<(Post, f32)>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(rank_by_title(query, tables.published(), threshold))
    }

    async fn latest_published(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .published()
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.tags.values().find(|t| t.slug == slug).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        if let Some(missing) = post.tags.iter().find(|t| !tables.tags.contains_key(&t.id)) {
            return Err(RepoError::Constraint(format!(
                "Tag '{}' does not exist",
                missing.slug
            )));
        }
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn save_tag(&self, tag: Tag) -> Result<Tag, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables
            .tags
            .values()
            .any(|t| t.id != tag.id && t.slug == tag.slug)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        tables.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use yablog_core::pagination::POSTS_PER_PAGE;
    use yablog_core::search::SIMILARITY_THRESHOLD;

    fn post(title: &str, days: i64) -> Post {
        let base = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        Post::new(
            Uuid::new_v4(),
            title.to_string(),
            title.to_lowercase().replace(' ', "-"),
            "body".to_string(),
        )
        .published_at(base + Duration::days(days))
    }

    #[tokio::test]
    async fn test_drafts_are_invisible() {
        let store = MemoryStore::new();
        let posts = store.posts();

        let mut draft = post("Draft notes", 0);
        draft.status = yablog_core::domain::PostStatus::Draft;
        let draft = posts.save(draft).await.unwrap();

        assert!(posts.find_published(draft.id).await.unwrap().is_none());
        assert!(
            posts
                .find_published_by_date(draft.publish.date_naive(), &draft.slug)
                .await
                .unwrap()
                .is_none()
        );
        let page = posts
            .list_published(None, PageRequest::first(POSTS_PER_PAGE))
            .await
            .unwrap();
        assert_eq!(page.total_items, 0);
        assert!(
            posts
                .search_by_title("Draft notes", SIMILARITY_THRESHOLD)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_list_by_tag_and_page() {
        let store = MemoryStore::new();
        let posts = store.posts();
        let rust = posts.save_tag(Tag::new("Rust", "rust")).await.unwrap();

        for day in 0..5 {
            let mut p = post(&format!("Post {}", day), day);
            if day % 2 == 0 {
                p = p.with_tags(vec![rust.clone()]);
            }
            posts.save(p).await.unwrap();
        }

        let tagged = posts
            .list_published(Some(&rust), PageRequest::first(POSTS_PER_PAGE))
            .await
            .unwrap();
        assert_eq!(tagged.total_items, 3);
        let titles: Vec<&str> = tagged.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Post 4", "Post 2", "Post 0"]);

        let past_end = PageRequest::parse(Some("3"), POSTS_PER_PAGE).unwrap();
        assert!(matches!(
            posts.list_published(None, past_end).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_comment_ownership() {
        let store = MemoryStore::new();
        let owner = store
            .users()
            .save(User::new("ada".into(), "ada@example.com".into(), "x".into()))
            .await
            .unwrap();
        let p = store.posts().save(post("Hello", 0)).await.unwrap();

        let comment = store
            .comments()
            .save(Comment::new(p.id, owner.id, owner.email.clone(), "hi".into()))
            .await
            .unwrap();

        let comments = store.comments();
        assert!(comments.find_owned(comment.id, owner.id).await.unwrap().is_some());
        assert!(
            comments
                .find_owned(comment.id, Uuid::new_v4())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_comment_requires_existing_post() {
        let store = MemoryStore::new();
        let owner = store
            .users()
            .save(User::new("ada".into(), "ada@example.com".into(), "x".into()))
            .await
            .unwrap();

        let orphan = Comment::new(Uuid::new_v4(), owner.id, owner.email.clone(), "hi".into());
        assert!(matches!(
            store.comments().save(orphan).await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        let users = store.users();
        users
            .save(User::new("ada".into(), "ada@example.com".into(), "x".into()))
            .await
            .unwrap();

        let result = users
            .save(User::new("lovelace".into(), "ada@example.com".into(), "x".into()))
            .await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }
}
