use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Comment, Post, Tag, User};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with account lookups.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Find a user by their username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Active comments of a post, oldest first.
    async fn active_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;

    /// A comment only if it belongs to `user_id`.
    async fn find_owned(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Comment>, RepoError>;
}

/// Post repository. Every read method only ever returns published posts.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Published post by id.
    async fn find_published(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Published post by slug whose publish date (UTC) is `date`.
    async fn find_published_by_date(
        &self,
        date: NaiveDate,
        slug: &str,
    ) -> Result<Option<Post>, RepoError>;

    /// One page of published posts, newest first, optionally filtered by tag.
    async fn list_published(
        &self,
        tag: Option<&Tag>,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError>;

    /// Published posts sharing tags with `post`, most shared tags first,
    /// newest first on ties.
    async fn similar_posts(&self, post: &Post, limit: u64) -> Result<Vec<Post>, RepoError>;

    /// Published posts whose title similarity to `query` exceeds `threshold`,
    /// best match first.
    async fn search_by_title(
        &self,
        query: &str,
        threshold: f32,
    ) -> Result<Vec<(Post, f32)>, RepoError>;

    /// Most recent published posts.
    async fn latest_published(&self, limit: u64) -> Result<Vec<Post>, RepoError>;

    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError>;

    /// Create or update a post with its tag links.
    async fn save(&self, post: Post) -> Result<Post, RepoError>;

    async fn save_tag(&self, tag: Tag) -> Result<Tag, RepoError>;
}
