//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbConn, DbErr, EntityTrait,
    FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use yablog_core::domain::{Comment, Post, Tag, User};
use yablog_core::error::RepoError;
use yablog_core::mail::mask_address;
use yablog_core::pagination::{Page, PageRequest};
use yablog_core::ports::{CommentRepository, PostRepository, UserRepository};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity, Status};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error, upsert, write_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

const SIMILAR_POSTS_SQL: &str = r#"
SELECT p.id, p.author_id, p.title, p.slug, p.body, p.publish, p.status, p.created_at, p.updated_at
FROM posts p
JOIN post_tags pt ON pt.post_id = p.id
WHERE p.status = 'published'
  AND p.id <> $1
  AND pt.tag_id IN (SELECT tag_id FROM post_tags WHERE post_id = $1)
GROUP BY p.id
ORDER BY COUNT(pt.tag_id) DESC, p.publish DESC, p.id
LIMIT $2
"#;

// Descending similarity, matching `rank_by_title`; the Django blog this
// replaces sorted ascending.
const SEARCH_SQL: &str = r#"
SELECT p.id, p.author_id, p.title, p.slug, p.body, p.publish, p.status, p.created_at, p.updated_at,
       similarity(p.title, $1) AS similarity
FROM posts p
WHERE p.status = 'published'
  AND similarity(p.title, $1) > $2
ORDER BY similarity DESC, p.publish DESC
"#;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_address(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn active_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::Active.eq(true))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_owned(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Comment>, RepoError> {
        let result = CommentEntity::find_by_id(comment_id)
            .filter(comment::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }
}

/// PostgreSQL post repository. Tags are loaded with one extra query per
/// batch of posts.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    fn published() -> sea_orm::Select<PostEntity> {
        PostEntity::find().filter(post::Column::Status.eq(Status::Published))
    }

    async fn with_tags(&self, models: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let links = PostTagEntity::find()
            .filter(post_tag::Column::PostId.is_in(ids))
            .find_also_related(TagEntity)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for (link, tag) in links {
            if let Some(tag) = tag {
                tags.entry(link.post_id).or_default().push(tag.into());
            }
        }

        Ok(models
            .into_iter()
            .map(|model| {
                let mut post_tags = tags.remove(&model.id).unwrap_or_default();
                post_tags.sort_by(|a, b| a.name.cmp(&b.name));
                model.into_post(post_tags)
            })
            .collect())
    }

    async fn with_tags_one(&self, model: Option<post::Model>) -> Result<Option<Post>, RepoError> {
        match model {
            Some(model) => Ok(self.with_tags(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_published(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let model = Self::published()
            .filter(post::Column::Id.eq(id))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        self.with_tags_one(model).await
    }

    async fn find_published_by_date(
        &self,
        date: NaiveDate,
        slug: &str,
    ) -> Result<Option<Post>, RepoError> {
        let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
            return Ok(None);
        };
        let start = midnight.and_utc();
        let end = start + Duration::days(1);

        let model = Self::published()
            .filter(post::Column::Slug.eq(slug))
            .filter(post::Column::Publish.gte(start))
            .filter(post::Column::Publish.lt(end))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        self.with_tags_one(model).await
    }

    async fn list_published(
        &self,
        tag: Option<&Tag>,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let mut query = Self::published();
        if let Some(tag) = tag {
            query = query
                .join(JoinType::InnerJoin, post::Relation::PostTag.def())
                .filter(post_tag::Column::TagId.eq(tag.id));
        }

        let total = query.clone().count(&self.db).await.map_err(query_error)?;
        let number = page.resolve(total).map_err(|_| RepoError::NotFound)?;

        let models = query
            .order_by_desc(post::Column::Publish)
            .offset(page.offset(number))
            .limit(page.per_page)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(Page {
            items: self.with_tags(models).await?,
            number,
            per_page: page.per_page,
            total_items: total,
        })
    }

    async fn similar_posts(&self, post: &Post, limit: u64) -> Result<Vec<Post>, RepoError> {
        if post.tags.is_empty() {
            return Ok(Vec::new());
        }

        let models = PostEntity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                SIMILAR_POSTS_SQL,
                [post.id.into(), (limit as i64).into()],
            ))
            .all(&self.db)
            .await
            .map_err(query_error)?;

        self.with_tags(models).await
    }

    async fn search_by_title(
        &self,
        query: &str,
        threshold: f32,
    ) -> Result<Vec<(Post, f32)>, RepoError> {
        let rows = self
            .db
            .query_all(Statement::from_sql_and_values(
                DbBackend::Postgres,
                SEARCH_SQL,
                [query.into(), threshold.into()],
            ))
            .await
            .map_err(query_error)?;

        let mut models = Vec::with_capacity(rows.len());
        let mut scores = Vec::with_capacity(rows.len());
        for row in rows {
            models.push(post::Model::from_query_result(&row, "").map_err(query_error)?);
            scores.push(row.try_get::<f32>("", "similarity").map_err(query_error)?);
        }

        let posts = self.with_tags(models).await?;
        Ok(posts.into_iter().zip(scores).collect())
    }

    async fn latest_published(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let models = Self::published()
            .order_by_desc(post::Column::Publish)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        self.with_tags(models).await
    }

    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let result = TagEntity::find()
            .filter(tag::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let tags = post.tags.clone();
        let txn = self.db.begin().await.map_err(query_error)?;

        let active_model: post::ActiveModel = post.into();
        let model = match active_model.clone().update(&txn).await {
            Ok(model) => model,
            Err(DbErr::RecordNotUpdated) => active_model.insert(&txn).await.map_err(write_error)?,
            Err(e) => return Err(write_error(e)),
        };

        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(model.id))
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if !tags.is_empty() {
            let links = tags.iter().map(|tag| post_tag::ActiveModel {
                post_id: Set(model.id),
                tag_id: Set(tag.id),
            });
            PostTagEntity::insert_many(links)
                .exec(&txn)
                .await
                .map_err(write_error)?;
        }

        txn.commit().await.map_err(query_error)?;

        Ok(model.into_post(tags))
    }

    async fn save_tag(&self, tag: Tag) -> Result<Tag, RepoError> {
        let model = upsert::<TagEntity>(&self.db, tag.into()).await?;
        Ok(model.into())
    }
}
