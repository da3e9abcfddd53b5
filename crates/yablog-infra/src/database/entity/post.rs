//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use yablog_core::domain::{PostStatus, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Status {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
}

impl From<Status> for PostStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => PostStatus::Draft,
            Status::Published => PostStatus::Published,
        }
    }
}

impl From<PostStatus> for Status {
    fn from(status: PostStatus) -> Self {
        match status {
            PostStatus::Draft => Status::Draft,
            PostStatus::Published => Status::Published,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub publish: DateTimeWithTimeZone,
    pub status: Status,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
    #[sea_orm(has_many = "super::post_tag::Entity")]
    PostTag,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::post_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostTag.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::post_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::post_tag::Relation::Post.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Domain post from the row plus its separately loaded tags.
    pub fn into_post(self, tags: Vec<Tag>) -> yablog_core::domain::Post {
        yablog_core::domain::Post {
            id: self.id,
            author_id: self.author_id,
            title: self.title,
            slug: self.slug,
            body: self.body,
            publish: self.publish.into(),
            status: self.status.into(),
            tags,
            created_at: self.created_at.into(),
            updated_at: self.updated_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel. Tags are stored
/// separately in `post_tags`.
impl From<yablog_core::domain::Post> for ActiveModel {
    fn from(post: yablog_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            author_id: Set(post.author_id),
            title: Set(post.title),
            slug: Set(post.slug),
            body: Set(post.body),
            publish: Set(post.publish.into()),
            status: Set(post.status.into()),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
