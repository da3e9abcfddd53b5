//! Comment entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for yablog_core::domain::Comment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            user_id: model.user_id,
            email: model.email,
            body: model.body,
            active: model.active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<yablog_core::domain::Comment> for ActiveModel {
    fn from(comment: yablog_core::domain::Comment) -> Self {
        Self {
            id: Set(comment.id),
            post_id: Set(comment.post_id),
            user_id: Set(comment.user_id),
            email: Set(comment.email),
            body: Set(comment.body),
            active: Set(comment.active),
            created_at: Set(comment.created_at.into()),
            updated_at: Set(comment.updated_at.into()),
        }
    }
}
