use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DbConn, DbErr, EntityTrait, IntoActiveModel,
    PrimaryKeyTrait,
};

use yablog_core::error::RepoError;
use yablog_core::ports::BaseRepository;

/// Generic PostgreSQL repository implementation.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: DbConn,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

/// Map write failures, surfacing unique/foreign key violations as constraints.
pub(crate) fn write_error(e: DbErr) -> RepoError {
    let err_str = e.to_string();
    if err_str.contains("duplicate") || err_str.contains("unique") {
        RepoError::Constraint("Entity already exists".to_string())
    } else if err_str.contains("foreign key") {
        RepoError::Constraint("Referenced entity does not exist".to_string())
    } else {
        RepoError::Query(err_str)
    }
}

pub(crate) fn query_error(e: DbErr) -> RepoError {
    match e {
        DbErr::Conn(err) => RepoError::Connection(err.to_string()),
        other => RepoError::Query(other.to_string()),
    }
}

/// Update the row with this primary key, inserting it when none exists.
pub(crate) async fn upsert<E>(db: &DbConn, active_model: E::ActiveModel) -> Result<E::Model, RepoError>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + Clone,
{
    match active_model.clone().update(db).await {
        Ok(model) => Ok(model),
        Err(DbErr::RecordNotUpdated) => active_model.insert(db).await.map_err(write_error),
        Err(e) => Err(write_error(e)),
    }
}

#[async_trait]
impl<E, T, ID> BaseRepository<T, ID> for PostgresBaseRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync + Send,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + Sync + Clone,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    ID: Send + Sync + Into<sea_orm::Value> + Clone + Copy + 'static,
    T: From<E::Model> + Into<E::ActiveModel> + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError> {
        let result = E::find_by_id(id).one(&self.db).await.map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        let active_model: E::ActiveModel = entity.into();
        let model = upsert::<E>(&self.db, active_model).await?;
        Ok(model.into())
    }

    async fn delete(&self, id: ID) -> Result<(), RepoError> {
        let result = E::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(query_error)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
