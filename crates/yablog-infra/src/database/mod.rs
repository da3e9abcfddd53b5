//! Database access: connection setup, entities and repositories.

mod connections;

#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

pub use connections::DatabaseConfig;

#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository};
