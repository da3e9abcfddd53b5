//! # Yablog Infrastructure
//!
//! Concrete implementations of the ports defined in `yablog-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory store and console mailer only
//! - `postgres` - PostgreSQL repositories via SeaORM
//! - `auth` - JWT session tokens + Argon2 password hashing
//! - `rate-limit` - Rate limiting via governor
//! - `smtp` - SMTP delivery via lettre

pub mod database;
pub mod mail;
pub mod memory;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - always available
pub use database::DatabaseConfig;
pub use mail::{ConsoleMailer, MemoryMailer};
pub use memory::MemoryStore;

#[cfg(feature = "postgres")]
pub use database::{PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

#[cfg(feature = "smtp")]
pub use mail::{SmtpConfig, SmtpMailer};
