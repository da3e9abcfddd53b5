//! Application state - shared across all handlers.

use std::sync::Arc;

use yablog_core::ports::{
    CommentRepository, Mailer, PasswordService, PostRepository, RateLimiter, TokenService,
    UserRepository,
};
use yablog_infra::{Argon2PasswordService, ConsoleMailer, JwtTokenService, MemoryStore};

use crate::config::{AppConfig, SiteSettings};
use crate::views::Templates;

#[cfg(feature = "postgres")]
use yablog_infra::database::{self, DatabaseConfig};
#[cfg(feature = "postgres")]
use yablog_infra::{PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub share_limiter: Option<Arc<dyn RateLimiter>>,
    pub templates: Arc<Templates>,
    pub site: SiteSettings,
}

/// The three repositories, backed by one store.
struct Repositories {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    fn memory(store: &MemoryStore) -> Self {
        Self {
            users: Arc::new(store.users()),
            posts: Arc::new(store.posts()),
            comments: Arc::new(store.comments()),
        }
    }

    #[cfg(feature = "postgres")]
    async fn postgres(config: &DatabaseConfig) -> Option<Self> {
        match database::connect(config).await {
            Ok(conn) => Some(Self {
                users: Arc::new(PostgresUserRepository::new(conn.clone())),
                posts: Arc::new(PostgresPostRepository::new(conn.clone())),
                comments: Arc::new(PostgresCommentRepository::new(conn)),
            }),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                None
            }
        }
    }
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, ramhorns::Error> {
        let repos = Self::repositories(config).await;
        let mailer = Self::mailer(config);
        let share_limiter = Self::share_limiter(config);

        let state = Self {
            users: repos.users,
            posts: repos.posts,
            comments: repos.comments,
            mailer,
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            share_limiter,
            templates: Arc::new(Templates::new()?),
            site: config.site.clone(),
        };

        tracing::info!("Application state initialized");
        Ok(state)
    }

    /// State over an in-memory store, used when no database is configured
    /// and by the integration tests.
    pub fn in_memory(
        store: &MemoryStore,
        mailer: Arc<dyn Mailer>,
        tokens: Arc<dyn TokenService>,
        site: SiteSettings,
    ) -> Result<Self, ramhorns::Error> {
        let repos = Repositories::memory(store);
        Ok(Self {
            users: repos.users,
            posts: repos.posts,
            comments: repos.comments,
            mailer,
            tokens,
            passwords: Arc::new(Argon2PasswordService::new()),
            share_limiter: None,
            templates: Arc::new(Templates::new()?),
            site,
        })
    }

    pub fn with_share_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.share_limiter = Some(limiter);
        self
    }

    async fn repositories(config: &AppConfig) -> Repositories {
        #[cfg(feature = "postgres")]
        {
            if let Some(db) = &config.database {
                if let Some(repos) = Repositories::postgres(db).await {
                    return repos;
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            }
        }

        #[cfg(not(feature = "postgres"))]
        {
            if config.database.is_some() {
                tracing::warn!("Built without postgres feature - ignoring DATABASE_URL");
            }
        }

        Repositories::memory(&MemoryStore::new())
    }

    fn mailer(config: &AppConfig) -> Arc<dyn Mailer> {
        #[cfg(feature = "smtp")]
        if let Some(smtp) = &config.smtp {
            match yablog_infra::SmtpMailer::new(smtp) {
                Ok(mailer) => return Arc::new(mailer),
                Err(e) => tracing::error!("SMTP setup failed: {}. Using console mailer.", e),
            }
        }

        let _ = config;
        tracing::warn!("EMAIL_HOST not set. Emails will be logged, not sent.");
        Arc::new(ConsoleMailer)
    }

    fn share_limiter(config: &AppConfig) -> Option<Arc<dyn RateLimiter>> {
        #[cfg(feature = "rate-limit")]
        {
            match yablog_infra::InMemoryRateLimiter::new(config.share_rate_limit.clone()) {
                Ok(limiter) => return Some(Arc::new(limiter)),
                Err(e) => tracing::error!("Share rate limiter disabled: {}", e),
            }
        }

        let _ = config;
        None
    }
}
