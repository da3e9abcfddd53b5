//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::cookie::Cookie;
use chrono::{DateTime, TimeZone, Utc};

use blog_server::middleware::auth::SESSION_COOKIE;
use blog_server::{AppState, SiteSettings};
use yablog_core::domain::{Post, Tag, User};
use yablog_core::ports::{BaseRepository, PostRepository, TokenService, UserRepository};
use yablog_infra::{JwtConfig, JwtTokenService, MemoryMailer, MemoryStore};

pub const SITE_URL: &str = "https://blog.example.com";
pub const MAIL_FROM: &str = "blog@example.com";

/// Build an actix test service over a [`TestApp`]'s state.
#[macro_export]
macro_rules! service {
    ($app:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($app.state.clone()))
                .configure(blog_server::configure_routes),
        )
        .await
    };
}

pub struct TestApp {
    pub store: MemoryStore,
    pub mailer: Arc<MemoryMailer>,
    pub tokens: Arc<JwtTokenService>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let mailer = Arc::new(MemoryMailer::new());
        let tokens = Arc::new(JwtTokenService::new(JwtConfig {
            secret: "integration-test-secret".to_string(),
            ..JwtConfig::default()
        }));

        let site = SiteSettings {
            site_url: Some(SITE_URL.to_string()),
            mail_from: MAIL_FROM.to_string(),
            cookie_secure: false,
        };
        let state = AppState::in_memory(&store, mailer.clone(), tokens.clone(), site).unwrap();

        Self {
            store,
            mailer,
            tokens,
            state,
        }
    }

    /// A user that can only authenticate through [`TestApp::session`].
    pub async fn user(&self, username: &str) -> User {
        let user = User::new(
            username.to_string(),
            format!("{}@example.com", username),
            "not-a-real-hash".to_string(),
        );
        self.store.users().save(user).await.unwrap()
    }

    /// Session cookie for `user`.
    pub fn session(&self, user: &User) -> Cookie<'static> {
        let token = self
            .tokens
            .generate_token(user.id, &user.username, &user.email)
            .unwrap();
        Cookie::new(SESSION_COOKIE, token)
    }

    pub async fn tag(&self, name: &str) -> Tag {
        let tag = Tag::new(name, name.to_lowercase().replace(' ', "-"));
        self.store.posts().save_tag(tag).await.unwrap()
    }

    pub async fn post(&self, author: &User, title: &str, publish: DateTime<Utc>, tags: &[Tag]) -> Post {
        let post = Post::new(author.id, title.to_string(), slugify(title), format!("{} body.", title))
            .published_at(publish)
            .with_tags(tags.to_vec());
        self.store.posts().save(post).await.unwrap()
    }

    pub async fn draft(&self, author: &User, title: &str) -> Post {
        let post = Post::new(author.id, title.to_string(), slugify(title), "Unfinished.".to_string());
        self.store.posts().save(post).await.unwrap()
    }
}

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, d, 12, 0, 0).unwrap()
}

pub fn slugify(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}
