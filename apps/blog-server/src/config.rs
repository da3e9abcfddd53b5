//! Application configuration loaded from environment variables.

use std::env;

use yablog_infra::DatabaseConfig;
use yablog_infra::JwtConfig;

#[cfg(feature = "rate-limit")]
use yablog_infra::RateLimitConfig;

#[cfg(feature = "smtp")]
use yablog_infra::SmtpConfig;

/// Sender address used when `EMAIL_HOST_USER` is unset.
const DEFAULT_MAIL_FROM: &str = "webmaster@localhost";

/// Settings the views need at request time.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Absolute site root used in emails and the feed, e.g.
    /// `https://blog.example.com`. Derived from the request when unset.
    pub site_url: Option<String>,
    /// Envelope sender of outgoing mail.
    pub mail_from: String,
    /// Mark the session cookie `Secure`.
    pub cookie_secure: bool,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_url: None,
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            cookie_secure: false,
        }
    }
}

impl SiteSettings {
    pub fn from_env() -> Self {
        Self {
            site_url: env::var("SITE_URL")
                .ok()
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            mail_from: env::var("EMAIL_HOST_USER")
                .ok()
                .filter(|from| !from.is_empty())
                .unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            cookie_secure: env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub site: SiteSettings,
    pub jwt: JwtConfig,
    #[cfg(feature = "smtp")]
    pub smtp: Option<SmtpConfig>,
    #[cfg(feature = "rate-limit")]
    pub share_rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database,
            site: SiteSettings::from_env(),
            jwt: JwtConfig::from_env(),
            #[cfg(feature = "smtp")]
            smtp: SmtpConfig::from_env(),
            #[cfg(feature = "rate-limit")]
            share_rate_limit: RateLimitConfig::from_env("SHARE_RATE_LIMIT"),
        }
    }
}
