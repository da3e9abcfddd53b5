//! Authentication ports.

use uuid::Uuid;

/// Claims carried by the session token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub exp: i64,
}

/// Token service trait for session token operations.
pub trait TokenService: Send + Sync {
    /// Issue a session token for a user.
    fn generate_token(&self, user_id: Uuid, username: &str, email: &str)
    -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of issued tokens.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Not logged in")]
    MissingSession,

    #[error("Hashing error: {0}")]
    HashingError(String),
}
