//! Outgoing mail port.

use async_trait::async_trait;

use crate::mail::EmailMessage;

/// Mailer trait - abstraction over mail transports (SMTP, console, memory).
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a single message.
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

/// Mail delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Transport(String),
}
