use async_trait::async_trait;
use tokio::sync::Mutex;

use yablog_core::mail::EmailMessage;
use yablog_core::ports::{MailError, Mailer};

/// Mailer that keeps every message in an outbox. Used by tests.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<EmailMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.outbox.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        if message.to.is_empty() {
            return Err(MailError::Address("no recipients".to_string()));
        }
        self.outbox.lock().await.push(message);
        Ok(())
    }
}
