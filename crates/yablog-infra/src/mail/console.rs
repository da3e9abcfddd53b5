use async_trait::async_trait;

use yablog_core::mail::{EmailMessage, mask_address};
use yablog_core::ports::{MailError, Mailer};

/// Console mailer - logs messages instead of delivering them (for development).
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let to: Vec<String> = message.to.iter().map(|a| mask_address(a)).collect();
        tracing::info!(
            from = %message.from,
            to = ?to,
            reply_to = ?message.reply_to.as_deref().map(mask_address),
            subject = %message.subject,
            "Email not sent (console mailer)\n{}",
            message.body
        );
        Ok(())
    }
}
