//! SMTP delivery via lettre.

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use yablog_core::mail::{EmailMessage, mask_address};
use yablog_core::ports::{MailError, Mailer};

/// SMTP relay configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl SmtpConfig {
    /// Read `EMAIL_HOST`, `EMAIL_PORT`, `EMAIL_HOST_USER` and
    /// `EMAIL_HOST_PASSWORD`. `None` without `EMAIL_HOST`.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("EMAIL_HOST").ok()?;
        Some(Self {
            host,
            port: std::env::var("EMAIL_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username: std::env::var("EMAIL_HOST_USER").unwrap_or_default(),
            password: std::env::var("EMAIL_HOST_PASSWORD").unwrap_or_default(),
        })
    }
}

/// STARTTLS SMTP mailer.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        tracing::info!(host = %config.host, port = config.port, "SMTP mailer configured");
        Ok(Self { transport })
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailError::Address(format!("{}: {}", mask_address(address), e)))
}

/// Convert to a lettre message.
pub(crate) fn build_message(message: &EmailMessage) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(mailbox(&message.from)?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN);

    for to in &message.to {
        builder = builder.to(mailbox(to)?);
    }
    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(mailbox(reply_to)?);
    }

    builder
        .body(message.body.clone())
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let email = build_message(&message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::info!(
            recipients = message.to.len(),
            "Email sent"
        );
        Ok(())
    }
}
