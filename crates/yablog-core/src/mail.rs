//! Email messages and the post recommendation composed by the share view.

use serde::{Deserialize, Serialize};

use crate::domain::Post;
use crate::forms::SharePost;

/// A plain-text email ready to hand to a [`Mailer`](crate::ports::Mailer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub reply_to: Option<String>,
}

/// Compose the "recommends you read" email.
///
/// The sender identity shown to the recipient is the requester's account
/// email, the envelope sender is the site mailbox `from`.
pub fn share_recommendation(
    share: &SharePost,
    post: &Post,
    post_url: &str,
    user_email: &str,
    from: &str,
) -> EmailMessage {
    let subject = format!(
        "{} ({}) recommends you read {}",
        share.name, user_email, post.title
    );
    let body = format!(
        "Read {} at {} \n\n{}'s comments: {}",
        post.title, post_url, share.name, share.comments
    );

    EmailMessage {
        from: from.to_string(),
        to: vec![share.to.clone()],
        subject,
        body,
        reply_to: Some(user_email.to_string()),
    }
}

/// Mask an address for logging: `jane@example.com` becomes `j***@example.com`.
pub fn mask_address(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let masked_local = match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{}***", first),
            _ => "***".to_string(),
        };
        format!("{}{}", masked_local, domain)
    } else {
        "***".to_string()
    }
}
