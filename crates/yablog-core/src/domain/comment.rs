use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment left by a user on a published post.
///
/// `email` is a snapshot of the author's address at the time of writing,
/// it does not follow later changes to the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub body: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Create an active comment owned by `user_id`.
    pub fn new(post_id: Uuid, user_id: Uuid, email: String, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            email,
            body,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}
