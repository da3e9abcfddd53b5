use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag attached to posts, addressed by its slug in URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
        }
    }
}
