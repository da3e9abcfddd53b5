use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Tag;
use crate::error::DomainError;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(DomainError::Validation(format!(
                "unknown post status '{}'",
                other
            ))),
        }
    }
}

/// Post entity - represents a blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub publish: DateTime<Utc>,
    pub status: PostStatus,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft post, publish date set to now.
    pub fn new(author_id: Uuid, title: String, slug: String, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            slug,
            body,
            publish: now,
            status: PostStatus::Draft,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn published(mut self) -> Self {
        self.status = PostStatus::Published;
        self
    }

    pub fn published_at(mut self, publish: DateTime<Utc>) -> Self {
        self.publish = publish;
        self.status = PostStatus::Published;
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Path of the detail page: `/{year}/{month}/{day}/{slug}/`.
    pub fn canonical_path(&self) -> String {
        format!(
            "/{}/{}/{}/{}/",
            self.publish.year(),
            self.publish.month(),
            self.publish.day(),
            self.slug
        )
    }

    /// Number of tags shared with `other`.
    pub fn shared_tag_count(&self, other: &Post) -> usize {
        self.tags
            .iter()
            .filter(|tag| other.tags.iter().any(|t| t.id == tag.id))
            .count()
    }

    /// First `words` words of the body, with an ellipsis when truncated.
    pub fn summary(&self, words: usize) -> String {
        let mut parts = self.body.split_whitespace();
        let head: Vec<&str> = parts.by_ref().take(words).collect();
        let mut summary = head.join(" ");
        if parts.next().is_some() {
            summary.push_str(" ...");
        }
        summary
    }
}
