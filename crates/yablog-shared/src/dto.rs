//! Data Transfer Objects - urlencoded form bodies and query strings.
//!
//! Every field defaults to empty so a missing field reaches validation as
//! "required" instead of failing deserialization.

use serde::{Deserialize, Serialize};

/// `POST /{post_id}/comment/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub body: String,
}

/// `POST /{post_id}/share/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareForm {
    pub name: String,
    pub to: String,
    pub comments: String,
}

/// `GET /search/?query=...`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// `?page=N` or `?page=last` on list views.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub page: Option<String>,
}

/// `POST /account/register/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// `POST /account/login/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// `?next=/path/` carried through the login redirect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NextQuery {
    pub next: Option<String>,
}

impl NextQuery {
    /// The redirect target when it is a local absolute path.
    pub fn local_path(&self) -> Option<&str> {
        local_path(self.next.as_deref())
    }
}

/// Accept only same-site paths such as `/blog/`, never `//host` or a URL.
pub fn local_path(next: Option<&str>) -> Option<&str> {
    next.map(str::trim).filter(|next| {
        next.starts_with('/')
            && !next.starts_with("//")
            && !next.contains('\\')
            && !next.chars().any(|c| c.is_ascii_control())
    })
}
