//! Form validation.
//!
//! Each validator takes the raw submitted values and returns either the
//! cleaned data or a [`FormErrors`] map keyed by field name. Values are
//! trimmed before any check, as browsers happily submit stray whitespace.

use std::collections::BTreeMap;

use serde::Serialize;

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "__all__";

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_INVALID_EMAIL: &str = "Enter a valid email address.";
pub const MSG_INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const MSG_PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const MSG_PASSWORD_TOO_SHORT: &str =
    "This password is too short. It must contain at least 8 characters.";
pub const MSG_PASSWORD_NUMERIC: &str = "This password is entirely numeric.";
pub const MSG_PASSWORD_SIMILAR: &str = "The password is too similar to the username.";
pub const MSG_DUPLICATE_USERNAME: &str = "A user with that username already exists.";
pub const MSG_DUPLICATE_EMAIL: &str = "A user with that email already exists.";
pub const MSG_INVALID_LOGIN: &str = "Please enter a correct username and password.";

pub const SHARE_NAME_MAX: usize = 25;
pub const SEARCH_QUERY_MAX: usize = 100;
pub const USERNAME_MAX: usize = 150;
pub const EMAIL_MAX: usize = 254;
pub const PASSWORD_MIN: usize = 8;

/// Field-level validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        self.field(NON_FIELD_ERRORS)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(value)` when no error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Cleaned share form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePost {
    pub name: String,
    pub to: String,
    pub comments: String,
}

/// Cleaned registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Cleaned login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

fn required<'a>(errors: &mut FormErrors, field: &str, value: &'a str) -> Option<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, MSG_REQUIRED);
        None
    } else {
        Some(value)
    }
}

fn max_length(errors: &mut FormErrors, field: &str, value: &str, max: usize) -> bool {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, len
            ),
        );
        false
    } else {
        true
    }
}

/// Structural email check: a dot-atom local part and `domain.tld`.
pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    if !is_dot_atom(local) || value.chars().any(char::is_whitespace) {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let valid_label = |label: &&str| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    };
    if !labels.iter().all(valid_label) {
        return false;
    }

    labels
        .last()
        .map(|tld| tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic))
        .unwrap_or(false)
}

/// Dot-separated runs of atext characters; no empty runs.
fn is_dot_atom(local: &str) -> bool {
    let atext = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~-".contains(c);
    !local.is_empty()
        && local
            .split('.')
            .all(|run| !run.is_empty() && run.chars().all(atext))
}

/// Lowercase the domain part, leave the local part as typed.
pub fn normalize_email(value: &str) -> String {
    match value.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => value.to_string(),
    }
}

fn is_valid_username(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '@' | '.' | '+' | '-'))
}

fn email_field(errors: &mut FormErrors, field: &str, value: &str) -> Option<String> {
    let value = required(errors, field, value)?;
    if !max_length(errors, field, value, EMAIL_MAX) {
        return None;
    }
    if !is_valid_email(value) {
        errors.add(field, MSG_INVALID_EMAIL);
        return None;
    }
    Some(value.to_string())
}

/// Comment form: a required body.
pub fn validate_comment(body: &str) -> Result<String, FormErrors> {
    let mut errors = FormErrors::new();
    let body = required(&mut errors, "body", body).map(str::to_string);
    match body {
        Some(body) => errors.into_result(body),
        None => Err(errors),
    }
}

/// Share form: sender name, recipient address and optional comments.
pub fn validate_share(name: &str, to: &str, comments: &str) -> Result<SharePost, FormErrors> {
    let mut errors = FormErrors::new();

    let name = required(&mut errors, "name", name)
        .filter(|n| max_length(&mut errors, "name", n, SHARE_NAME_MAX))
        .map(str::to_string);
    let to = email_field(&mut errors, "to", to);

    match (name, to) {
        (Some(name), Some(to)) => errors.into_result(SharePost {
            name,
            to,
            comments: comments.trim().to_string(),
        }),
        _ => Err(errors),
    }
}

/// Search form: a required query of at most 100 characters.
pub fn validate_search(query: &str) -> Result<String, FormErrors> {
    let mut errors = FormErrors::new();
    let query = required(&mut errors, "query", query)
        .filter(|q| max_length(&mut errors, "query", q, SEARCH_QUERY_MAX))
        .map(str::to_string);
    match query {
        Some(query) => errors.into_result(query),
        None => Err(errors),
    }
}

/// Registration form. Uniqueness of username and email is checked by the
/// caller against the user store.
pub fn validate_registration(
    username: &str,
    email: &str,
    password1: &str,
    password2: &str,
) -> Result<Registration, FormErrors> {
    let mut errors = FormErrors::new();

    let username = required(&mut errors, "username", username)
        .filter(|u| max_length(&mut errors, "username", u, USERNAME_MAX))
        .filter(|u| {
            let ok = is_valid_username(u);
            if !ok {
                errors.add("username", MSG_INVALID_USERNAME);
            }
            ok
        })
        .map(str::to_string);

    let email = email_field(&mut errors, "email", email).map(|e| normalize_email(&e));

    // Passwords are not trimmed.
    if password1.is_empty() {
        errors.add("password1", MSG_REQUIRED);
    }
    if password2.is_empty() {
        errors.add("password2", MSG_REQUIRED);
    }

    if !password1.is_empty() && !password2.is_empty() {
        if password1 != password2 {
            errors.add("password2", MSG_PASSWORD_MISMATCH);
        } else {
            if password2.chars().count() < PASSWORD_MIN {
                errors.add("password2", MSG_PASSWORD_TOO_SHORT);
            }
            if password2.chars().all(|c| c.is_ascii_digit()) {
                errors.add("password2", MSG_PASSWORD_NUMERIC);
            }
            if let Some(user) = username.as_deref() {
                if password2.to_lowercase() == user.to_lowercase() {
                    errors.add("password2", MSG_PASSWORD_SIMILAR);
                }
            }
        }
    }

    match (username, email) {
        (Some(username), Some(email)) => errors.into_result(Registration {
            username,
            email,
            password: password1.to_string(),
        }),
        _ => Err(errors),
    }
}

/// Login form: both fields required.
pub fn validate_login(username: &str, password: &str) -> Result<Credentials, FormErrors> {
    let mut errors = FormErrors::new();
    let username = required(&mut errors, "username", username).map(str::to_string);
    if password.is_empty() {
        errors.add("password", MSG_REQUIRED);
    }
    match username {
        Some(username) => errors.into_result(Credentials {
            username,
            password: password.to_string(),
        }),
        None => Err(errors),
    }
}
