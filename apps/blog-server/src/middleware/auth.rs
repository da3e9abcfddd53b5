//! Session cookie authentication.
//!
//! The session cookie carries a signed token naming the user. Views that
//! require a login take an [`Identity`]; anonymous requests are redirected
//! to the login page with `next` pointing back at the original path.

use std::future::{Ready, ready};

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, web};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use uuid::Uuid;

use yablog_core::ports::{AuthError, TokenClaims};

use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "yablog_session";

pub const LOGIN_PATH: &str = "/account/login/";

/// Characters kept as-is in the `next` query value.
const NEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Authenticated user identity extractor.
///
/// ```ignore
/// async fn post_search(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            email: claims.email,
        }
    }
}

/// Rejection for anonymous requests to protected views: a redirect to
/// the login page.
#[derive(Debug)]
pub struct LoginRequired {
    pub next: String,
    pub reason: AuthError,
}

impl std::fmt::Display for LoginRequired {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Login required for {}: {}", self.next, self.reason)
    }
}

impl ResponseError for LoginRequired {
    fn status_code(&self) -> StatusCode {
        StatusCode::SEE_OTHER
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::SeeOther()
            .insert_header((header::LOCATION, login_url(&self.next)))
            .finish()
    }
}

/// `/account/login/?next=<path>`
pub fn login_url(next: &str) -> String {
    format!(
        "{}?next={}",
        LOGIN_PATH,
        utf8_percent_encode(next, NEXT_ENCODE_SET)
    )
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    let state = match req.app_data::<web::Data<AppState>>() {
        Some(state) => state,
        None => {
            tracing::error!("AppState not found in app data");
            return Err(AuthError::InvalidToken(
                "Server configuration error".to_string(),
            ));
        }
    };

    let cookie = req
        .cookie(SESSION_COOKIE)
        .ok_or(AuthError::MissingSession)?;

    state
        .tokens
        .validate_token(cookie.value())
        .map(Identity::from)
}

impl FromRequest for Identity {
    type Error = LoginRequired;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(|reason| {
            if !matches!(reason, AuthError::MissingSession) {
                tracing::debug!(error = %reason, "Rejected session cookie");
            }
            let next = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or_else(|| req.path())
                .to_string();
            LoginRequired { next, reason }
        }))
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req).ok())))
    }
}

/// Session cookie holding `token`.
pub fn session_cookie(token: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(max_age_secs))
        .finish()
}

/// Cookie that makes the browser drop the session.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}
