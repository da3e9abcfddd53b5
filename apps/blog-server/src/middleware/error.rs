//! Error handling - HTML error pages carrying RFC 7807 problem details.

use std::fmt;

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use ramhorns::{Content, Template};

use yablog_core::error::{DomainError, RepoError};
use yablog_core::pagination::PageError;
use yablog_core::ports::{AuthError, MailError};
use yablog_shared::ErrorResponse;

const ERROR_PAGE: &str = include_str!("../../templates/error.html");

/// Application-level error type rendered as an HTML error page.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    MethodNotAllowed,
    TooManyRequests { retry_after_secs: u64 },
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::MethodNotAllowed => write!(f, "Method not allowed"),
            AppError::TooManyRequests { retry_after_secs } => {
                write!(f, "Too many requests, retry after {}s", retry_after_secs)
            }
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

#[derive(Content)]
struct ErrorPage<'a> {
    status: u16,
    title: &'a str,
    has_detail: bool,
    detail: &'a str,
}

/// Render problem details as a standalone HTML page.
pub fn render_error_page(error: &ErrorResponse) -> String {
    let page = ErrorPage {
        status: error.status,
        title: &error.title,
        has_detail: error.detail.is_some(),
        detail: error.detail.as_deref().unwrap_or_default(),
    };

    match Template::new(ERROR_PAGE) {
        Ok(template) => template.render(&page),
        Err(e) => {
            tracing::error!(error = %e, "Error page template failed to compile");
            format!("{} {}", error.status, error.title)
        }
    }
}

impl AppError {
    fn problem(&self) -> ErrorResponse {
        match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::MethodNotAllowed => ErrorResponse::method_not_allowed(),
            AppError::TooManyRequests { retry_after_secs } => {
                ErrorResponse::too_many_requests(*retry_after_secs)
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let AppError::TooManyRequests { retry_after_secs } = self {
            response
                .insert_header(("X-RateLimit-Remaining", "0"))
                .insert_header((header::RETRY_AFTER, retry_after_secs.to_string()));
        }

        response
            .content_type("text/html; charset=utf-8")
            .body(render_error_page(&self.problem()))
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, .. } => {
                AppError::NotFound(format!("No {} matches the given query.", entity_type))
            }
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::Duplicate(msg) => AppError::BadRequest(msg),
            DomainError::Unauthorized => AppError::NotFound("Not found.".to_string()),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::BadRequest(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<PageError> for AppError {
    fn from(err: PageError) -> Self {
        AppError::NotFound(format!("Invalid page ({})", err))
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::Internal(format!("Mail delivery failed: {}", err))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(err: quick_xml::Error) -> Self {
        AppError::Internal(format!("Feed rendering failed: {}", err))
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
