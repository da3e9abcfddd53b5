//! # Yablog Shared
//!
//! Wire types of the blog server: form submissions, query strings and the
//! problem-details error payload.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
