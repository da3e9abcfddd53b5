//! # Yablog Core
//!
//! The domain layer of the blog.
//! Entities, ports, form validation and the small amount of ranking logic
//! the views rely on. No infrastructure dependencies live here.

pub mod domain;
pub mod error;
pub mod forms;
pub mod mail;
pub mod pagination;
pub mod ports;
pub mod search;

pub use error::DomainError;
