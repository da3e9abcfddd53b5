//! # Yablog server
//!
//! Actix-web application: configuration, state, middleware, handlers and
//! views. The binary in `main.rs` wires these into an `HttpServer`.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;
pub mod views;

pub use config::{AppConfig, SiteSettings};
pub use handlers::configure_routes;
pub use state::AppState;
