//! # learnhub-api
//!
//! HTTP API layer for LearnHub built on Axum: application state, the
//! error-to-HTTP mapping, the auth extractor, DTOs, handlers, and the
//! router.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use state::AppState;
