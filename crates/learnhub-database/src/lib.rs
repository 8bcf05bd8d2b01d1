//! # learnhub-database
//!
//! PostgreSQL connection management and concrete repository implementations
//! for all LearnHub entities, including the atomic queue and enrollment
//! operations the pipeline depends on.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::create_pool;
