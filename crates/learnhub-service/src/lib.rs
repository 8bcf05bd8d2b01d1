//! # learnhub-service
//!
//! Business logic services for LearnHub. The admission service is the
//! synchronous front door of the enrollment pipeline; the status service
//! exposes job lookups, queue statistics, and best-effort cancellation.

pub mod context;
pub mod enrollment;

pub use context::RequestContext;
