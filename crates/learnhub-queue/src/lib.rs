//! # learnhub-queue
//!
//! The asynchronous course-enrollment pipeline:
//! - A durable job queue backed by PostgreSQL with atomic leasing
//! - A bounded worker pool that polls for and executes enrollment jobs
//! - An executor that dispatches jobs to the registered handler
//! - A maintenance scheduler for stalled-job recovery and queue pruning

pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;
pub mod scheduler;

pub use queue::{EnrollmentQueue, QueueStats};
pub use runner::WorkerRunner;
pub use scheduler::MaintenanceScheduler;
