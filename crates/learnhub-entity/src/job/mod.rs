//! Enrollment job entity, status enums, payload, and result types.

pub mod model;
pub mod payload;
pub mod result;
pub mod status;

pub use model::Job;
pub use payload::EnrollmentJobData;
pub use result::EnrollmentResult;
pub use status::{JobPriority, JobStatus};
