//! Enrollment admission and job status services.

pub mod service;
pub mod status;

pub use service::{EnrollmentService, EnrollmentTicket};
pub use status::{JobStatusView, QueueStatusService};
