//! Request guards.

pub mod rbac;
