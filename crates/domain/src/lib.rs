//! Domain layer for the Mailroom backend.
//!
//! This crate contains:
//! - Domain models (tracking records, warm-up schedules, notifications)
//! - Business logic (status transitions, retry policy, DNS record grading)
//! - Domain error types

pub mod models;
pub mod services;
