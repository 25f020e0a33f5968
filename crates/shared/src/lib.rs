//! Shared helpers for the Mailroom backend.
//!
//! This crate contains:
//! - Tracking token generation and webhook signature verification
//! - Input validation for email addresses, domains, and IP addresses

pub mod crypto;
pub mod validation;
