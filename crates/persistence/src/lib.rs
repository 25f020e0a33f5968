//! Persistence layer for the Mailroom backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - Embedded migrations (src/migrations)

pub mod db;
pub mod entities;
pub mod repositories;
