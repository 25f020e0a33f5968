//! HTTP route handlers.

pub mod emails;
pub mod health;
pub mod jobs;
pub mod reputation;
pub mod tracking;
pub mod warmup;
pub mod webhooks;
