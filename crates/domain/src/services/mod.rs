//! Domain business logic.

pub mod retry_policy;

pub use retry_policy::{RetryPolicy, RETRY_BACKOFF_MINUTES};
