//! Background job scheduler and job implementations.

mod bounce_unsubscribe;
mod email_retry;
mod notification_cleanup;
mod scheduler;
mod warmup_stats;

pub use bounce_unsubscribe::BounceUnsubscribeJob;
pub use email_retry::EmailRetryJob;
pub use notification_cleanup::NotificationCleanupJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use warmup_stats::WarmupStatsJob;
