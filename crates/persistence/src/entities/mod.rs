//! Database entity definitions.

pub mod email_tracking;
pub mod notification;
pub mod pricing_guide;
pub mod warmup;

pub use email_tracking::{EmailTrackingEntity, RecipientBounceCount};
pub use notification::AdminNotificationEntity;
pub use pricing_guide::PricingGuideRequestEntity;
pub use warmup::{WarmupDailyStatEntity, WarmupScheduleEntity};
