//! Repository implementations.

pub mod email_tracking;
pub mod notification;
pub mod pricing_guide;
pub mod warmup;

pub use email_tracking::{EmailTrackingRepository, NewTrackingRecord};
pub use notification::NotificationRepository;
pub use pricing_guide::PricingGuideRepository;
pub use warmup::WarmupRepository;
