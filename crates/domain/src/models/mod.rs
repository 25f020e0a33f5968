//! Domain model definitions.

pub mod email_tracking;
pub mod notification;
pub mod pricing_guide;
pub mod reputation;
pub mod warmup;
pub mod webhook_event;

pub use email_tracking::{BounceType, EmailStatus, EmailType, StatusError, MAX_RETRIES, NO_ORDER};
pub use notification::{NotificationSeverity, DEDUP_WINDOW_HOURS};
pub use pricing_guide::RequestType;
pub use reputation::{AuthRecordType, RecordStatus, ReputationStatus};
pub use warmup::{WarmupStatus, WARMUP_PERIOD_DAYS};
pub use webhook_event::{EmailEvent, EmailEventData};
