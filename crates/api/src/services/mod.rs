//! Business logic services.

pub mod bounce;
pub mod delivery;
pub mod dns;
pub mod dns_auth;
pub mod email;
pub mod notifier;
pub mod reputation;
pub mod retry;
pub mod unsubscribe;
pub mod warmup;

pub use bounce::BounceProcessor;
pub use delivery::DeliveryService;
pub use dns::{apply_policy, CheckedResolver, ErrorPolicy};
pub use dns_auth::AuthenticationChecker;
pub use email::{EmailMessage, EmailService, SendOutcome};
pub use notifier::Notifier;
pub use reputation::BlacklistChecker;
pub use retry::{RetryRunResults, RetryRunner};
pub use unsubscribe::UnsubscribeService;
pub use warmup::WarmupUpdater;
