//! Shared foundations for the Info Hub bot: layered configuration, the
//! ingress error taxonomy, and the process-wide state capabilities
//! (delivery receipts for redelivery detection, per-user rate limiting).

pub mod config;
pub mod errors;
pub mod rate_limit;
pub mod receipts;

pub use config::{AppConfig, ConfigError, DispatchMode, LoadOptions};
pub use errors::IngressError;
pub use rate_limit::{InMemoryRateLimiter, RateBucket, RateDecision, RateLimiter};
pub use receipts::{DeliveryKey, InMemoryReceiptStore, ReceiptStore};
