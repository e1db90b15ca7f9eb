//! Infrastructure layer: configuration, storage, mail and rate limiting.

pub mod config;
pub mod notify;
pub mod rate_limit;
pub mod store;

pub use config::{AppConfig, ConfigError, RuntimeMode, SmtpConfig};
pub use notify::{EmailMessage, LogMailer, MailError, MailTransport, Notifier, RecordingMailer, SmtpMailer};
pub use rate_limit::{RateDecision, RatePolicy, SlidingWindowLimiter};
pub use store::{InMemorySubmissionStore, PostgresSubmissionStore, StoreError, SubmissionPage, SubmissionStore};
