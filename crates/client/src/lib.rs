//! Client-side logic for the academy site: the contact form controller, its
//! HTTP transport, and the offline asset cache.
//!
//! Presentation is kept behind small traits (`FormView`, `Network`,
//! `CacheStorage`) so the logic runs the same in tests and in a real shell.

pub mod form;
pub mod http;
pub mod offline;
pub mod types;

pub use form::{ContactTransport, FormController, FormView, LocalValidationError, SubmitOutcome, TransportError};
pub use http::HttpContactClient;
pub use offline::{CacheError, CacheStorage, InMemoryCacheStorage, Network, OfflineCache};
pub use types::{Banner, BannerKind, Notifications, SubmitControl};
