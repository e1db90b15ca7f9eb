//! Request orchestration independent of HTTP: the contact submission path
//! and the moderation operations.

pub mod moderation;
pub mod submission;

pub use moderation::{ContactListing, ModerationError, ModerationService, PageRequest, Pagination};
pub use submission::{SubmissionService, SubmitError};
