//! `academy-core`: contact submission domain.
//!
//! Pure types and rules only: no IO, no HTTP, no storage.

pub mod course;
pub mod error;
pub mod id;
pub mod status;
pub mod submission;
pub mod validation;

pub use course::Course;
pub use error::{DomainError, DomainResult};
pub use id::SubmissionId;
pub use status::SubmissionStatus;
pub use submission::{ContactForm, RequestMeta, Submission, ValidContact};
pub use validation::{ValidationError, validate_contact};
