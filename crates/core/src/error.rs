//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error for parsing identifiers and closed enumerations.
///
/// Contact-form rejections have their own type, [`crate::ValidationError`],
/// because each one carries a user-facing message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A moderation status outside the closed enumeration.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// A course outside the offered catalogue.
    #[error("invalid course: {0}")]
    InvalidCourse(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invalid_status(msg: impl Into<String>) -> Self {
        Self::InvalidStatus(msg.into())
    }

    pub fn invalid_course(msg: impl Into<String>) -> Self {
        Self::InvalidCourse(msg.into())
    }
}
