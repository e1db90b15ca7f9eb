//! The contact submission record and its inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Course, SubmissionId, SubmissionStatus};

/// Raw contact-form fields as received from a visitor.
///
/// Missing and `null` fields deserialize to empty strings so that absence is
/// reported by validation (`missing_fields`) rather than by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub course: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub message: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Contact fields after sanitization and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub course: Course,
    pub message: String,
}

/// Request metadata captured alongside a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: String,
    pub user_agent: String,
}

/// A stored contact submission.
///
/// Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub course: Course,
    pub message: String,
    pub ip_address: String,
    pub user_agent: String,
    pub submitted_at: DateTime<Utc>,
    pub status: SubmissionStatus,
}

impl Submission {
    /// Build a new `pending` submission from validated fields.
    pub fn accept(
        id: SubmissionId,
        contact: ValidContact,
        meta: RequestMeta,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            course: contact.course,
            message: contact.message,
            ip_address: meta.ip_address,
            user_agent: meta.user_agent,
            submitted_at,
            status: SubmissionStatus::Pending,
        }
    }
}
