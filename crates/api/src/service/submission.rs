use std::sync::Arc;

use chrono::Utc;

use academy_core::{ContactForm, RequestMeta, Submission, SubmissionId, ValidationError, validate_contact};
use academy_infra::{MailError, Notifier, StoreError, SubmissionStore};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("failed to store submission: {0}")]
    Store(#[from] StoreError),

    /// The record was written; only the notification failed.
    #[error("submission {id} stored but notification failed: {source}")]
    Notify { id: SubmissionId, source: MailError },
}

/// Validate, persist, then notify. Nothing is retried.
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn SubmissionStore>,
    notifier: Notifier,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn SubmissionStore>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    pub async fn submit(&self, form: &ContactForm, meta: RequestMeta) -> Result<Submission, SubmitError> {
        let contact = validate_contact(form).inspect_err(|e| {
            tracing::debug!(kind = e.kind(), ip = %meta.ip_address, "contact submission rejected");
        })?;

        let submission = Submission::accept(SubmissionId::new(), contact, meta, Utc::now());

        self.store.insert(&submission).await.inspect_err(|e| {
            tracing::error!(error = %e, "failed to store contact submission");
        })?;

        tracing::info!(id = %submission.id, course = %submission.course, "contact submission accepted");

        if let Err(source) = self.notifier.notify(&submission).await {
            tracing::error!(id = %submission.id, error = %source, "contact notification failed; submission kept");
            return Err(SubmitError::Notify { id: submission.id, source });
        }

        Ok(submission)
    }
}
