//! Submission persistence.
//!
//! `SubmissionStore` is the seam between the HTTP layer and storage; the API
//! holds an `Arc<dyn SubmissionStore>` and never knows which backend is live.

use async_trait::async_trait;

use academy_core::{Submission, SubmissionId, SubmissionStatus};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemorySubmissionStore;
pub use postgres::PostgresSubmissionStore;

/// One page of submissions, newest first, plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPage {
    pub items: Vec<Submission>,
    pub total: u64,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("submission already exists: {0}")]
    AlreadyExists(SubmissionId),

    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn insert(&self, submission: &Submission) -> Result<(), StoreError>;

    /// `page` is 1-based. Ordered by `submitted_at` descending.
    async fn list(&self, page: u32, limit: u32) -> Result<SubmissionPage, StoreError>;

    async fn get(&self, id: SubmissionId) -> Result<Option<Submission>, StoreError>;

    /// Overwrite the status. Returns the updated record, or `None` if the id is unknown.
    async fn set_status(
        &self,
        id: SubmissionId,
        status: SubmissionStatus,
    ) -> Result<Option<Submission>, StoreError>;

    /// Short backend name for startup logs.
    fn backend(&self) -> &'static str;
}

/// Rows to skip for a 1-based page.
pub(crate) fn page_offset(page: u32, limit: u32) -> u64 {
    u64::from(page.max(1) - 1) * u64::from(limit)
}
