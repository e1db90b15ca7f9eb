//! In-memory submission store for tests and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use academy_core::{Submission, SubmissionId, SubmissionStatus};

use super::{StoreError, SubmissionPage, SubmissionStore, page_offset};

#[derive(Debug, Default)]
pub struct InMemorySubmissionStore {
    rows: RwLock<HashMap<SubmissionId, Submission>>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Storage("submission lock poisoned".to_string())
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn insert(&self, submission: &Submission) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        if rows.contains_key(&submission.id) {
            return Err(StoreError::AlreadyExists(submission.id));
        }
        rows.insert(submission.id, submission.clone());
        Ok(())
    }

    async fn list(&self, page: u32, limit: u32) -> Result<SubmissionPage, StoreError> {
        let rows = self.rows.read().map_err(poisoned)?;
        let mut all: Vec<&Submission> = rows.values().collect();
        // UUIDv7 ids break timestamp ties in insertion order.
        all.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then_with(|| b.id.cmp(&a.id)));

        let total = all.len() as u64;
        let skip = usize::try_from(page_offset(page, limit)).unwrap_or(usize::MAX);
        let items = all
            .into_iter()
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(SubmissionPage { items, total })
    }

    async fn get(&self, id: SubmissionId) -> Result<Option<Submission>, StoreError> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows.get(&id).cloned())
    }

    async fn set_status(
        &self,
        id: SubmissionId,
        status: SubmissionStatus,
    ) -> Result<Option<Submission>, StoreError> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        Ok(rows.get_mut(&id).map(|row| {
            row.status = status;
            row.clone()
        }))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
