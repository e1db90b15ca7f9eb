use std::sync::Arc;

use serde::Serialize;

use academy_core::{Submission, SubmissionId, SubmissionStatus};
use academy_infra::{StoreError, SubmissionStore};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("Statut invalide")]
    InvalidStatus,

    #[error("Contact non trouvé")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Normalised paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Unparseable or non-positive values fall back to defaults; `limit` is capped.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let positive = |raw: Option<&str>| raw.and_then(|v| v.trim().parse::<u32>().ok()).filter(|v| *v >= 1);
        Self {
            page: positive(page).unwrap_or(DEFAULT_PAGE),
            limit: positive(limit).unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactListing {
    pub contacts: Vec<Submission>,
    pub pagination: Pagination,
}

#[derive(Clone)]
pub struct ModerationService {
    store: Arc<dyn SubmissionStore>,
}

impl ModerationService {
    pub fn new(store: Arc<dyn SubmissionStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, request: PageRequest) -> Result<ContactListing, ModerationError> {
        let page = self.store.list(request.page, request.limit).await?;
        Ok(ContactListing {
            contacts: page.items,
            pagination: Pagination {
                page: request.page,
                limit: request.limit,
                total: page.total,
                pages: page.total.div_ceil(u64::from(request.limit)),
            },
        })
    }

    /// The status is checked before the id, so a bad status on an unknown id is a 400.
    pub async fn set_status(&self, id: &str, status: Option<&str>) -> Result<Submission, ModerationError> {
        let status: SubmissionStatus = status
            .and_then(|s| s.parse().ok())
            .ok_or(ModerationError::InvalidStatus)?;
        let id: SubmissionId = id.parse().map_err(|_| ModerationError::NotFound)?;

        let updated = self
            .store
            .set_status(id, status)
            .await?
            .ok_or(ModerationError::NotFound)?;

        tracing::info!(id = %id, status = %status, "submission status updated");
        Ok(updated)
    }
}
