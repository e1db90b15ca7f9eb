use std::sync::Arc;

use academy_auth::AdminPrincipal;
use axum::{
    Json,
    extract::{Extension, Path, Query, rejection::JsonRejection},
};
use tracing::Instrument;

use crate::app::dto::{ListContactsQuery, StatusUpdated, UpdateStatusRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::service::{ContactListing, PageRequest};

pub async fn list_contacts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<AdminPrincipal>,
    Query(query): Query<ListContactsQuery>,
) -> Result<Json<ContactListing>, ApiError> {
    let request = PageRequest::from_raw(query.page.as_deref(), query.limit.as_deref());
    let listing = services
        .moderation
        .list(request)
        .instrument(tracing::info_span!("moderation", moderator = %principal.subject))
        .await
        .map_err(|e| ApiError::from_moderation(services.mode, e))?;
    Ok(Json(listing))
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<StatusUpdated>, ApiError> {
    // A missing or malformed body is just a missing status.
    let status = body.ok().and_then(|Json(b)| b.status);

    let contact = services
        .moderation
        .set_status(&id, status.as_deref())
        .instrument(tracing::info_span!("moderation", moderator = %principal.subject))
        .await
        .map_err(|e| ApiError::from_moderation(services.mode, e))?;

    Ok(Json(StatusUpdated { success: true, contact }))
}
