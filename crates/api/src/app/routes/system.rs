use std::sync::Arc;

use axum::{Json, extract::Extension};
use chrono::{SecondsFormat, Utc};

use crate::app::dto::HealthResponse;
use crate::app::errors::{ApiError, NOT_FOUND_MESSAGE};
use crate::app::services::AppServices;

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: services.started_at.elapsed().as_secs_f64(),
        environment: services.mode.as_str(),
    })
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound(NOT_FOUND_MESSAGE)
}
