use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::app::services::AppServices;
use crate::middleware;

pub mod admin;
pub mod contact;
pub mod system;

/// Everything under `/api`.
pub fn router(services: Arc<AppServices>) -> Router {
    let submit = post(contact::submit)
        .layer(axum::middleware::from_fn_with_state(services.clone(), middleware::require_csrf))
        .layer(axum::middleware::from_fn_with_state(services.clone(), middleware::contact_rate_limit));

    let admin = Router::new()
        .route("/contacts", get(admin::list_contacts))
        .route("/contacts/:id/status", patch(admin::update_status))
        .route_layer(axum::middleware::from_fn_with_state(services.clone(), middleware::admin_auth));

    Router::new()
        .route("/csrf-token", get(contact::csrf_token))
        .route("/contact", submit)
        .route("/health", get(system::health))
        .nest("/admin", admin)
        .fallback(system::not_found)
}
