//! HTTP application wiring (Axum router + shared services).
//!
//! - `services.rs`: store, mailer, credentials and limiters
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: the single error type and its JSON rendering

use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, RateLimits};

pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;
const STATIC_CACHE_CONTROL: &str = "public, max-age=86400";

/// Build the full HTTP router (public entrypoint used by `main.rs` and the tests).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let mut app = Router::new().nest("/api", routes::router(services.clone()));

    app = match &services.static_dir {
        Some(dir) => app.fallback_service(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static(STATIC_CACHE_CONTROL),
                ))
                .service(ServeDir::new(dir)),
        ),
        None => app.fallback(routes::system::not_found),
    };

    let mut app = app
        .layer(axum::middleware::from_fn_with_state(services.clone(), middleware::general_rate_limit))
        .layer(axum::middleware::from_fn_with_state(services.clone(), middleware::request_context))
        .layer(Extension(services.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors_layer(&services.frontend_url))
                .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES)),
        );

    for layer in middleware::security_headers() {
        app = app.layer(layer);
    }
    app
}
