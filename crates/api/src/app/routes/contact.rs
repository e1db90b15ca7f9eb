use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};

use academy_core::ContactForm;

use crate::app::dto::{ContactAccepted, CsrfTokenResponse};
use crate::app::errors::{ApiError, INTERNAL_MESSAGE};
use crate::app::services::AppServices;
use crate::context::RequestContext;
use crate::middleware::{CSRF_COOKIE, cookie_value};

/// Issue a CSRF token, minting the `_csrf` cookie on first visit.
pub async fn csrf_token(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let existing = cookie_value(&headers, CSRF_COOKIE).filter(|s| !s.is_empty());
    let (secret, fresh) = match existing {
        Some(secret) => (secret.to_string(), false),
        None => (services.csrf.generate_secret(), true),
    };

    let token = services
        .csrf
        .issue(&secret)
        .map_err(|e| ApiError::internal(services.mode, INTERNAL_MESSAGE, e))?;

    let mut res = Json(CsrfTokenResponse { csrf_token: token }).into_response();
    if fresh {
        let secure = if services.mode.is_production() { "; Secure" } else { "" };
        let cookie = format!("{CSRF_COOKIE}={secret}; Path=/; HttpOnly; SameSite=Strict{secure}");
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal(services.mode, INTERNAL_MESSAGE, e))?;
        res.headers_mut().append(header::SET_COOKIE, value);
    }
    Ok(res)
}

/// Rate limit and CSRF run as route middleware before this handler.
pub async fn submit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    body: Result<Json<ContactForm>, JsonRejection>,
) -> Result<Json<ContactAccepted>, ApiError> {
    let Json(form) = body.map_err(|e| ApiError::MalformedBody(e.body_text()))?;

    services
        .submissions
        .submit(&form, ctx.meta())
        .await
        .map_err(|e| ApiError::from_submit(services.mode, e))?;

    Ok(Json(ContactAccepted::default()))
}
