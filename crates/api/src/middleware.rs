use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use academy_auth::AuthError;
use academy_infra::{RateDecision, SlidingWindowLimiter};

use crate::app::errors::{ApiError, CONTACT_RATE_MESSAGE, GENERAL_RATE_MESSAGE};
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub const CSRF_COOKIE: &str = "_csrf";
pub const CSRF_HEADERS: [&str; 3] = ["csrf-token", "x-csrf-token", "x-xsrf-token"];

pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
style-src 'self' 'unsafe-inline' https://fonts.googleapis.com https://cdnjs.cloudflare.com; \
script-src 'self' 'unsafe-inline' https://cdnjs.cloudflare.com https://www.google.com; \
font-src 'self' https://fonts.gstatic.com https://cdnjs.cloudflare.com; \
img-src 'self' data: https:; \
connect-src 'self' https:; \
frame-src https://www.google.com";

pub const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains; preload";

/// Attach a [`RequestContext`] to every request.
pub async fn request_context(State(services): State<Arc<AppServices>>, mut req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ctx = RequestContext::from_parts(req.headers(), peer, services.trust_proxy);
    req.extensions_mut().insert(ctx);
    next.run(req).await
}

pub async fn general_rate_limit(
    State(services): State<Arc<AppServices>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&services.general_limiter, &req, GENERAL_RATE_MESSAGE)?;
    Ok(next.run(req).await)
}

pub async fn contact_rate_limit(
    State(services): State<Arc<AppServices>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&services.contact_limiter, &req, CONTACT_RATE_MESSAGE)?;
    Ok(next.run(req).await)
}

fn enforce(limiter: &SlidingWindowLimiter, req: &Request, message: &'static str) -> Result<(), ApiError> {
    let key = req
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.client_ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    match limiter.check(&key) {
        RateDecision::Allowed { .. } => Ok(()),
        RateDecision::Limited { retry_after } => {
            tracing::warn!(client = %key, path = %req.uri().path(), "rate limit exceeded");
            Err(ApiError::RateLimited { message, retry_after })
        }
    }
}

/// Double-submit check: the token header must be derived from the `_csrf` cookie.
pub async fn require_csrf(
    State(services): State<Arc<AppServices>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = req.headers();
    let secret = cookie_value(headers, CSRF_COOKIE);
    let token = CSRF_HEADERS
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()));

    services.csrf.verify(secret, token).map_err(|e| {
        tracing::debug!(error = %e, "csrf check failed");
        ApiError::Csrf(e)
    })?;

    Ok(next.run(req).await)
}

pub async fn admin_auth(
    State(services): State<Arc<AppServices>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers()).map_err(ApiError::Auth)?;
    let principal = services.admin.authenticate(token).map_err(|e| {
        tracing::warn!(path = %req.uri().path(), "admin request with invalid token");
        ApiError::Auth(e)
    })?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?;

    let header = header.to_str().map_err(|_| AuthError::MissingCredential)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredential)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    Ok(token)
}

/// Value of the first cookie called `name`.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

/// One allowed origin, credentials on.
pub fn cors_layer(frontend_url: &str) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("csrf-token"),
            HeaderName::from_static("x-csrf-token"),
            HeaderName::from_static("x-xsrf-token"),
        ])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!(frontend_url, "FRONTEND_URL is not a valid origin; cross-origin requests are refused"),
    }
    cors
}

/// Response headers applied to every route.
pub fn security_headers() -> [SetResponseHeaderLayer<HeaderValue>; 5] {
    [
        SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        SetResponseHeaderLayer::overriding(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ),
        SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(STRICT_TRANSPORT_SECURITY),
        ),
        SetResponseHeaderLayer::overriding(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
    ]
}
