use std::time::Duration;

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use academy_auth::{AuthError, CsrfError};
use academy_core::ValidationError;
use academy_infra::RuntimeMode;

use crate::service::{ModerationError, SubmitError};

pub const CONTACT_RATE_MESSAGE: &str = "Trop de tentatives de contact. Veuillez réessayer dans 15 minutes.";
pub const GENERAL_RATE_MESSAGE: &str = "Trop de requêtes. Veuillez réessayer plus tard.";
pub const NOT_FOUND_MESSAGE: &str = "Endpoint non trouvé";
pub const INTERNAL_MESSAGE: &str = "Erreur interne du serveur";
pub const CONTACT_FAILURE_MESSAGE: &str = "Une erreur est survenue. Veuillez réessayer plus tard.";
pub const ADMIN_FAILURE_MESSAGE: &str = "Erreur serveur";
pub const MALFORMED_BODY_MESSAGE: &str = "Requête invalide";

/// Every error the HTTP layer can return, rendered as `{error, message}`.
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    MalformedBody(String),
    Auth(AuthError),
    Csrf(CsrfError),
    InvalidStatus,
    NotFound(&'static str),
    RateLimited {
        message: &'static str,
        retry_after: Duration,
    },
    /// `detail` is only rendered outside production.
    Internal {
        message: &'static str,
        detail: Option<String>,
    },
}

impl ApiError {
    pub fn internal(mode: RuntimeMode, message: &'static str, detail: impl ToString) -> Self {
        ApiError::Internal {
            message,
            detail: (!mode.is_production()).then(|| detail.to_string()),
        }
    }

    pub fn from_submit(mode: RuntimeMode, err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid(e) => ApiError::Validation(e),
            other => ApiError::internal(mode, CONTACT_FAILURE_MESSAGE, other),
        }
    }

    pub fn from_moderation(mode: RuntimeMode, err: ModerationError) -> Self {
        match err {
            ModerationError::InvalidStatus => ApiError::InvalidStatus,
            ModerationError::NotFound => ApiError::NotFound("Contact non trouvé"),
            ModerationError::Store(e) => ApiError::internal(mode, ADMIN_FAILURE_MESSAGE, e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(e) => {
                let body = json!({
                    "error": "validation_error",
                    "kind": e.kind(),
                    "message": e.to_string(),
                });
                (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
            }
            ApiError::MalformedBody(detail) => {
                tracing::debug!(%detail, "rejected malformed request body");
                json_error(StatusCode::BAD_REQUEST, "validation_error", MALFORMED_BODY_MESSAGE)
            }
            ApiError::Auth(e) => {
                let status = match e {
                    AuthError::MissingCredential => StatusCode::UNAUTHORIZED,
                    AuthError::InvalidCredential => StatusCode::FORBIDDEN,
                };
                json_error(status, "auth_error", e.to_string())
            }
            ApiError::Csrf(e) => json_error(StatusCode::FORBIDDEN, "csrf_error", e.to_string()),
            ApiError::InvalidStatus => json_error(StatusCode::BAD_REQUEST, "invalid_status", "Statut invalide"),
            ApiError::NotFound(message) => json_error(StatusCode::NOT_FOUND, "not_found", message),
            ApiError::RateLimited { message, retry_after } => {
                let mut res = json_error(StatusCode::TOO_MANY_REQUESTS, "rate_limited", message);
                let secs = retry_after.as_secs().max(1);
                if let Ok(v) = HeaderValue::from_str(&secs.to_string()) {
                    res.headers_mut().insert(header::RETRY_AFTER, v);
                }
                res
            }
            ApiError::Internal { message, detail } => {
                let mut body = json!({ "error": "internal_error", "message": message });
                if let Some(detail) = detail {
                    body["detail"] = json!(detail);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
            }
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_split_401_and_403() {
        let missing = ApiError::Auth(AuthError::MissingCredential).into_response();
        let wrong = ApiError::Auth(AuthError::InvalidCredential).into_response();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn detail_is_hidden_in_production() {
        let prod = ApiError::internal(RuntimeMode::Production, INTERNAL_MESSAGE, "db down");
        assert!(matches!(prod, ApiError::Internal { detail: None, .. }));

        let dev = ApiError::internal(RuntimeMode::Development, INTERNAL_MESSAGE, "db down");
        assert!(matches!(dev, ApiError::Internal { detail: Some(ref d), .. } if d == "db down"));
    }

    #[test]
    fn rate_limit_sets_retry_after() {
        let res = ApiError::RateLimited {
            message: CONTACT_RATE_MESSAGE,
            retry_after: Duration::from_secs(90),
        }
        .into_response();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers()[header::RETRY_AFTER], "90");
    }
}
