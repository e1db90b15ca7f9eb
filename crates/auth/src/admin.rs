use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Identity granted to a moderation request.
///
/// The static-token scheme has a single shared operator; a real identity
/// provider would populate `subject` per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminPrincipal {
    pub subject: String,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No usable bearer credential was presented (401).
    #[error("Token d'authentification requis")]
    MissingCredential,

    /// A credential was presented but does not match (403).
    #[error("Token invalide")]
    InvalidCredential,
}

/// Single-capability credential check for moderation calls.
///
/// Callers only depend on this trait, so the static token can be replaced by
/// a real identity provider without touching them.
pub trait AdminAuthenticator: Send + Sync {
    fn authenticate(&self, bearer: &str) -> Result<AdminPrincipal, AuthError>;
}

/// Compares the presented bearer token to one configured secret.
pub struct StaticBearerToken {
    secret: SecretString,
}

impl StaticBearerToken {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }
}

impl core::fmt::Debug for StaticBearerToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StaticBearerToken").finish_non_exhaustive()
    }
}

impl AdminAuthenticator for StaticBearerToken {
    fn authenticate(&self, bearer: &str) -> Result<AdminPrincipal, AuthError> {
        if bearer.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let expected = self.secret.expose_secret().as_bytes();
        if bool::from(bearer.as_bytes().ct_eq(expected)) {
            Ok(AdminPrincipal {
                subject: "admin".to_string(),
            })
        } else {
            tracing::debug!("moderation token mismatch");
            Err(AuthError::InvalidCredential)
        }
    }
}
