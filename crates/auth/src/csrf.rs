//! Double-submit CSRF tokens.
//!
//! The browser holds a random per-visitor secret in an HttpOnly cookie; the
//! page fetches a token derived from it and echoes the token in a header.
//! A token is `salt.mac` where `mac = HMAC-SHA256(key, salt "." secret)`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SECRET_BYTES: usize = 18;
const SALT_BYTES: usize = 8;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CsrfError {
    /// The visitor has no CSRF secret cookie yet.
    #[error("Jeton CSRF manquant")]
    MissingSecret,

    /// The request carries no token header.
    #[error("Jeton CSRF manquant")]
    MissingToken,

    /// The token was not derived from this visitor's secret.
    #[error("Jeton CSRF invalide")]
    Mismatch,

    #[error("clé CSRF inutilisable")]
    Key,
}

/// Issues and checks CSRF tokens under one signing key.
pub struct CsrfGuard {
    key: SecretString,
}

impl core::fmt::Debug for CsrfGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CsrfGuard").finish_non_exhaustive()
    }
}

impl CsrfGuard {
    pub fn new(key: SecretString) -> Self {
        Self { key }
    }

    /// Mint a fresh per-visitor secret (cookie value).
    pub fn generate_secret(&self) -> String {
        random_token(SECRET_BYTES)
    }

    /// Derive a token for `secret`. Every call uses a new salt.
    pub fn issue(&self, secret: &str) -> Result<String, CsrfError> {
        let salt = random_token(SALT_BYTES);
        let mac = self.mac(&salt, secret)?;
        Ok(format!("{salt}.{mac}"))
    }

    pub fn verify(&self, secret: Option<&str>, token: Option<&str>) -> Result<(), CsrfError> {
        let secret = secret.filter(|s| !s.is_empty()).ok_or(CsrfError::MissingSecret)?;
        let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or(CsrfError::MissingToken)?;

        let (salt, presented) = token.rsplit_once('.').ok_or(CsrfError::Mismatch)?;
        let expected = self.mac(salt, secret)?;

        if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
            Ok(())
        } else {
            Err(CsrfError::Mismatch)
        }
    }

    fn mac(&self, salt: &str, secret: &str) -> Result<String, CsrfError> {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|_| CsrfError::Key)?;
        mac.update(salt.as_bytes());
        mac.update(b".");
        mac.update(secret.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}

fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
