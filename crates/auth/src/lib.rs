//! `academy-auth`: credential checks for the moderation endpoints and CSRF
//! tokens for the public contact form.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod admin;
pub mod csrf;

pub use admin::{AdminAuthenticator, AdminPrincipal, AuthError, StaticBearerToken};
pub use csrf::{CsrfError, CsrfGuard};
