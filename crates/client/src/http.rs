//! reqwest-backed transport for the contact form.

use async_trait::async_trait;
use serde::Deserialize;

use academy_core::ContactForm;

use crate::form::{ContactTransport, TransportError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsrfTokenBody {
    csrf_token: String,
}

/// Fetches a CSRF token, then posts the form with it. Cookies are kept
/// between the two calls so the token matches the `_csrf` cookie.
#[derive(Debug, Clone)]
pub struct HttpContactClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContactClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// `client` must keep cookies for CSRF to pass.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn csrf_token(&self) -> Result<String, TransportError> {
        let res = self
            .client
            .get(format!("{}/api/csrf-token", self.base_url))
            .send()
            .await
            .map_err(network)?;
        if !res.status().is_success() {
            return Err(TransportError::Status(res.status().as_u16()));
        }
        let body: CsrfTokenBody = res.json().await.map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(body.csrf_token)
    }
}

fn network(e: reqwest::Error) -> TransportError {
    TransportError::Network(e.to_string())
}

#[async_trait]
impl ContactTransport for HttpContactClient {
    async fn submit(&self, form: &ContactForm) -> Result<(), TransportError> {
        let token = self.csrf_token().await?;
        let res = self
            .client
            .post(format!("{}/api/contact", self.base_url))
            .header("x-csrf-token", token)
            .json(form)
            .send()
            .await
            .map_err(network)?;

        let status = res.status();
        if status.is_success() {
            Ok(())
        } else {
            tracing::debug!(status = status.as_u16(), "contact endpoint refused submission");
            Err(TransportError::Status(status.as_u16()))
        }
    }
}
