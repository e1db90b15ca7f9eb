use serde::{Deserialize, Serialize};

use academy_core::Submission;

pub const CONTACT_SUCCESS_MESSAGE: &str =
    "Votre demande a été envoyée avec succès. Nous vous contacterons bientôt!";

// -------------------------
// Request DTOs
// -------------------------

/// Raw query strings; parsing happens in `PageRequest::from_raw`.
#[derive(Debug, Default, Deserialize)]
pub struct ListContactsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct ContactAccepted {
    pub success: bool,
    pub message: &'static str,
}

impl Default for ContactAccepted {
    fn default() -> Self {
        Self {
            success: true,
            message: CONTACT_SUCCESS_MESSAGE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusUpdated {
    pub success: bool,
    pub contact: Submission,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: f64,
    pub environment: &'static str,
}
