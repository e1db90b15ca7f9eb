//! Shared UI-facing types.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub const SUCCESS_BANNER_TTL: Duration = Duration::from_secs(8);
pub const ERROR_BANNER_TTL: Duration = Duration::from_secs(5);

pub const SUCCESS_MESSAGE: &str =
    "Votre demande a été envoyée avec succès. Nous vous contacterons bientôt!";
pub const SEND_FAILED_MESSAGE: &str = "Erreur lors de l'envoi. Veuillez réessayer.";

pub const SUBMIT_LABEL: &str = "Demander des informations";
pub const BUSY_LABEL: &str = "Envoi en cours...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerKind {
    Success,
    Error,
}

/// A dismissible notification shown above the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
    #[serde(skip)]
    pub ttl: Duration,
}

impl Banner {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            message: message.into(),
            ttl: SUCCESS_BANNER_TTL,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
            ttl: ERROR_BANNER_TTL,
        }
    }
}

/// State of the submit button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitControl {
    pub enabled: bool,
    pub label: &'static str,
}

impl SubmitControl {
    pub const IDLE: SubmitControl = SubmitControl {
        enabled: true,
        label: SUBMIT_LABEL,
    };
    pub const BUSY: SubmitControl = SubmitControl {
        enabled: false,
        label: BUSY_LABEL,
    };
}

/// At most one banner at a time; showing a new one replaces the old.
#[derive(Debug, Default)]
pub struct Notifications {
    current: Option<(Banner, Instant)>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, banner: Banner, now: Instant) {
        self.current = Some((banner, now));
    }

    pub fn current(&self) -> Option<&Banner> {
        self.current.as_ref().map(|(b, _)| b)
    }

    /// Returns true if a banner was removed.
    pub fn dismiss(&mut self) -> bool {
        self.current.take().is_some()
    }

    /// Drop the banner once its time is up. Returns true if it expired.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.current {
            Some((banner, shown)) if now.saturating_duration_since(*shown) >= banner.ttl => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}
