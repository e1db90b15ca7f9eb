//! Process configuration, read once at startup.
//!
//! `AppConfig::from_env` reads the process environment; `from_lookup` takes
//! any key lookup so tests can build configurations without touching env.

use secrecy::SecretString;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_CONTACT_EMAIL: &str = "info@austenacademymaroc.com";

const DEV_SESSION_SECRET: &str = "dev-session-secret";
const DEV_ADMIN_TOKEN: &str = "dev-admin-token";

/// Deployment mode. Production tightens secrets and hides error detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl RuntimeMode {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("production") | Some("prod") => RuntimeMode::Production,
            _ => RuntimeMode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, RuntimeMode::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeMode::Development => "development",
            RuntimeMode::Production => "production",
        }
    }
}

/// Outbound mail relay settings. Present only when `SMTP_HOST` is set.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    MissingSecret(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub mode: RuntimeMode,
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub session_secret: SecretString,
    pub admin_token: SecretString,
    pub smtp: Option<SmtpConfig>,
    pub contact_email: String,
    /// Honor `X-Forwarded-For` when deriving the client address.
    pub trust_proxy: bool,
    pub static_dir: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mode = RuntimeMode::parse(get("APP_ENV").as_deref());
        let port = parse_port("PORT", get("PORT"), DEFAULT_PORT)?;

        let session_secret = secret_or_dev_default(mode, "SESSION_SECRET", get("SESSION_SECRET"), DEV_SESSION_SECRET)?;
        let admin_token = secret_or_dev_default(mode, "ADMIN_TOKEN", get("ADMIN_TOKEN"), DEV_ADMIN_TOKEN)?;

        let smtp = match get("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_port("SMTP_PORT", get("SMTP_PORT"), DEFAULT_SMTP_PORT)?,
                user: get("SMTP_USER").unwrap_or_default(),
                password: SecretString::new(get("SMTP_PASS").unwrap_or_default()),
            }),
            None => None,
        };

        let trust_proxy = match get("TRUST_PROXY") {
            None => false,
            Some(v) => parse_flag(&v).ok_or(ConfigError::Invalid { key: "TRUST_PROXY", value: v })?,
        };

        Ok(Self {
            port,
            mode,
            database_url: get("DATABASE_URL"),
            frontend_url: get("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            session_secret,
            admin_token,
            smtp,
            contact_email: get("CONTACT_EMAIL").unwrap_or_else(|| DEFAULT_CONTACT_EMAIL.to_string()),
            trust_proxy,
            static_dir: get("STATIC_DIR"),
        })
    }

    /// Development defaults with the given admin token; no database, no SMTP.
    pub fn for_tests(admin_token: &str) -> Self {
        Self {
            port: 0,
            mode: RuntimeMode::Development,
            database_url: None,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            session_secret: SecretString::new(DEV_SESSION_SECRET.to_string()),
            admin_token: SecretString::new(admin_token.to_string()),
            smtp: None,
            contact_email: DEFAULT_CONTACT_EMAIL.to_string(),
            trust_proxy: true,
            static_dir: None,
        }
    }
}

fn secret_or_dev_default(
    mode: RuntimeMode,
    key: &'static str,
    value: Option<String>,
    dev_default: &str,
) -> Result<SecretString, ConfigError> {
    match value {
        Some(v) => Ok(SecretString::new(v)),
        None if mode.is_production() => Err(ConfigError::MissingSecret(key)),
        None => {
            tracing::warn!("{key} not set; using insecure dev default");
            Ok(SecretString::new(dev_default.to_string()))
        }
    }
}

fn parse_port(key: &'static str, raw: Option<String>, default: u16) -> Result<u16, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn empty_environment_yields_development_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.mode, RuntimeMode::Development);
        assert_eq!(cfg.contact_email, DEFAULT_CONTACT_EMAIL);
        assert_eq!(cfg.frontend_url, DEFAULT_FRONTEND_URL);
        assert!(cfg.smtp.is_none());
        assert!(cfg.database_url.is_none());
        assert!(!cfg.trust_proxy);
        assert_eq!(cfg.admin_token.expose_secret(), DEV_ADMIN_TOKEN);
    }

    #[test]
    fn production_requires_secrets() {
        let err = config(&[("APP_ENV", "production"), ("ADMIN_TOKEN", "t")]).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret("SESSION_SECRET"));

        let err = config(&[("APP_ENV", "production"), ("SESSION_SECRET", "s")]).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret("ADMIN_TOKEN"));

        let cfg = config(&[("APP_ENV", "production"), ("SESSION_SECRET", "s"), ("ADMIN_TOKEN", "t")]).unwrap();
        assert!(cfg.mode.is_production());
    }

    #[test]
    fn smtp_is_configured_by_host() {
        let cfg = config(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "bot@example.com"),
            ("SMTP_PASS", "pw"),
        ])
        .unwrap();
        let smtp = cfg.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, DEFAULT_SMTP_PORT);
        assert_eq!(smtp.user, "bot@example.com");
        assert_eq!(smtp.password.expose_secret(), "pw");
    }

    #[test]
    fn bad_numbers_and_flags_are_rejected() {
        assert!(matches!(config(&[("PORT", "eighty")]), Err(ConfigError::Invalid { key: "PORT", .. })));
        assert!(matches!(
            config(&[("TRUST_PROXY", "maybe")]),
            Err(ConfigError::Invalid { key: "TRUST_PROXY", .. })
        ));
        assert!(config(&[("TRUST_PROXY", "true"), ("PORT", "8080")]).unwrap().trust_proxy);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config(&[("STATIC_DIR", "   "), ("CONTACT_EMAIL", "")]).unwrap();
        assert!(cfg.static_dir.is_none());
        assert_eq!(cfg.contact_email, DEFAULT_CONTACT_EMAIL);
    }
}
