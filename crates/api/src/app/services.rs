//! Wiring of stores, mailer, credentials and limiters into one shared value.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;

use academy_auth::{AdminAuthenticator, CsrfGuard, StaticBearerToken};
use academy_infra::{
    AppConfig, InMemorySubmissionStore, LogMailer, MailTransport, Notifier, PostgresSubmissionStore, RatePolicy,
    RuntimeMode, SlidingWindowLimiter, SmtpMailer, SubmissionStore,
};

use crate::service::{ModerationService, SubmissionService};

const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Request budgets per client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub contact: RatePolicy,
    pub general: RatePolicy,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            contact: RatePolicy::new(5, FIFTEEN_MINUTES),
            general: RatePolicy::new(100, FIFTEEN_MINUTES),
        }
    }
}

pub struct AppServices {
    pub mode: RuntimeMode,
    pub trust_proxy: bool,
    pub frontend_url: String,
    pub static_dir: Option<String>,
    pub submissions: SubmissionService,
    pub moderation: ModerationService,
    pub admin: Arc<dyn AdminAuthenticator>,
    pub csrf: CsrfGuard,
    pub contact_limiter: Arc<SlidingWindowLimiter>,
    pub general_limiter: Arc<SlidingWindowLimiter>,
    pub started_at: Instant,
    store_backend: &'static str,
    mail_transport: &'static str,
}

impl AppServices {
    /// Build from configuration: Postgres when `DATABASE_URL` is set, SMTP when
    /// `SMTP_HOST` is set, in-process fallbacks otherwise.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn SubmissionStore> = match &config.database_url {
            Some(url) => Arc::new(
                PostgresSubmissionStore::connect(url)
                    .await
                    .context("failed to connect submission store")?,
            ),
            None => {
                tracing::warn!("DATABASE_URL not set; submissions are kept in memory only");
                Arc::new(InMemorySubmissionStore::new())
            }
        };

        let transport: Arc<dyn MailTransport> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp).context("failed to configure SMTP transport")?),
            None => {
                tracing::warn!("SMTP_HOST not set; notifications are logged, not sent");
                Arc::new(LogMailer)
            }
        };

        let services = Self::with_parts(config, store, transport, RateLimits::default());
        services.spawn_sweepers(SWEEP_INTERVAL);
        Ok(services)
    }

    pub fn with_parts(
        config: &AppConfig,
        store: Arc<dyn SubmissionStore>,
        transport: Arc<dyn MailTransport>,
        limits: RateLimits,
    ) -> Self {
        let sender = config
            .smtp
            .as_ref()
            .map(|s| s.user.clone())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| config.contact_email.clone());

        let store_backend = store.backend();
        let mail_transport = transport.name();
        let notifier = Notifier::new(transport, sender, config.contact_email.clone());

        Self {
            mode: config.mode,
            trust_proxy: config.trust_proxy,
            frontend_url: config.frontend_url.clone(),
            static_dir: config.static_dir.clone(),
            submissions: SubmissionService::new(store.clone(), notifier),
            moderation: ModerationService::new(store),
            admin: Arc::new(StaticBearerToken::new(config.admin_token.clone())),
            csrf: CsrfGuard::new(config.session_secret.clone()),
            contact_limiter: Arc::new(SlidingWindowLimiter::new(limits.contact)),
            general_limiter: Arc::new(SlidingWindowLimiter::new(limits.general)),
            started_at: Instant::now(),
            store_backend,
            mail_transport,
        }
    }

    pub fn spawn_sweepers(&self, every: Duration) {
        self.contact_limiter.spawn_sweeper(every);
        self.general_limiter.spawn_sweeper(every);
    }

    pub fn store_backend(&self) -> &'static str {
        self.store_backend
    }

    pub fn mail_transport(&self) -> &'static str {
        self.mail_transport
    }
}
