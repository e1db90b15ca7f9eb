//! Outbound mail transports.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;

use crate::config::SmtpConfig;

/// A fully addressed message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Display mailbox, e.g. `"Austen Academy Contact" <bot@example.com>`.
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MailError {
    #[error("invalid mailbox {0}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("mail transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;

    fn name(&self) -> &'static str;
}

/// SMTP relay over STARTTLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl core::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SmtpMailer").finish_non_exhaustive()
    }
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let credentials = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().to_string(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(credentials)
            .build();
        Ok(Self { transport })
    }
}

fn build_message(message: &EmailMessage) -> Result<Message, MailError> {
    let from: Mailbox = message
        .from
        .parse()
        .map_err(|_| MailError::Address(message.from.clone()))?;
    let to: Mailbox = message
        .to
        .parse()
        .map_err(|_| MailError::Address(message.to.clone()))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.clone())
        .multipart(MultiPart::alternative_plain_html(
            message.text.clone(),
            message.html.clone(),
        ))
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let email = build_message(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

/// Logs messages instead of sending them. Used when SMTP is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl MailTransport for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        tracing::info!(to = %message.to, subject = %message.subject, "mail transport not configured; message logged only");
        tracing::debug!(body = %message.text, "unsent message body");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Keeps sent messages in memory; can be switched to fail every send.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Transport("simulated transport failure".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| MailError::Transport("recorder lock poisoned".to_string()))?
            .push(message.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            from: "\"Austen Academy Contact\" <bot@example.com>".to_string(),
            to: "info@example.com".to_string(),
            subject: "Nouvelle demande de contact - english".to_string(),
            html: "<p>Bonjour</p>".to_string(),
            text: "Bonjour".to_string(),
        }
    }

    #[test]
    fn builds_a_multipart_message_from_display_mailboxes() {
        let built = build_message(&message()).unwrap();
        let raw = String::from_utf8(built.formatted()).unwrap();
        assert!(raw.contains("Subject: Nouvelle demande de contact - english"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[test]
    fn malformed_mailboxes_are_rejected() {
        let mut m = message();
        m.to = "not an address".to_string();
        assert!(matches!(build_message(&m), Err(MailError::Address(_))));
    }

    #[tokio::test]
    async fn recording_mailer_records_and_fails_on_demand() {
        let mailer = RecordingMailer::new();
        mailer.send(&message()).await.unwrap();
        assert_eq!(mailer.sent().len(), 1);

        mailer.set_failing(true);
        assert!(mailer.send(&message()).await.is_err());
        assert_eq!(mailer.sent().len(), 1);
    }
}
