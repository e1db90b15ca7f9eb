//! New-submission notifications.

use std::sync::Arc;

use academy_core::Submission;

pub mod render;
pub mod transport;

pub use render::{RenderedEmail, render};
pub use transport::{EmailMessage, LogMailer, MailError, MailTransport, RecordingMailer, SmtpMailer};

const SENDER_NAME: &str = "Austen Academy Contact";

/// Renders a submission and hands it to the configured transport.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    sender: String,
    recipient: String,
}

impl core::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Notifier")
            .field("transport", &self.transport.name())
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl Notifier {
    /// `sender_address` is the SMTP account; `recipient` the academy inbox.
    pub fn new(
        transport: Arc<dyn MailTransport>,
        sender_address: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            sender: format!("\"{SENDER_NAME}\" <{}>", sender_address.into()),
            recipient: recipient.into(),
        }
    }

    pub fn compose(&self, submission: &Submission) -> EmailMessage {
        let RenderedEmail { subject, html, text } = render(submission);
        EmailMessage {
            from: self.sender.clone(),
            to: self.recipient.clone(),
            subject,
            html,
            text,
        }
    }

    pub async fn notify(&self, submission: &Submission) -> Result<(), MailError> {
        let message = self.compose(submission);
        self.transport.send(&message).await
    }
}
