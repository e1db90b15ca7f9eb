//! Email body rendering for new submissions.
//!
//! Submission text fields are stored escaped, so they are interpolated as-is.
//! Request metadata is escaped here.

use chrono::{DateTime, FixedOffset, Utc};

use academy_core::Submission;
use academy_core::validation::escape_markup;

/// Morocco keeps UTC+1 outside Ramadan.
const CASABLANCA_OFFSET_SECS: i32 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub fn subject_for(submission: &Submission) -> String {
    format!("Nouvelle demande de contact - {}", submission.course)
}

/// `dd/mm/yyyy HH:MM:SS` in Casablanca local time.
pub fn casablanca_timestamp(at: DateTime<Utc>) -> String {
    const FORMAT: &str = "%d/%m/%Y %H:%M:%S";
    match FixedOffset::east_opt(CASABLANCA_OFFSET_SECS) {
        Some(offset) => at.with_timezone(&offset).format(FORMAT).to_string(),
        None => at.format(FORMAT).to_string(),
    }
}

pub fn render(submission: &Submission) -> RenderedEmail {
    let date = casablanca_timestamp(submission.submitted_at);
    let ip = escape_markup(&submission.ip_address);
    let agent = escape_markup(&submission.user_agent);

    let html = format!(
        r#"<div style="font-family: 'Montserrat', Arial, sans-serif; max-width: 600px; margin: 0 auto; background: #f9f9f9; padding: 20px;">
  <div style="background: white; padding: 30px; border-radius: 15px;">
    <div style="text-align: center; margin-bottom: 30px;">
      <h2 style="color: #004aad; margin: 0;">Nouvelle Demande de Contact</h2>
      <p style="color: #666; margin: 5px 0;">Austen Academy - Centre de Formation</p>
    </div>
    <div style="background: #f9f9f9; padding: 20px; border-radius: 10px; margin-bottom: 20px;">
      <h3 style="color: #004aad; margin-top: 0;">Informations du Contact</h3>
      <p><strong>Nom:</strong> {name}</p>
      <p><strong>Email:</strong> {email}</p>
      <p><strong>Téléphone:</strong> {phone}</p>
      <p><strong>Formation souhaitée:</strong> {course}</p>
    </div>
    <div style="background: white; padding: 20px; border-left: 4px solid #d4af37; margin-bottom: 20px;">
      <h3 style="color: #004aad; margin-top: 0;">Message</h3>
      <p style="line-height: 1.6;">{message}</p>
    </div>
    <div style="background: #f0f8ff; padding: 15px; border-radius: 8px; font-size: 12px; color: #666;">
      <p><strong>Détails techniques:</strong></p>
      <p>IP: {ip}</p>
      <p>Navigateur: {agent}</p>
      <p>Date: {date}</p>
    </div>
  </div>
</div>"#,
        name = submission.name,
        email = submission.email,
        phone = submission.phone,
        course = submission.course,
        message = submission.message,
    );

    let text = format!(
        "Nouvelle demande de contact - Austen Academy\n\n\
         Nom: {name}\n\
         Email: {email}\n\
         Téléphone: {phone}\n\
         Formation: {course}\n\n\
         Message:\n{message}\n\n\
         IP: {ip}\n\
         Navigateur: {agent}\n\
         Date: {date}\n",
        name = submission.name,
        email = submission.email,
        phone = submission.phone,
        course = submission.course,
        message = submission.message,
        ip = submission.ip_address,
        agent = submission.user_agent,
    );

    RenderedEmail {
        subject: subject_for(submission),
        html,
        text,
    }
}
