//! Contact form controller.
//!
//! Mirrors the server's presence, email and phone checks so obvious mistakes
//! never leave the page. The server stays authoritative.

use std::sync::LazyLock;
use std::time::Instant;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

use academy_core::ContactForm;
use academy_core::validation::{EMAIL_MAX_LEN, is_valid_phone, normalize_phone};

use crate::types::{Banner, Notifications, SEND_FAILED_MESSAGE, SUCCESS_MESSAGE, SubmitControl};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"));

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LocalValidationError {
    #[error("Veuillez remplir tous les champs obligatoires")]
    MissingFields,

    #[error("Veuillez entrer une adresse email valide")]
    InvalidEmail,

    #[error("Veuillez entrer un numéro de téléphone valide")]
    InvalidPhone,
}

/// Presence, email and phone, in that order.
pub fn validate_local(form: &ContactForm) -> Result<(), LocalValidationError> {
    let fields = [&form.name, &form.email, &form.phone, &form.course, &form.message];
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(LocalValidationError::MissingFields);
    }

    let email = form.email.as_str();
    if email.chars().count() > EMAIL_MAX_LEN || !EMAIL_RE.is_match(email) {
        return Err(LocalValidationError::InvalidEmail);
    }

    if !is_valid_phone(&normalize_phone(&form.phone)) {
        return Err(LocalValidationError::InvalidPhone);
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("server answered {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Sends a validated form to the server.
#[async_trait]
pub trait ContactTransport: Send + Sync {
    async fn submit(&self, form: &ContactForm) -> Result<(), TransportError>;
}

/// The page elements the controller drives.
pub trait FormView {
    fn set_submit(&mut self, control: SubmitControl);
    fn show_banner(&mut self, banner: &Banner);
    fn clear_banner(&mut self);
    fn reset_fields(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Stopped before the network.
    Rejected(LocalValidationError),
    Sent,
    Failed,
}

pub struct FormController<T, V> {
    transport: T,
    view: V,
    notifications: Notifications,
}

impl<T: ContactTransport, V: FormView> FormController<T, V> {
    pub fn new(transport: T, view: V) -> Self {
        Self {
            transport,
            view,
            notifications: Notifications::new(),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.notifications.current()
    }

    /// Handle a submit event. `&mut self` keeps one submission in flight.
    pub async fn submit(&mut self, form: &ContactForm) -> SubmitOutcome {
        if let Err(e) = validate_local(form) {
            tracing::debug!(error = %e, "contact form rejected locally");
            self.show(Banner::error(e.to_string()));
            return SubmitOutcome::Rejected(e);
        }

        self.view.set_submit(SubmitControl::BUSY);
        let result = self.transport.submit(form).await;
        self.view.set_submit(SubmitControl::IDLE);

        match result {
            Ok(()) => {
                self.show(Banner::success(SUCCESS_MESSAGE));
                self.view.reset_fields();
                SubmitOutcome::Sent
            }
            Err(e) => {
                tracing::warn!(error = %e, "contact form submission failed");
                self.show(Banner::error(SEND_FAILED_MESSAGE));
                SubmitOutcome::Failed
            }
        }
    }

    /// User closed the banner.
    pub fn dismiss(&mut self) {
        if self.notifications.dismiss() {
            self.view.clear_banner();
        }
    }

    /// Timer hook: hides the banner once its display time is over.
    pub fn tick(&mut self, now: Instant) {
        if self.notifications.expire(now) {
            self.view.clear_banner();
        }
    }

    fn show(&mut self, banner: Banner) {
        self.view.show_banner(&banner);
        self.notifications.show(banner, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::types::{BannerKind, ERROR_BANNER_TTL, SUCCESS_BANNER_TTL};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Submit(SubmitControl),
        Banner(BannerKind, String),
        Cleared,
        Reset,
    }

    #[derive(Default)]
    struct RecordingView {
        events: Vec<Event>,
    }

    impl FormView for RecordingView {
        fn set_submit(&mut self, control: SubmitControl) {
            self.events.push(Event::Submit(control));
        }
        fn show_banner(&mut self, banner: &Banner) {
            self.events.push(Event::Banner(banner.kind, banner.message.clone()));
        }
        fn clear_banner(&mut self) {
            self.events.push(Event::Cleared);
        }
        fn reset_fields(&mut self) {
            self.events.push(Event::Reset);
        }
    }

    struct StubTransport {
        calls: AtomicUsize,
        answer: Mutex<Option<TransportError>>,
    }

    impl StubTransport {
        fn ok() -> Self {
            Self { calls: AtomicUsize::new(0), answer: Mutex::new(None) }
        }
        fn failing(err: TransportError) -> Self {
            Self { calls: AtomicUsize::new(0), answer: Mutex::new(Some(err)) }
        }
    }

    #[async_trait]
    impl ContactTransport for StubTransport {
        async fn submit(&self, _form: &ContactForm) -> Result<(), TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn form() -> ContactForm {
        ContactForm {
            name: "Imane".to_string(),
            email: "imane@example.com".to_string(),
            phone: "06 12 34 56 78".to_string(),
            course: "german".to_string(),
            message: "Bonjour, quand commence la prochaine session ?".to_string(),
        }
    }

    #[test]
    fn local_checks_run_in_order() {
        assert_eq!(validate_local(&form()), Ok(()));

        let mut f = form();
        f.course = " ".to_string();
        f.email = "bad".to_string();
        assert_eq!(validate_local(&f), Err(LocalValidationError::MissingFields));

        let mut f = form();
        f.email = "a@b".to_string();
        f.phone = "123".to_string();
        assert_eq!(validate_local(&f), Err(LocalValidationError::InvalidEmail));

        let mut f = form();
        f.email = format!("{}@example.com", "a".repeat(250));
        assert_eq!(validate_local(&f), Err(LocalValidationError::InvalidEmail));

        let mut f = form();
        f.phone = "0123456789".to_string();
        assert_eq!(validate_local(&f), Err(LocalValidationError::InvalidPhone));

        let mut f = form();
        f.phone = "+212 7 12 34 56 78".to_string();
        assert_eq!(validate_local(&f), Ok(()));
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_the_network() {
        let mut c = FormController::new(StubTransport::ok(), RecordingView::default());
        let mut f = form();
        f.phone = "0123456789".to_string();

        let outcome = c.submit(&f).await;

        assert_eq!(outcome, SubmitOutcome::Rejected(LocalValidationError::InvalidPhone));
        assert_eq!(c.transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            c.view().events,
            vec![Event::Banner(BannerKind::Error, "Veuillez entrer un numéro de téléphone valide".to_string())]
        );
    }

    #[tokio::test]
    async fn success_disables_then_reenables_and_resets() {
        let mut c = FormController::new(StubTransport::ok(), RecordingView::default());

        assert_eq!(c.submit(&form()).await, SubmitOutcome::Sent);

        assert_eq!(
            c.view().events,
            vec![
                Event::Submit(SubmitControl::BUSY),
                Event::Submit(SubmitControl::IDLE),
                Event::Banner(BannerKind::Success, SUCCESS_MESSAGE.to_string()),
                Event::Reset,
            ]
        );
        assert_eq!(c.banner().unwrap().ttl, SUCCESS_BANNER_TTL);
    }

    #[tokio::test]
    async fn any_failure_shows_the_generic_error() {
        for err in [TransportError::Status(500), TransportError::Network("offline".to_string())] {
            let mut c = FormController::new(StubTransport::failing(err), RecordingView::default());

            assert_eq!(c.submit(&form()).await, SubmitOutcome::Failed);

            let events = &c.view().events;
            assert_eq!(events[1], Event::Submit(SubmitControl::IDLE));
            assert_eq!(events[2], Event::Banner(BannerKind::Error, SEND_FAILED_MESSAGE.to_string()));
            assert!(!events.contains(&Event::Reset));
            assert_eq!(c.banner().unwrap().ttl, ERROR_BANNER_TTL);
        }
    }

    #[tokio::test]
    async fn banner_is_cleared_by_timer_or_user() {
        let mut c = FormController::new(StubTransport::ok(), RecordingView::default());
        c.submit(&form()).await;

        c.tick(Instant::now());
        assert!(c.banner().is_some());
        c.tick(Instant::now() + SUCCESS_BANNER_TTL + Duration::from_millis(1));
        assert!(c.banner().is_none());
        assert_eq!(c.view().events.last(), Some(&Event::Cleared));

        c.submit(&form()).await;
        c.dismiss();
        assert!(c.banner().is_none());
        c.dismiss();
        let cleared = c.view().events.iter().filter(|e| **e == Event::Cleared).count();
        assert_eq!(cleared, 2);
    }
}
