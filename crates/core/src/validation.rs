//! Contact-form validation and sanitization.
//!
//! This is the authoritative check; the browser-side mirror in
//! `academy-client` only covers presence, email and phone to save a round
//! trip. Checks run in a fixed order and the first failure wins:
//!
//! 1. presence of all five fields
//! 2. suspicious-content scan over name and message
//! 3. name length, email grammar, phone grammar, message length, course
//!
//! Lengths are counted in characters of the trimmed input, before escaping.

use core::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::{ContactForm, Course, ValidContact};

pub const NAME_LEN: RangeInclusive<usize> = 2..=100;
pub const MESSAGE_LEN: RangeInclusive<usize> = 10..=2000;
pub const EMAIL_MAX_LEN: usize = 254;
pub const EMAIL_LOCAL_MAX_LEN: usize = 64;

/// Truncation ceiling for short free-text fields.
pub const FIELD_CEILING: usize = 1000;
/// Truncation ceiling for the message body (equal to its maximum length).
pub const MESSAGE_CEILING: usize = 2000;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,63}$",
    )
    .expect("email pattern is a valid regex")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+212|0)[567][0-9]{8}$").expect("phone pattern is a valid regex")
});

static SUSPICIOUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<script|javascript:|on\w+\s*=|eval\(|document\.|window\.")
        .expect("suspicious-content pattern is a valid regex")
});

/// Why a contact submission was rejected.
///
/// `Display` yields the French message shown to the visitor; [`kind`](Self::kind)
/// yields the stable machine-readable code.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Tous les champs sont obligatoires")]
    MissingFields,

    #[error("Le nom doit contenir entre 2 et 100 caractères")]
    NameLength,

    #[error("Adresse email invalide")]
    InvalidEmail,

    #[error("Numéro de téléphone marocain invalide")]
    InvalidPhone,

    #[error("Le message doit contenir entre 10 et 2000 caractères")]
    MessageLength,

    #[error("Formation invalide")]
    InvalidCourse,

    #[error("Contenu suspect détecté")]
    SuspiciousContent,
}

impl ValidationError {
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::MissingFields => "missing_fields",
            ValidationError::NameLength | ValidationError::MessageLength => "length_violation",
            ValidationError::InvalidEmail => "invalid_email",
            ValidationError::InvalidPhone => "invalid_phone",
            ValidationError::InvalidCourse => "invalid_course",
            ValidationError::SuspiciousContent => "suspicious_content",
        }
    }
}

/// Validate and normalize a raw contact form.
pub fn validate_contact(form: &ContactForm) -> Result<ValidContact, ValidationError> {
    let name = form.name.trim();
    let email = normalize_email(&form.email);
    let phone = normalize_phone(&form.phone);
    let course = form.course.trim();
    let message = form.message.trim();

    if [name, email.as_str(), phone.as_str(), course, message]
        .iter()
        .any(|field| field.is_empty())
    {
        return Err(ValidationError::MissingFields);
    }

    if contains_suspicious_content(&format!("{name} {message}")) {
        return Err(ValidationError::SuspiciousContent);
    }

    if !NAME_LEN.contains(&name.chars().count()) {
        return Err(ValidationError::NameLength);
    }

    if !is_valid_email(&email) {
        return Err(ValidationError::InvalidEmail);
    }

    if !is_valid_phone(&phone) {
        return Err(ValidationError::InvalidPhone);
    }

    if !MESSAGE_LEN.contains(&message.chars().count()) {
        return Err(ValidationError::MessageLength);
    }

    let course: Course = truncate_chars(course, FIELD_CEILING)
        .parse()
        .map_err(|_| ValidationError::InvalidCourse)?;

    Ok(ValidContact {
        name: sanitize_input(name, FIELD_CEILING),
        email,
        phone,
        course,
        message: sanitize_input(message, MESSAGE_CEILING),
    })
}

/// Trim, cap at `ceiling` characters, then escape markup.
pub fn sanitize_input(input: &str, ceiling: usize) -> String {
    escape_markup(truncate_chars(input.trim(), ceiling))
}

/// Replace characters that are significant in HTML with entities.
pub fn escape_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            other => out.push(other),
        }
    }
    out
}

fn truncate_chars(input: &str, max: usize) -> &str {
    match input.char_indices().nth(max) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Standard address grammar: dotted local part, dotted domain, alphabetic TLD.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > EMAIL_MAX_LEN || !EMAIL_RE.is_match(email) {
        return false;
    }

    let Some((local, _domain)) = email.split_once('@') else {
        return false;
    };

    local.len() <= EMAIL_LOCAL_MAX_LEN
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
}

/// Strip every whitespace character from a phone number.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Moroccan mobile number: `+212` or `0`, then 5/6/7, then eight digits.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Denylist scan for script injection attempts. Not a parser.
pub fn contains_suspicious_content(text: &str) -> bool {
    SUSPICIOUS_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ContactForm {
        ContactForm {
            name: "Youssef El Amrani".to_string(),
            email: "User@Example.com".to_string(),
            phone: "06 12 34 56 78".to_string(),
            course: "english".to_string(),
            message: "Je souhaite m'inscrire au cours d'anglais.".to_string(),
        }
    }

    #[test]
    fn accepts_and_normalizes_a_valid_form() {
        let contact = validate_contact(&valid_form()).unwrap();
        assert_eq!(contact.email, "user@example.com");
        assert_eq!(contact.phone, "0612345678");
        assert_eq!(contact.course, Course::English);
        assert_eq!(contact.message, "Je souhaite m&#x27;inscrire au cours d&#x27;anglais.");
    }

    #[test]
    fn any_missing_field_is_reported_as_missing() {
        let blankers: [fn(&mut ContactForm); 5] = [
            |f| f.name.clear(),
            |f| f.email.clear(),
            |f| f.phone.clear(),
            |f| f.course.clear(),
            |f| f.message = "   ".to_string(),
        ];
        for blank in blankers {
            let mut form = valid_form();
            blank(&mut form);
            assert_eq!(validate_contact(&form), Err(ValidationError::MissingFields));
        }
    }

    #[test]
    fn email_requires_a_top_level_domain() {
        assert!(!is_valid_email("a@b"));
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user..name@example.com"));
        assert!(!is_valid_email(".user@example.com"));
        assert!(!is_valid_email("user@-example.com"));

        let mut form = valid_form();
        form.email = "a@b".to_string();
        assert_eq!(validate_contact(&form), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn email_longer_than_254_is_rejected() {
        let long = format!("{}@{}.com", "a".repeat(60), "b".repeat(200));
        assert!(long.len() > EMAIL_MAX_LEN);
        assert!(!is_valid_email(&long));
    }

    #[test]
    fn phone_grammar() {
        assert!(is_valid_phone("0612345678"));
        assert!(is_valid_phone("+212612345678"));
        assert!(is_valid_phone("0712345678"));
        assert!(!is_valid_phone("0123456789"));
        assert!(!is_valid_phone("061234567"));
        assert!(!is_valid_phone("+33612345678"));
        assert_eq!(normalize_phone(" +212 6 12\t34 56 78 "), "+212612345678");

        let mut form = valid_form();
        form.phone = "0123456789".to_string();
        assert_eq!(validate_contact(&form), Err(ValidationError::InvalidPhone));
    }

    #[test]
    fn message_length_bounds() {
        let cases = [(9, false), (10, true), (2000, true), (2001, false)];
        for (len, ok) in cases {
            let mut form = valid_form();
            form.message = "a".repeat(len);
            let result = validate_contact(&form);
            if ok {
                assert_eq!(result.unwrap().message.chars().count(), len);
            } else {
                assert_eq!(result, Err(ValidationError::MessageLength));
                assert_eq!(ValidationError::MessageLength.kind(), "length_violation");
            }
        }
    }

    #[test]
    fn name_length_bounds() {
        let mut form = valid_form();
        form.name = "A".to_string();
        assert_eq!(validate_contact(&form), Err(ValidationError::NameLength));

        form.name = "Al".to_string();
        assert!(validate_contact(&form).is_ok());

        form.name = "x".repeat(101);
        assert_eq!(validate_contact(&form), Err(ValidationError::NameLength));
    }

    #[test]
    fn unknown_course_is_rejected() {
        let mut form = valid_form();
        form.course = "astrophysics".to_string();
        assert_eq!(validate_contact(&form), Err(ValidationError::InvalidCourse));
    }

    #[test]
    fn script_payload_is_suspicious_even_when_other_fields_are_bad() {
        let mut form = valid_form();
        form.message = "<script>alert(1)</script>".to_string();
        assert_eq!(validate_contact(&form), Err(ValidationError::SuspiciousContent));

        form.email = "a@b".to_string();
        form.phone = "0123456789".to_string();
        assert_eq!(validate_contact(&form), Err(ValidationError::SuspiciousContent));
    }

    #[test]
    fn denylist_patterns() {
        assert!(contains_suspicious_content("click JavaScript:void(0)"));
        assert!(contains_suspicious_content("<img onerror = x>"));
        assert!(contains_suspicious_content("eval(atob('x'))"));
        assert!(contains_suspicious_content("document.cookie"));
        assert!(contains_suspicious_content("WINDOW.location"));
        assert!(!contains_suspicious_content("Bonjour, cours du soir possible ?"));
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape_markup(r#"<a href="x">'&'</a>\`"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;&#x2F;a&gt;&#x5C;&#96;"
        );
    }

    #[test]
    fn sanitize_trims_and_truncates_before_escaping() {
        let long = format!("  {}  ", "é".repeat(FIELD_CEILING + 5));
        let out = sanitize_input(&long, FIELD_CEILING);
        assert_eq!(out.chars().count(), FIELD_CEILING);
        assert_eq!(sanitize_input("  <b>  ", 2), "&lt;b");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Sanitized text never contains raw markup characters.
            #[test]
            fn sanitized_output_has_no_markup(input in ".{0,200}") {
                let out = sanitize_input(&input, FIELD_CEILING);
                prop_assert!(!out.contains('<'));
                prop_assert!(!out.contains('>'));
                prop_assert!(!out.contains('"'));
            }

            /// Any Moroccan mobile number is accepted whatever its spacing.
            #[test]
            fn spaced_mobile_numbers_validate(
                prefix in prop_oneof![Just("0"), Just("+212")],
                lead in "[567]",
                rest in "[0-9]{8}",
                gap in " {0,2}",
            ) {
                let raw = format!("{prefix}{gap}{lead}{gap}{rest}");
                prop_assert!(is_valid_phone(&normalize_phone(&raw)));
            }

            /// Validation either rejects or produces a record within bounds.
            #[test]
            fn accepted_records_respect_invariants(
                name in "[A-Za-z ]{0,120}",
                message in "[a-z ]{0,2100}",
            ) {
                let form = ContactForm {
                    name,
                    email: "user@example.com".to_string(),
                    phone: "0612345678".to_string(),
                    course: "french".to_string(),
                    message,
                };
                if let Ok(c) = validate_contact(&form) {
                    prop_assert!(NAME_LEN.contains(&c.name.chars().count()));
                    prop_assert!(MESSAGE_LEN.contains(&c.message.chars().count()));
                }
            }
        }
    }
}
