//! Client-side field validation
//!
//! Validation failure is field-scoped and never reaches the network: the
//! offending fields get ordered error messages and the form stays Idle.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::FieldErrors;
use crate::page::{FieldKind, FormModel};

/// Minimum digit count for a plausible phone number
const MIN_PHONE_DIGITS: usize = 6;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\d\+\-\s\(\)]+$").expect("valid phone pattern"))
}

/// Standard address shape: something@something.tld, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Digits plus common punctuation, with at least six digits overall
pub fn is_valid_phone(phone: &str) -> bool {
    phone_pattern().is_match(phone)
        && phone.chars().filter(|c| c.is_ascii_digit()).count() >= MIN_PHONE_DIGITS
}

/// Validate a whole form. Empty map means the submission may proceed.
///
/// Optional email/phone fields are only checked when non-empty; a blank
/// optional field is not an error.
pub fn validate(form: &FormModel) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for field in &form.fields {
        let value = field.value.trim();
        let mut messages = Vec::new();

        if field.required && value.is_empty() {
            messages.push("This field is required.".to_string());
        }

        if !value.is_empty() {
            match field.kind {
                FieldKind::Email if !is_valid_email(value) => {
                    messages.push("Please enter a valid email address.".to_string());
                }
                FieldKind::Phone if !is_valid_phone(value) => {
                    messages.push("Please enter a valid phone number.".to_string());
                }
                _ => {}
            }
        }

        if !messages.is_empty() {
            errors.insert(field.name.clone(), messages);
        }
    }

    errors
}
