//! Validation helpers shared by the insert payloads.

use std::sync::LazyLock;

use regex::Regex;
use validator::{ValidationErrors, ValidationErrorsKind};

/// E.164 phone number: a leading `+`, a non-zero digit, up to 15 digits total.
pub static PHONE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]\d{1,14}$").expect("valid phone regex"));

/// Flatten validation errors into a single human-readable message.
///
/// Field errors are reported in field-name order so the message is stable
/// across runs. Errors without an explicit message fall back to
/// `"<field> is invalid"`.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, None, &mut messages);
    if messages.is_empty() {
        "Invalid request".to_string()
    } else {
        messages.join("; ")
    }
}

fn collect_messages(errors: &ValidationErrors, prefix: Option<&str>, out: &mut Vec<String>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, field),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    let msg = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", path));
                    out.push(msg);
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect_messages(inner, Some(&format!("{}[{}]", path, idx)), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(regex(path = *PHONE_NUMBER_RE))]
        phone: Option<String>,
    }

    #[test]
    fn test_phone_regex() {
        assert!(PHONE_NUMBER_RE.is_match("+14155550123"));
        assert!(PHONE_NUMBER_RE.is_match("+447911123456"));
        assert!(!PHONE_NUMBER_RE.is_match("4155550123"));
        assert!(!PHONE_NUMBER_RE.is_match("+04155550123"));
        assert!(!PHONE_NUMBER_RE.is_match("+1234567890123456"));
    }

    #[test]
    fn test_validation_message_uses_custom_message() {
        let sample = Sample {
            name: String::new(),
            phone: None,
        };
        let errors = sample.validate().unwrap_err();
        assert_eq!(validation_message(&errors), "Name is required");
    }

    #[test]
    fn test_validation_message_falls_back_to_field_name() {
        let sample = Sample {
            name: "ok".to_string(),
            phone: Some("555".to_string()),
        };
        let errors = sample.validate().unwrap_err();
        assert_eq!(validation_message(&errors), "phone is invalid");
    }

    #[test]
    fn test_validation_message_is_sorted() {
        let sample = Sample {
            name: String::new(),
            phone: Some("abc".to_string()),
        };
        let errors = sample.validate().unwrap_err();
        assert_eq!(
            validation_message(&errors),
            "Name is required; phone is invalid"
        );
    }
}
