use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::place::{violations_error, Violation};
use crate::error::Error;

const NAME_LEN: (usize, usize) = (2, 100);
const MESSAGE_LEN: (usize, usize) = (10, 2000);

/// Contact form payload as sent by the frontend. Fields are loosely typed so
/// that missing or mistyped ones are reported per field rather than as a body
/// rejection. `dates` is free-form and may hold any JSON value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub dates: Option<Value>,
}

/// A validated contact message, safe to place into mail headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
    pub dates: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContactOutcome {
    Sent,
    /// Accepted but not forwarded; carries the reason.
    Skipped(String),
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();

    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
            .expect("email regex")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && email_regex().is_match(email)
}

/// Removes CR/LF so a value cannot inject extra mail headers.
pub fn strip_line_breaks(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

fn check_length(
    violations: &mut Vec<Violation>,
    field: &str,
    value: &str,
    (min, max): (usize, usize),
) {
    let len = value.chars().count();

    if len < min || len > max {
        violations.push(Violation {
            field: field.into(),
            message: format!("must be between {} and {} characters", min, max),
        });
    }
}

/// The trimmed text of a required string field, or `None` after recording
/// why it is unusable.
fn required_text<'a>(
    violations: &mut Vec<Violation>,
    field: &str,
    value: &'a Option<Value>,
) -> Option<&'a str> {
    let message = match value {
        Some(Value::String(text)) if !text.trim().is_empty() => return Some(text.trim()),
        Some(Value::String(_)) | Some(Value::Null) | None => "is required",
        Some(_) => "must be a string",
    };

    violations.push(Violation {
        field: field.into(),
        message: message.into(),
    });

    None
}

fn into_text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(text)) => text.trim().to_string(),
        _ => String::new(),
    }
}

/// Strings are kept as typed; any other value is rendered as compact JSON.
fn render_dates(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
        other => Some(other.to_string()),
    }
}

impl ContactRequest {
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        if let Some(name) = required_text(&mut violations, "name", &self.name) {
            check_length(&mut violations, "name", name, NAME_LEN);
        }

        if let Some(email) = required_text(&mut violations, "email", &self.email) {
            if !is_valid_email(email) {
                violations.push(Violation {
                    field: "email".into(),
                    message: "must be a valid email address".into(),
                });
            }
        }

        if let Some(message) = required_text(&mut violations, "message", &self.message) {
            check_length(&mut violations, "message", message, MESSAGE_LEN);
        }

        violations
    }

    pub fn into_message(self) -> Result<ContactMessage, Error> {
        let violations = self.validate();
        if !violations.is_empty() {
            return Err(violations_error(violations));
        }

        Ok(ContactMessage {
            name: strip_line_breaks(&into_text(self.name)),
            email: strip_line_breaks(&into_text(self.email)),
            message: into_text(self.message),
            dates: render_dates(self.dates),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, message: &str) -> ContactRequest {
        ContactRequest {
            name: Some(name.into()),
            email: Some(email.into()),
            message: Some(message.into()),
            dates: None,
        }
    }

    fn fields(request: &ContactRequest) -> Vec<String> {
        request.validate().into_iter().map(|v| v.field).collect()
    }

    #[test]
    fn boundary_lengths() {
        assert!(fields(&request("Al", "a@b.com", "1234567890")).is_empty());
        assert_eq!(fields(&request("Al", "a@b.com", "123456789")), vec!["message"]);
        assert_eq!(fields(&request("A", "a@b.com", "1234567890")), vec!["name"]);
        assert_eq!(
            fields(&request(&"n".repeat(101), "a@b.com", &"m".repeat(2001))),
            vec!["name", "message"]
        );
        assert!(fields(&request(&"n".repeat(100), "a@b.com", &"m".repeat(2000))).is_empty());
    }

    #[test]
    fn every_missing_field_is_reported() {
        assert_eq!(
            fields(&ContactRequest::default()),
            vec!["name", "email", "message"]
        );
    }

    #[test]
    fn email_grammar() {
        for valid in ["a@b.com", "ana.garcia+casa@correo.example.es", "x_y@sub-domain.org"] {
            assert!(is_valid_email(valid), "{}", valid);
        }

        for invalid in [
            "invalid-email",
            "a@b",
            "a@@b.com",
            "a b@c.com",
            "@b.com",
            "a@-b.com",
            "a@b.com\r\nBcc: x@y.com",
        ] {
            assert!(!is_valid_email(invalid), "{}", invalid);
        }
    }

    #[test]
    fn header_fields_lose_line_breaks() {
        let mut req = request(
            "Ana\r\nBcc: spam@example.com",
            "ana@example.com",
            "Hola, ¿está libre en agosto?",
        );
        req.dates = Some(" 1-15 agosto ".into());

        let message = req.into_message().unwrap();
        assert_eq!(message.name, "AnaBcc: spam@example.com");
        assert_eq!(message.dates.as_deref(), Some("1-15 agosto"));
    }

    #[test]
    fn invalid_request_yields_validation_error() {
        let err = request("Al", "nope", "short").into_message().unwrap_err();

        assert_eq!(err.details.len(), 2);
        assert!(err.details[0].starts_with("email"));
        assert!(err.details[1].starts_with("message"));
    }

    #[test]
    fn dates_accept_any_json_value() {
        let mut req = request("Ana", "ana@example.com", "Somos cuatro adultos.");
        req.dates = Some(serde_json::json!({ "from": "2025-07-03", "to": "2025-07-10" }));

        let message = req.into_message().unwrap();
        assert_eq!(
            message.dates.as_deref(),
            Some(r#"{"from":"2025-07-03","to":"2025-07-10"}"#)
        );

        let mut req = request("Ana", "ana@example.com", "Somos cuatro adultos.");
        req.dates = Some(Value::Null);
        assert_eq!(req.into_message().unwrap().dates, None);
    }

    #[test]
    fn mistyped_fields_are_reported_per_field() {
        let req: ContactRequest = serde_json::from_value(serde_json::json!({
            "name": 42,
            "email": "ana@example.com",
            "message": ["not", "text"],
        }))
        .unwrap();

        let violations = req.validate();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].to_string(), "name: must be a string");
        assert_eq!(violations[1].field, "message");
    }
}
