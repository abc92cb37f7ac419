//! # Field Validation
//!
//! Entities are built from loosely-typed input (tool arguments arrive as JSON). Every
//! constructor collects *all* violations before failing, so a caller fixing a request
//! sees the full list at once instead of one error per round trip.
//!
//! A violation is a [`FieldError`] (`field: message`); a failed construction returns
//! [`ValidationErrors`], whose `Display` joins the entries with `"; "`:
//!
//! ```text
//! name: String should have at least 1 character; email: value is not a valid email address
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;

pub const MSG_EMPTY: &str = "String should have at least 1 character";
pub const MSG_NOT_STRING: &str = "Input should be a valid string";
pub const MSG_NOT_NUMBER: &str = "Input should be a valid number";
pub const MSG_NOT_POSITIVE: &str = "Input should be greater than 0";
pub const MSG_NEGATIVE: &str = "Input should be greater than or equal to 0";
pub const MSG_BAD_EMAIL: &str = "value is not a valid email address";
pub const MSG_OUT_OF_RANGE: &str = "quantity times unit_price is too large";

// local@domain.tld, with dot-atom local part and hostname labels.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
    )
    .expect("valid email regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found while constructing one value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(value)` when nothing was recorded, otherwise every recorded violation.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

/// Reads a required, non-empty string field.
pub fn required_text(errors: &mut ValidationErrors, field: &str, value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() => {
            errors.add(field, MSG_EMPTY);
            String::new()
        }
        Value::String(s) => s.clone(),
        _ => {
            errors.add(field, MSG_NOT_STRING);
            String::new()
        }
    }
}

/// Reads a numeric field. Numeric strings are accepted the way lax form input is.
pub fn number(errors: &mut ValidationErrors, field: &str, value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite());

    if parsed.is_none() {
        errors.add(field, MSG_NOT_NUMBER);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_common_addresses() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("jane.doe+billing@mail.example.co.uk"));
        assert!(is_valid_email("o'brien@example.ie"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "",
            "plainaddress",
            "@example.com",
            "jane@",
            "jane@example",
            "jane..doe@example.com",
            ".jane@example.com",
            "jane@-example.com",
            "jane doe@example.com",
        ] {
            assert!(!is_valid_email(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn joins_every_violation() {
        let mut errors = ValidationErrors::new();
        errors.add("name", MSG_EMPTY);
        errors.add("email", MSG_BAD_EMAIL);

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "name: String should have at least 1 character; email: value is not a valid email address"
        );
    }

    #[test]
    fn finish_passes_value_through_when_clean() {
        assert_eq!(ValidationErrors::new().finish(7), Ok(7));
    }

    #[test]
    fn number_accepts_numeric_strings() {
        let mut errors = ValidationErrors::new();
        assert_eq!(number(&mut errors, "quantity", &json!("2.5")), Some(2.5));
        assert_eq!(number(&mut errors, "quantity", &json!(3)), Some(3.0));
        assert!(errors.is_empty());

        assert_eq!(number(&mut errors, "quantity", &json!("lots")), None);
        assert_eq!(number(&mut errors, "unit_price", &json!(null)), None);
        assert!(errors.has_field("quantity"));
        assert!(errors.has_field("unit_price"));
    }

    #[test]
    fn required_text_flags_empty_and_non_strings() {
        let mut errors = ValidationErrors::new();
        required_text(&mut errors, "description", &json!(""));
        required_text(&mut errors, "name", &json!(12));
        assert_eq!(errors.errors()[0].message, MSG_EMPTY);
        assert_eq!(errors.errors()[1].message, MSG_NOT_STRING);
    }
}
