//! Field validation producing the `errors` map of a 422 response.

use serde_json::Value;

use crate::error::{ApiError, FieldErrors};

/// Longest accepted email address (RFC 5321)
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Default column width for text fields
pub const STRING_MAX_LENGTH: usize = 255;

/// Collects per-field messages; `finish` turns any into a validation error
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed value, or `None` after recording a "required" message.
    /// A field already rejected for its type gets no second message.
    pub fn required<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => Some(v),
            None => {
                if !self.has(field) {
                    self.add(field, format!("The {} field is required.", label(field)));
                }
                None
            }
        }
    }

    /// Text of a JSON string field; other types are rejected
    pub fn string(&mut self, field: &str, value: Option<&Value>) -> Option<String> {
        self.text(field, value, false)
    }

    /// Like `string`, but a JSON number is taken as its decimal text
    pub fn string_or_number(&mut self, field: &str, value: Option<&Value>) -> Option<String> {
        self.text(field, value, true)
    }

    fn text(&mut self, field: &str, value: Option<&Value>, numbers: bool) -> Option<String> {
        match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) if numbers => Some(n.to_string()),
            Some(_) => {
                self.add(field, format!("The {} field must be a string.", label(field)));
                None
            }
        }
    }

    /// Like `required`, but absence is fine; a present blank value is not
    pub fn present<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        match value {
            None => None,
            Some(_) => self.required(field, value),
        }
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.add(
                field,
                format!("The {} field must not be greater than {} characters.", label(field), max),
            );
        }
        self
    }

    pub fn min_len(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        if value.chars().count() < min {
            self.add(field, format!("The {} field must be at least {} characters.", label(field), min));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_valid_email(value) {
            self.add(field, format!("The {} field must be a valid email address.", label(field)));
        }
        self
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.entry(field.to_string()).or_default().push(message.into());
        self
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(self.errors))
        }
    }
}

/// Human label for messages: `company_name` reads as "company name"
pub fn label(field: &str) -> String {
    field.replace('_', " ")
}

/// Structural email check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(s: &str) -> bool {
    if s.is_empty() || s.len() > EMAIL_MAX_LENGTH || s.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}
