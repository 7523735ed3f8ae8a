//! Explicit request validation.
//!
//! Request DTOs expose a `validate()` that either returns the cleaned value
//! or a `ValidationErrors` listing every offending field.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;

lazy_static! {
    // ASCII only: `\d` would also accept non-Latin digits.
    static ref CPF: Regex = Regex::new(r"^[0-9]{11}$").expect("static regex");
    static ref RA: Regex = Regex::new(r"^[0-9]{6}$").expect("static regex");
    static ref RF: Regex = Regex::new(r"^[0-9]{4}$").expect("static regex");
}

pub fn is_cpf(value: &str) -> bool {
    CPF.is_match(value)
}

pub fn is_ra(value: &str) -> bool {
    RA.is_match(value)
}

/// RF numbers share the 4-digit shape with staff usernames.
pub fn is_rf(value: &str) -> bool {
    RF.is_match(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(value)` when no error was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_shapes() {
        assert!(is_cpf("12345678901"));
        assert!(!is_cpf("1234567890"));
        assert!(!is_cpf("123.456.789-01"));
        assert!(is_ra("123456"));
        assert!(!is_ra("12345a"));
        assert!(is_rf("1234"));
        assert!(!is_rf("12345"));
    }

    #[test]
    fn rejects_non_ascii_digits() {
        // Arabic-Indic digits
        assert!(!is_rf("\u{0661}\u{0662}\u{0663}\u{0664}"));
    }

    #[test]
    fn finish_collects_errors() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.clone().finish(7), Ok(7));

        errors.add("cpf", "CPF must have exactly 11 digits");
        errors.add("name", "name is required");
        let err = errors.finish(()).unwrap_err();
        assert!(err.has("cpf"));
        assert!(err.has("name"));
        assert_eq!(
            err.to_string(),
            "CPF must have exactly 11 digits; name is required"
        );
    }
}
