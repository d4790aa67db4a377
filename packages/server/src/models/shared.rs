use crate::error::{AppError, FieldError};

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Collects field failures while a submitted form is checked, so that all
/// of them are reported together.
#[derive(Debug, Default)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// `Ok(value)` when nothing was recorded, otherwise every recorded failure.
    pub fn finish<T>(self, value: T) -> Result<T, AppError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self.into_error())
        }
    }

    pub fn into_error(self) -> AppError {
        AppError::InvalidForm(self.0)
    }
}

pub const REQUIRED: &str = "This field is required.";

/// Trimmed value of a field that must be present and non-blank.
pub fn required(errors: &mut FormErrors, field: &'static str, raw: Option<&str>) -> Option<String> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

/// Trimmed value of an optional field; blank counts as absent.
pub fn optional(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

pub fn invalid_choice(value: &str) -> String {
    format!("Select a valid choice. {value} is not one of the available choices.")
}
