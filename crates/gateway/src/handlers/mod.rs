//! Route handlers
//!
//! `accounts`, `coffees`, `roasters` and `impex` render HTML behind the
//! session cookie. `api` serves JSON behind a Bearer token.

pub mod accounts;
pub mod api;
pub mod coffees;
pub mod health;
pub mod impex;
pub mod roasters;

use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

/// Longest accepted name for coffees, processing methods and roasters
pub(crate) const MAX_NAME_LENGTH: usize = 200;

/// Flatten validator output into `(field, message)` pairs for the form pages
pub(crate) fn form_errors(errors: &ValidationErrors) -> Vec<(String, String)> {
    let mut flat: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Enter a valid {}", field.replace('_', " ")));
                (field.to_string(), message)
            })
        })
        .collect();

    flat.sort();
    flat
}

/// Treat blank form inputs as absent
pub(crate) fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Required name field: non-blank after trimming, at most
/// [`MAX_NAME_LENGTH`] characters
pub(crate) fn validate_name(value: &str) -> Result<(), ValidationError> {
    match non_blank(value) {
        Some(name) if name.chars().count() <= MAX_NAME_LENGTH => Ok(()),
        _ => Err(ValidationError::new("name").with_message(Cow::Borrowed(
            "This field is required (at most 200 characters)",
        ))),
    }
}
