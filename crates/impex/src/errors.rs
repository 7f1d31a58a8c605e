//! Import/export error types

use beans_common::errors::AppError;
use thiserror::Error;

/// Cause attached to an unparseable roasting date
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected date format to be YYYY-MM-DD")]
pub struct DateFormatError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("{field} is a required field in row {row}")]
    MissingField { field: &'static str, row: usize },

    #[error("roasting_date is invalid in row {row}")]
    InvalidDate {
        row: usize,
        #[source]
        source: DateFormatError,
    },

    #[error("rating is invalid in row {row}")]
    InvalidRating { row: usize },

    #[error("could not read row {row}: {message}")]
    Malformed { row: usize, message: String },

    #[error("could not write csv: {0}")]
    Write(String),

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl ImportError {
    /// Row the error refers to, if any
    pub fn row(&self) -> Option<usize> {
        match self {
            ImportError::MissingField { row, .. }
            | ImportError::InvalidDate { row, .. }
            | ImportError::InvalidRating { row }
            | ImportError::Malformed { row, .. } => Some(*row),
            ImportError::Write(_) | ImportError::Storage(_) => None,
        }
    }

    fn field(&self) -> Option<&'static str> {
        match self {
            ImportError::MissingField { field, .. } => Some(*field),
            ImportError::InvalidDate { .. } => Some("roasting_date"),
            ImportError::InvalidRating { .. } => Some("rating"),
            _ => None,
        }
    }
}

impl From<ImportError> for AppError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::Storage(inner) => inner,
            ImportError::Write(message) => AppError::Internal { message },
            row_error => AppError::Validation {
                field: Some(row_error.field().unwrap_or("file").to_string()),
                message: row_error.to_string(),
            },
        }
    }
}
