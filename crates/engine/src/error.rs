//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when a required form field is missing or empty.
//! - [`InvalidLocation`] thrown when a spreadsheet URL cannot be opened.
//! - [`RecordNotFound`] thrown when the expense to edit has no row.
//! - [`Precondition`] thrown when an edit runs before any expense was logged.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidLocation`]: EngineError::InvalidLocation
//!  [`RecordNotFound`]: EngineError::RecordNotFound
//!  [`Precondition`]: EngineError::Precondition
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("incomplete form: missing {field}")]
    Validation { field: String },
    /// The payload keeps the reason for logs; users only see "Invalid URL".
    #[error("Invalid URL")]
    InvalidLocation(String),
    #[error("expense ID {0} not found in sheet")]
    RecordNotFound(u64),
    #[error("{0}")]
    Precondition(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("corrupted user property \"{0}\"")]
    CorruptState(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation { field: a }, Self::Validation { field: b }) => a == b,
            (Self::InvalidLocation(a), Self::InvalidLocation(b)) => a == b,
            (Self::RecordNotFound(a), Self::RecordNotFound(b)) => a == b,
            (Self::Precondition(a), Self::Precondition(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::CorruptState(a), Self::CorruptState(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
