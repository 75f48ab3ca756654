//! The module contains the errors the engine can throw.
//!
//! Validation failures are collected per field into [`ValidationErrors`]
//! before they are returned, so a caller sees every problem in one round
//! trip instead of fixing fields one at a time.

use std::collections::BTreeMap;

use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key under which failures that involve more than one field are reported
/// (for example a date range whose start is after its end).
pub const NON_FIELD: &str = "non_field_errors";

/// Machine-readable code for a single validation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed UUID, date, or decimal string.
    InvalidFormat,
    /// A referenced record does not exist.
    NotFound,
    /// Start of a range after its end.
    InvalidRange,
    /// Integer outside its allowed bounds.
    OutOfRange,
    /// Well-formed but unacceptable value (non-positive amount, unknown
    /// category, over-long title).
    InvalidValue,
}

/// A single validation failure, not yet attached to a field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub code: ErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Validation failures keyed by field name, in stable field order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<FieldError>>);

impl ValidationErrors {
    pub fn push(&mut self, field: &str, error: FieldError) {
        self.0.entry(field.to_string()).or_default().push(error);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if any failure was recorded for `field`.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[FieldError]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldError])> {
        self.0
            .iter()
            .map(|(field, errors)| (field.as_str(), errors.as_slice()))
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation failed")]
    Validation(ValidationErrors),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Maps a write-path database error, surfacing unique-constraint
    /// failures (duplicate username/email) as [`IntegrityViolation`].
    ///
    /// [`IntegrityViolation`]: EngineError::IntegrityViolation
    pub(crate) fn from_write(err: DbErr) -> Self {
        let message = err.to_string();
        if message.contains("UNIQUE constraint failed") {
            Self::IntegrityViolation(message)
        } else {
            Self::Database(err)
        }
    }
}

impl From<ValidationErrors> for EngineError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::IntegrityViolation(a), Self::IntegrityViolation(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
