//! Field validators and the collector that accumulates their failures.
//!
//! Each validator turns one raw input field into its typed form or a
//! [`FieldError`]. [`Validator`] gathers failures across fields so that a
//! request with several bad fields is rejected with all of them at once.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    Amount, Category,
    error::{ErrorKind, FieldError, NON_FIELD, ValidationErrors},
};

const MAX_TITLE_CHARS: usize = 100;
const MAX_NAME_CHARS: usize = 100;

/// Validates a canonical version-4 UUID string.
///
/// The value must parse as a v4 UUID and round-trip to the same canonical
/// (lowercase, hyphenated) form, so `urn:`/braced/uppercase spellings are
/// rejected.
pub fn uuid4(value: &str) -> Result<Uuid, FieldError> {
    let invalid = || FieldError::new(ErrorKind::InvalidFormat, "must be a valid UUID4");

    let parsed = Uuid::parse_str(value).map_err(|_| invalid())?;
    if parsed.get_version_num() != 4 || parsed.to_string() != value {
        return Err(invalid());
    }
    Ok(parsed)
}

/// Validates an ISO `YYYY-MM-DD` calendar date.
pub fn date(value: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        FieldError::new(
            ErrorKind::InvalidFormat,
            "must be a date in YYYY-MM-DD format",
        )
    })
}

/// Validates a calendar month number, 1 through 12.
pub fn month(value: &str) -> Result<u32, FieldError> {
    let month: u32 = value
        .trim()
        .parse()
        .map_err(|_| FieldError::new(ErrorKind::InvalidFormat, "must be an integer"))?;
    if !(1..=12).contains(&month) {
        return Err(FieldError::new(
            ErrorKind::OutOfRange,
            "must be between 1 and 12",
        ));
    }
    Ok(month)
}

/// Validates an expense amount: well-formed decimal, strictly positive.
pub fn amount(value: &str) -> Result<Amount, FieldError> {
    let amount: Amount = value.parse()?;
    if !amount.is_positive() {
        return Err(FieldError::new(
            ErrorKind::InvalidValue,
            "expense amount must be positive",
        ));
    }
    Ok(amount)
}

/// Validates an expense title: non-empty, at most 100 characters.
pub fn title(value: &str) -> Result<String, FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(
            ErrorKind::InvalidValue,
            "must not be empty",
        ));
    }
    if value.chars().count() > MAX_TITLE_CHARS {
        return Err(FieldError::new(
            ErrorKind::InvalidValue,
            "must be at most 100 characters",
        ));
    }
    Ok(value.to_string())
}

/// Validates a category against the known set.
pub fn category(value: &str) -> Result<Category, FieldError> {
    Category::try_from(value)
}

/// Validates the ordering of an inclusive date range.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<(), FieldError> {
    if start > end {
        return Err(FieldError::new(
            ErrorKind::InvalidRange,
            "start date must be before end date",
        ));
    }
    Ok(())
}

/// Validates a username: non-empty, at most 100 characters.
pub fn username(value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(
            ErrorKind::InvalidValue,
            "must not be empty",
        ));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(FieldError::new(
            ErrorKind::InvalidValue,
            "must be at most 100 characters",
        ));
    }
    Ok(trimmed.to_string())
}

/// Validates an email address: `local@domain` shape, at most 100 characters.
pub fn email(value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    let invalid = || FieldError::new(ErrorKind::InvalidFormat, "must be a valid email address");

    let (local, domain) = trimmed.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(FieldError::new(
            ErrorKind::InvalidValue,
            "must be at most 100 characters",
        ));
    }
    Ok(trimmed.to_string())
}

/// Accumulates field failures while extracting typed values.
///
/// `field` records a failure and yields `None`; `finish` hands back whatever
/// was collected. Callers keep the typed `Option`s and only construct their
/// output when the error set is empty.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one field validator.
    pub fn field<T>(&mut self, field: &str, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.errors.push(field, error);
                None
            }
        }
    }

    /// Records a failure that involves more than one field.
    pub fn non_field(&mut self, result: Result<(), FieldError>) {
        if let Err(error) = result {
            self.errors.push(NON_FIELD, error);
        }
    }

    pub fn push(&mut self, field: &str, error: FieldError) {
        self.errors.push(field, error);
    }

    #[must_use]
    pub fn finish(self) -> ValidationErrors {
        self.errors
    }
}
