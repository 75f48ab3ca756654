use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, FieldError};

/// Expense category.
///
/// Stored in the database as the canonical lowercase string. New categories
/// are added as variants here (plus the `as_str`/`try_from` arms).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Travel,
    Utilities,
}

impl Category {
    /// Returns the canonical category string used by the database and the
    /// wire format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Travel => "travel",
            Self::Utilities => "utilities",
        }
    }
}

impl TryFrom<&str> for Category {
    type Error = FieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "food" => Ok(Self::Food),
            "travel" => Ok(Self::Travel),
            "utilities" => Ok(Self::Utilities),
            other => Err(FieldError::new(
                ErrorKind::InvalidValue,
                format!("unknown category: {other}"),
            )),
        }
    }
}
