use std::{fmt, iter::Sum, ops::Add, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{ErrorKind, FieldError};

/// Signed money amount represented as **integer cents**.
///
/// Use this type for **all** monetary values (expense amounts, summary
/// totals) to avoid floating-point drift. Sums of amounts are exact integer
/// sums.
///
/// The wire form is a fixed-point decimal string with exactly 2 fraction
/// digits, which is also what [`fmt::Display`] produces.
///
/// # Examples
///
/// ```rust
/// use engine::Amount;
///
/// let amount = Amount::from_cents(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from wire input (at most 2 fraction digits, at most 10 digits in
/// total):
///
/// ```rust
/// use engine::Amount;
///
/// assert_eq!("10".parse::<Amount>().unwrap().cents(), 1000);
/// assert_eq!("10.5".parse::<Amount>().unwrap().cents(), 1050);
/// assert!("12.345".parse::<Amount>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Amount(i64);

/// Maximum number of integer digits, from the stored `decimal(10, 2)` shape.
const MAX_UNIT_DIGITS: usize = 8;

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl FromStr for Amount {
    type Err = FieldError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` as decimal separator and an optional leading `-`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - max 8 integer digits (the stored column is `decimal(10, 2)`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FieldError::new(ErrorKind::InvalidFormat, "must be a decimal number");
        let too_large = || {
            FieldError::new(
                ErrorKind::InvalidFormat,
                "must have no more than 10 digits in total",
            )
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let (sign, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (-1i64, stripped),
            None => (1i64, trimmed),
        };

        let (units_str, cents_str) = match rest.split_once('.') {
            Some((units, cents)) => (units, Some(cents)),
            None => (rest, None),
        };

        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if units_str.len() > MAX_UNIT_DIGITS {
            return Err(too_large());
        }

        let units: i64 = units_str.parse().map_err(|_| invalid())?;

        let cents: i64 = match cents_str {
            None => 0,
            Some(frac) => {
                if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => {
                        return Err(FieldError::new(
                            ErrorKind::InvalidFormat,
                            "must have no more than 2 decimal places",
                        ));
                    }
                }
            }
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(too_large)?;

        Ok(Amount(sign * total))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|err: FieldError| de::Error::custom(err.message))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}
