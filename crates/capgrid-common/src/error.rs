//! Error types shared by the key codec and the grid description.
//!
//! - **`KeyError`**   : a cell key that does not decode (engine bug, never user input)
//! - **`PeriodError`**: a `YYYYMM` id that does not name a calendar month
//! - **`ModelError`** : a matrix description that violates key uniqueness
//!
//! Malformed *numeric* input is deliberately absent from this list: the
//! resolver folds it into "no contribution" instead of failing.

use std::fmt;

use thiserror::Error;

use crate::PeriodId;

/// Why a key failed to decode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MalformedReason {
    /// The key did not split into exactly three `|`-separated parts.
    PartCount(usize),
    /// The middle part is not an integer.
    PeriodNotInteger,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartCount(n) => write!(f, "expected 3 parts, found {n}"),
            Self::PeriodNotInteger => f.write_str("period id is not an integer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("malformed cell key `{key}`: {reason}")]
    MalformedKey { key: String, reason: MalformedReason },
}

impl KeyError {
    pub(crate) fn malformed(key: &str, reason: MalformedReason) -> Self {
        Self::MalformedKey {
            key: key.to_owned(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("period id {0} is not a valid YYYYMM month")]
    InvalidId(PeriodId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("period {0} appears more than once")]
    DuplicatePeriod(PeriodId),
    #[error("entity `{0}` appears more than once")]
    DuplicateEntity(String),
    #[error("code `{0}` contains the key separator `|`")]
    SeparatorInCode(String),
    #[error("column `{0}` appears more than once")]
    DuplicateColumn(String),
    #[error(transparent)]
    Period(#[from] PeriodError),
}
