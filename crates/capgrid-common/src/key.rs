//! Composite cell identity `(entity_code, period_id, column_key)` and its
//! single-string form `"{entity_code}|{period_id}|{column_key}"`.
//!
//! The codec does not validate that its inputs are free of the separator;
//! [`crate::ModelError::SeparatorInCode`] is raised where grids are built.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{KeyError, MalformedReason, PeriodId};

pub const KEY_SEPARATOR: char = '|';

/// Join the three parts of a cell identity into its string key.
pub fn encode(entity_code: &str, period_id: PeriodId, column_key: &str) -> String {
    format!("{entity_code}{KEY_SEPARATOR}{period_id}{KEY_SEPARATOR}{column_key}")
}

/// Split a string key back into its parts.
pub fn decode(key: &str) -> Result<CellKey, KeyError> {
    let parts: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    if parts.len() != 3 {
        return Err(KeyError::malformed(
            key,
            MalformedReason::PartCount(parts.len()),
        ));
    }
    let period_id = parts[1]
        .parse::<PeriodId>()
        .map_err(|_| KeyError::malformed(key, MalformedReason::PeriodNotInteger))?;
    Ok(CellKey {
        entity_code: parts[0].to_owned(),
        period_id,
        column_key: parts[2].to_owned(),
    })
}

/// Owned, decoded cell identity.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub entity_code: String,
    pub period_id: PeriodId,
    pub column_key: String,
}

impl CellKey {
    pub fn new(
        entity_code: impl Into<String>,
        period_id: PeriodId,
        column_key: impl Into<String>,
    ) -> Self {
        Self {
            entity_code: entity_code.into(),
            period_id,
            column_key: column_key.into(),
        }
    }

    pub fn encode(&self) -> String {
        encode(&self.entity_code, self.period_id, &self.column_key)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
            self.entity_code, self.period_id, self.column_key
        )
    }
}

impl FromStr for CellKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}
