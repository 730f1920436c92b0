use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::PeriodError;

/// `YYYYMM` period identifier, e.g. `202601`.
pub type PeriodId = i32;

/// A reporting month in a grid, ordered by `id`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Period {
    pub id: PeriodId,
    pub label: String,
}

impl Period {
    /// Build a period with a caller-chosen label. The id is not validated.
    pub fn new(id: PeriodId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    /// Build a period from a `YYYYMM` id, labelled like `Jan 2026`.
    pub fn from_id(id: PeriodId) -> Result<Self, PeriodError> {
        let first = first_day(id)?;
        Ok(Self {
            id,
            label: first.format("%b %Y").to_string(),
        })
    }

    /// Build the period containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let id = date.year() * 100 + date.month() as i32;
        Self {
            id,
            label: date.format("%b %Y").to_string(),
        }
    }

    pub fn year(&self) -> i32 {
        self.id.div_euclid(100)
    }

    pub fn month(&self) -> u32 {
        self.id.rem_euclid(100) as u32
    }

    /// First calendar day of the month, when `id` names a real month.
    pub fn first_day(&self) -> Result<NaiveDate, PeriodError> {
        first_day(self.id)
    }
}

fn first_day(id: PeriodId) -> Result<NaiveDate, PeriodError> {
    let month = id.rem_euclid(100) as u32;
    NaiveDate::from_ymd_opt(id.div_euclid(100), month, 1).ok_or(PeriodError::InvalidId(id))
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id).then_with(|| self.label.cmp(&other.label))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// A grid row: a WBS line, or a shift/tank record.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entity {
    pub code: String,
    pub name: String,
    /// Column whose resolved value weights this entity in weighted rollups.
    #[cfg_attr(feature = "serde", serde(default))]
    pub weight_hint: Option<String>,
}

impl Entity {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            weight_hint: None,
        }
    }

    pub fn with_weight_hint(mut self, column_key: impl Into<String>) -> Self {
        self.weight_hint = Some(column_key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_id_labels_month() {
        let p = Period::from_id(202601).unwrap();
        assert_eq!(p.label, "Jan 2026");
        assert_eq!(p.year(), 2026);
        assert_eq!(p.month(), 1);
        assert_eq!(p.to_string(), "Jan 2026");
    }

    #[test]
    fn from_id_rejects_month_thirteen() {
        assert_eq!(Period::from_id(202613), Err(PeriodError::InvalidId(202613)));
        assert_eq!(Period::from_id(202600), Err(PeriodError::InvalidId(202600)));
    }

    #[test]
    fn containing_date_round_trips_through_id() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 17).unwrap();
        let p = Period::containing(date);
        assert_eq!(p.id, 202511);
        assert_eq!(p.first_day().unwrap(), NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
    }

    #[test]
    fn periods_order_by_id() {
        let mut periods = vec![
            Period::new(202603, "Mar"),
            Period::new(202601, "Jan"),
            Period::new(202602, "Feb"),
        ];
        periods.sort();
        let ids: Vec<_> = periods.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![202601, 202602, 202603]);
    }
}
