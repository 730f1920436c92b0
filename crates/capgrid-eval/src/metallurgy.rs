//! Shift/tank balance: merge-join of two per-metal datasets and the
//! rollups of the merged report.
//!
//! Each metal's dataset is aggregated on its own and keyed by
//! `(entity, entry_date)`. The join keeps every key from either side; a row
//! missing on one side keeps that metal's fields blank, so aggregation sees
//! them as absent rather than zero.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use capgrid_common::{Column, PercentScale, is_present};
use chrono::NaiveDate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::matrix::balance_columns;
use crate::rollup::{ColumnTotal, Record, total_over};

/// Field name → raw cell text of one dataset row.
pub type Fields = BTreeMap<String, String>;

/// One aggregated row of a single metal's dataset.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftEntry {
    pub entity: String,
    pub entry_date: NaiveDate,
    pub fields: Fields,
    /// Downstream campaign/period this row is attached to, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub link: Option<String>,
}

impl ShiftEntry {
    pub fn new(entity: impl Into<String>, entry_date: NaiveDate) -> Self {
        Self {
            entity: entity.into(),
            entry_date,
            fields: Fields::new(),
            link: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MetalDataset {
    pub metal: String,
    pub entries: Vec<ShiftEntry>,
}

/// Side of the join a field comes from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Side {
    First,
    Second,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MergedShiftRow {
    pub entity: String,
    pub entry_date: NaiveDate,
    pub first: Option<Fields>,
    pub second: Option<Fields>,
    pub linked: bool,
}

impl MergedShiftRow {
    pub fn side(&self, side: Side) -> Option<&Fields> {
        match side {
            Side::First => self.first.as_ref(),
            Side::Second => self.second.as_ref(),
        }
    }

    /// Field of one side only; `None` when that side is missing.
    pub fn raw_from(&self, side: Side, field: &str) -> Option<&str> {
        self.side(side)?.get(field).map(String::as_str)
    }
}

impl Record for MergedShiftRow {
    /// First side wins for fields both datasets carry (shared tonnage),
    /// unless it left the field blank.
    fn raw(&self, column: &str) -> Option<&str> {
        self.raw_from(Side::First, column)
            .filter(|raw| is_present(Some(*raw)))
            .or_else(|| self.raw_from(Side::Second, column))
    }
}

/// Trailing digits of an entity code without leading zeros: `TK-012` →
/// `"12"`, `TK-0` → `"0"`. Any length is accepted.
pub fn numeric_suffix(code: &str) -> Option<&str> {
    let stem = code.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &code[stem.len()..];
    if digits.is_empty() {
        return None;
    }
    let significant = digits.trim_start_matches('0');
    Some(if significant.is_empty() { "0" } else { significant })
}

/// Report order: numeric suffix ascending (codes without one last), entry
/// date descending, linked rows before unlinked, then the full code.
pub fn report_order(a: &MergedShiftRow, b: &MergedShiftRow) -> Ordering {
    // numeric order of arbitrarily long digit runs: shorter first, then lexical
    let suffix = |row: &MergedShiftRow| match numeric_suffix(&row.entity) {
        Some(digits) => (0u8, digits.len(), digits.to_owned()),
        None => (1u8, 0, String::new()),
    };
    suffix(a)
        .cmp(&suffix(b))
        .then_with(|| b.entry_date.cmp(&a.entry_date))
        .then_with(|| b.linked.cmp(&a.linked))
        .then_with(|| a.entity.cmp(&b.entity))
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftBalance {
    pub metals: [String; 2],
    pub rows: Vec<MergedShiftRow>,
}

/// Full outer join of two metal datasets on `(entity, entry_date)`.
///
/// Within one dataset a repeated key keeps the last entry.
pub fn merge_join(first: &MetalDataset, second: &MetalDataset) -> ShiftBalance {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!(
        "merge_join",
        first = first.metal.as_str(),
        second = second.metal.as_str()
    )
    .entered();

    type Slot<'e> = (Option<&'e ShiftEntry>, Option<&'e ShiftEntry>);
    let mut joined: BTreeMap<(&str, NaiveDate), Slot<'_>> = BTreeMap::new();
    for entry in &first.entries {
        joined
            .entry((entry.entity.as_str(), entry.entry_date))
            .or_default()
            .0 = Some(entry);
    }
    for entry in &second.entries {
        joined
            .entry((entry.entity.as_str(), entry.entry_date))
            .or_default()
            .1 = Some(entry);
    }

    let mut rows: Vec<MergedShiftRow> = joined
        .into_iter()
        .map(|((entity, entry_date), (a, b))| MergedShiftRow {
            entity: entity.to_owned(),
            entry_date,
            first: a.map(|e| e.fields.clone()),
            second: b.map(|e| e.fields.clone()),
            linked: a.is_some_and(|e| e.link.is_some()) || b.is_some_and(|e| e.link.is_some()),
        })
        .collect();
    rows.sort_by(report_order);

    #[cfg(feature = "tracing")]
    tracing::debug!(rows = rows.len(), "merged shift balance");

    ShiftBalance {
        metals: [first.metal.clone(), second.metal.clone()],
        rows,
    }
}

impl ShiftBalance {
    /// Balance columns for both metals.
    pub fn columns(&self) -> Vec<Column> {
        balance_columns(&self.metals)
    }

    /// Totals of every balance column over all rows.
    pub fn totals(&self, scale: PercentScale) -> Vec<ColumnTotal> {
        totals_for(&self.rows, &self.columns(), scale)
    }

    /// Per-day totals, most recent day first.
    pub fn daily_totals(&self, scale: PercentScale) -> Vec<(NaiveDate, Vec<ColumnTotal>)> {
        let columns = self.columns();
        let mut by_day: BTreeMap<NaiveDate, Vec<MergedShiftRow>> = BTreeMap::new();
        for row in &self.rows {
            by_day.entry(row.entry_date).or_default().push(row.clone());
        }
        by_day
            .into_iter()
            .rev()
            .map(|(day, rows)| (day, totals_for(&rows, &columns, scale)))
            .collect()
    }
}

fn totals_for(
    rows: &[MergedShiftRow],
    columns: &[Column],
    scale: PercentScale,
) -> Vec<ColumnTotal> {
    columns
        .iter()
        .map(|column| ColumnTotal {
            key: column.key.clone(),
            value: total_over(rows, column, scale),
        })
        .collect()
}
