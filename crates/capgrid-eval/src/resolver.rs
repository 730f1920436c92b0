//! Draft-over-latest resolution of a single cell.
//!
//! A key present in the draft map always wins, whatever its text. Latest
//! values only speak for keys the user has not touched. Nothing here fails on
//! bad numbers: unparsable text contributes `0`, while its raw string stays
//! available for display and commit.

use capgrid_common::{Period, PeriodId, encode, is_present, parse_lenient};
use rustc_hash::FxHashMap;

/// Persisted values, one per key; `None` is a stored null.
pub type LatestMap = FxHashMap<String, Option<String>>;

/// Unsaved edits of the current session.
pub type DraftMap = FxHashMap<String, String>;

/// Read-only view over one latest snapshot and one draft snapshot.
#[derive(Debug, Clone, Copy)]
pub struct CellValueResolver<'a> {
    latest: &'a LatestMap,
    drafts: &'a DraftMap,
}

impl<'a> CellValueResolver<'a> {
    pub fn new(latest: &'a LatestMap, drafts: &'a DraftMap) -> Self {
        Self { latest, drafts }
    }

    /// Unparsed text, draft first. `None` when neither source has the key
    /// (or latest holds a null).
    pub fn raw(&self, key: &str) -> Option<&'a str> {
        match self.drafts.get(key) {
            Some(draft) => Some(draft.as_str()),
            None => self.latest.get(key).and_then(|v| v.as_deref()),
        }
    }

    /// Numeric value used for aggregation; `0` when absent or unparsable.
    pub fn effective(&self, key: &str) -> f64 {
        self.raw(key).and_then(parse_lenient).unwrap_or(0.0)
    }

    /// `Some(effective)` when the cell has been entered, `None` otherwise.
    ///
    /// This is what aggregation strategies consume: an explicit `"0"` is
    /// `Some(0.0)`, an empty cell is `None`.
    pub fn present(&self, key: &str) -> Option<f64> {
        is_present(self.raw(key)).then(|| self.effective(key))
    }

    pub fn is_drafted(&self, key: &str) -> bool {
        self.drafts.contains_key(key)
    }

    /// [`Self::present`] addressed by parts.
    pub fn cell(&self, entity_code: &str, period_id: PeriodId, column_key: &str) -> Option<f64> {
        self.present(&encode(entity_code, period_id, column_key))
    }

    /// Most recently entered value of a cumulative column.
    ///
    /// `periods` must be in ascending order (as [`crate::MatrixModel`] keeps
    /// them); the scan runs from the last period backwards and stops at the
    /// first non-empty cell.
    pub fn last_non_empty_in_period_order(
        &self,
        entity_code: &str,
        column_key: &str,
        periods: &[Period],
    ) -> f64 {
        periods
            .iter()
            .rev()
            .find_map(|p| self.cell(entity_code, p.id, column_key))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latest(pairs: &[(&str, Option<&str>)]) -> LatestMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    fn drafts(pairs: &[(&str, &str)]) -> DraftMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn draft_wins_even_when_unparsable() {
        let latest = latest(&[("A|202601|ORIG", Some("100"))]);
        let drafts = drafts(&[("A|202601|ORIG", "12x")]);
        let r = CellValueResolver::new(&latest, &drafts);
        assert_eq!(r.raw("A|202601|ORIG"), Some("12x"));
        assert_eq!(r.effective("A|202601|ORIG"), 0.0);
        assert_eq!(r.present("A|202601|ORIG"), Some(0.0));
    }

    #[test]
    fn empty_draft_hides_latest() {
        let latest = latest(&[("A|202601|ORIG", Some("100"))]);
        let drafts = drafts(&[("A|202601|ORIG", "")]);
        let r = CellValueResolver::new(&latest, &drafts);
        assert_eq!(r.raw("A|202601|ORIG"), Some(""));
        assert_eq!(r.present("A|202601|ORIG"), None);
    }

    #[test]
    fn latest_used_when_no_draft() {
        let latest = latest(&[("A|202601|ORIG", Some("1.234,5")), ("A|202602|ORIG", None)]);
        let drafts = DraftMap::default();
        let r = CellValueResolver::new(&latest, &drafts);
        assert_eq!(r.effective("A|202601|ORIG"), 1234.5);
        assert_eq!(r.raw("A|202602|ORIG"), None);
        assert_eq!(r.effective("A|202602|ORIG"), 0.0);
        assert_eq!(r.raw("missing"), None);
        assert!(!r.is_drafted("A|202601|ORIG"));
    }

    #[test]
    fn last_non_empty_skips_trailing_blanks() {
        let periods = vec![
            Period::new(202601, "Jan"),
            Period::new(202602, "Feb"),
            Period::new(202603, "Mar"),
        ];
        let latest = latest(&[
            ("A|202601|EV_PCT", Some("")),
            ("A|202602|EV_PCT", Some("40")),
            ("A|202603|EV_PCT", Some("")),
        ]);
        let drafts = DraftMap::default();
        let r = CellValueResolver::new(&latest, &drafts);
        assert_eq!(r.last_non_empty_in_period_order("A", "EV_PCT", &periods), 40.0);
        assert_eq!(r.last_non_empty_in_period_order("B", "EV_PCT", &periods), 0.0);
    }

    #[test]
    fn last_non_empty_sees_drafted_zero() {
        let periods = vec![Period::new(202601, "Jan"), Period::new(202602, "Feb")];
        let latest = latest(&[("A|202601|EV_PCT", Some("30"))]);
        let drafts = drafts(&[("A|202602|EV_PCT", "0")]);
        let r = CellValueResolver::new(&latest, &drafts);
        assert_eq!(r.last_non_empty_in_period_order("A", "EV_PCT", &periods), 0.0);
    }
}
