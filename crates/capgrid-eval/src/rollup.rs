//! Row, day and project rollups over a [`MatrixModel`], plus the
//! earned-value weighted progress rollup.

use capgrid_common::{
    Column, Entity, PercentScale, PeriodId, RollupPolicy, encode, is_present, parse_lenient,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::aggregate::{average, last_non_empty, ratio_of_sums, sum, weighted_average};
use crate::{CellValueResolver, GridConfig, MatrixModel};

/// A row of raw cell text addressed by column key.
///
/// Matrix cells (one entity in one period) and merged shift rows both
/// implement this, so column policies are applied the same way to both.
pub trait Record {
    fn raw(&self, column: &str) -> Option<&str>;

    /// The aggregation view of a field: `None` when not entered.
    fn present(&self, column: &str) -> Option<f64> {
        let raw = self.raw(column);
        is_present(raw).then(|| raw.and_then(parse_lenient).unwrap_or(0.0))
    }
}

/// Apply `column`'s rollup policy across `records`.
///
/// The result is in the column's stored unit: a `RatioOf` total on a
/// percentage column is scaled by `scale`.
pub fn total_over<R: Record>(records: &[R], column: &Column, scale: PercentScale) -> Option<f64> {
    let key = column.key.as_str();
    match &column.rollup {
        RollupPolicy::Sum => Some(sum(records.iter().map(|r| r.present(key)))),
        RollupPolicy::Average => average(records.iter().map(|r| r.present(key))),
        RollupPolicy::WeightedBy { weight } => weighted_average(
            records
                .iter()
                .map(|r| (r.present(key), r.present(weight))),
        ),
        RollupPolicy::RatioOf {
            numerator,
            denominator,
        } => ratio_of_sums(
            records
                .iter()
                .map(|r| (r.present(numerator), r.present(denominator))),
        )
        .map(|fraction| column.from_fraction(fraction, scale)),
        RollupPolicy::LastNonEmpty => Some(last_non_empty(records.iter().map(|r| r.present(key)))),
    }
}

/// One entity in one period of a matrix.
#[derive(Debug, Clone, Copy)]
pub struct CellRecord<'a> {
    resolver: CellValueResolver<'a>,
    entity: &'a str,
    period: PeriodId,
}

impl Record for CellRecord<'_> {
    fn raw(&self, column: &str) -> Option<&str> {
        self.resolver.raw(&encode(self.entity, self.period, column))
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTotal {
    pub key: String,
    /// `None` when the policy is undefined for the group (no weight, no feed).
    pub value: Option<f64>,
}

/// Which pool produced an earned-value rollup.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProgressBasis {
    /// Budget-weighted mean over entities with a positive budget.
    BudgetWeighted,
    /// Plain mean over unbudgeted entities; no entity had a budget.
    Unweighted,
    /// No entity in either pool.
    Empty,
}

/// Per-entity input of the earned-value rollup.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProgressInput {
    pub ev: f64,
    pub budget: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRollup {
    pub value: f64,
    pub basis: ProgressBasis,
    pub weighted_entities: usize,
    pub unweighted_entities: usize,
    /// Entities with a negative budget; in neither pool.
    pub excluded_entities: usize,
}

/// Two-tier earned-value rollup.
///
/// Entities with `budget > 0` form the weighted pool, entities with
/// `budget == 0` the unweighted pool. A non-empty weighted pool decides the
/// result alone; unbudgeted entities never enter it as weight zero. Only when
/// nothing is budgeted does the plain mean of the unweighted pool apply.
pub fn weighted_progress<I>(inputs: I) -> ProgressRollup
where
    I: IntoIterator<Item = ProgressInput>,
{
    let mut weighted_sum = 0.0;
    let mut budget_sum = 0.0;
    let mut weighted_entities = 0;
    let mut plain_sum = 0.0;
    let mut unweighted_entities = 0;
    let mut excluded_entities = 0;

    for ProgressInput { ev, budget } in inputs {
        if budget > 0.0 {
            weighted_sum += ev * budget;
            budget_sum += budget;
            weighted_entities += 1;
        } else if budget == 0.0 {
            plain_sum += ev;
            unweighted_entities += 1;
        } else {
            excluded_entities += 1;
        }
    }

    let (value, basis) = if weighted_entities > 0 {
        (weighted_sum / budget_sum, ProgressBasis::BudgetWeighted)
    } else if unweighted_entities > 0 {
        (
            plain_sum / unweighted_entities as f64,
            ProgressBasis::Unweighted,
        )
    } else {
        (0.0, ProgressBasis::Empty)
    };

    ProgressRollup {
        value,
        basis,
        weighted_entities,
        unweighted_entities,
        excluded_entities,
    }
}

/// Rollup calculator bound to one matrix and one pair of value snapshots.
#[derive(Debug, Clone, Copy)]
pub struct Rollups<'a> {
    model: &'a MatrixModel,
    resolver: CellValueResolver<'a>,
    config: &'a GridConfig,
}

impl<'a> Rollups<'a> {
    pub fn new(
        model: &'a MatrixModel,
        resolver: CellValueResolver<'a>,
        config: &'a GridConfig,
    ) -> Self {
        Self {
            model,
            resolver,
            config,
        }
    }

    pub fn model(&self) -> &'a MatrixModel {
        self.model
    }

    /// SUM of one entity's cells in `column` across every period.
    pub fn row_total(&self, entity: &str, column: &str) -> f64 {
        sum(self
            .model
            .periods()
            .iter()
            .map(|p| self.resolver.cell(entity, p.id, column)))
    }

    /// Latest entered value of a cumulative column for one entity.
    pub fn row_current(&self, entity: &str, column: &str) -> f64 {
        self.resolver
            .last_non_empty_in_period_order(entity, column, self.model.periods())
    }

    /// Sum of an entity's budget across every budget class and period.
    pub fn entity_budget(&self, entity: &str) -> f64 {
        self.config
            .budget_columns
            .iter()
            .fold(0.0, |acc, column| acc + self.row_total(entity, column))
    }

    /// Weight of an entity in progress rollups: the row total of its
    /// `weight_hint` column when it has one, its budget otherwise.
    pub fn entity_weight(&self, entity: &Entity) -> f64 {
        match entity.weight_hint.as_deref() {
            Some(hint) => self.row_total(&entity.code, hint),
            None => self.entity_budget(&entity.code),
        }
    }

    fn records(&self) -> Vec<CellRecord<'a>> {
        let mut records =
            Vec::with_capacity(self.model.entities().len() * self.model.periods().len());
        for p in self.model.periods() {
            for e in self.model.entities() {
                records.push(CellRecord {
                    resolver: self.resolver,
                    entity: e.code.as_str(),
                    period: p.id,
                });
            }
        }
        records
    }

    /// Project total of a column, across every entity and period in scope.
    ///
    /// Uses the column's rollup policy. Cumulative (`LastNonEmpty`) columns
    /// take each entity's current value and combine them with
    /// [`weighted_progress`] using [`Self::entity_weight`] from these same
    /// maps, so the EV column total equals
    /// `self.earned_value_progress(self).value`.
    pub fn column_total(&self, column_key: &str) -> Option<f64> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("column_total", column = column_key).entered();

        let column = self.lookup_column(column_key);
        if column.rollup == RollupPolicy::LastNonEmpty {
            return Some(self.cumulative_progress(column_key, self).value);
        }
        total_over(&self.records(), &column, self.config.percent_scale)
    }

    /// Total of a column within a single period, across every entity.
    pub fn day_total(&self, column_key: &str, period: PeriodId) -> Option<f64> {
        let scoped = self.model.period_scope(period, period);
        Rollups::new(&scoped, self.resolver, self.config).column_total(column_key)
    }

    /// Totals for every active column of the view.
    pub fn column_totals(&self) -> Vec<ColumnTotal> {
        self.model
            .columns()
            .iter()
            .map(|c| ColumnTotal {
                key: c.key.clone(),
                value: self.column_total(&c.key),
            })
            .collect()
    }

    /// Project actual cost: plain SUM of the AC column, no weighting.
    pub fn actual_cost_total(&self) -> f64 {
        let key = self.config.actual_cost_column.as_str();
        sum(self.records().iter().map(|r| r.present(key)))
    }

    /// Earned-value progress of this (progress) matrix, weighting each entity
    /// by [`Self::entity_weight`] evaluated on `budget`, which may be a
    /// different matrix over the same entity codes.
    pub fn earned_value_progress(&self, budget: &Rollups<'_>) -> ProgressRollup {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "earned_value_progress",
            entities = self.model.entities().len()
        )
        .entered();

        let rollup = self.cumulative_progress(&self.config.ev_column, budget);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            value = rollup.value,
            basis = ?rollup.basis,
            weighted = rollup.weighted_entities,
            unweighted = rollup.unweighted_entities,
            "earned value rollup"
        );
        rollup
    }

    fn cumulative_progress(&self, column_key: &str, weights: &Rollups<'_>) -> ProgressRollup {
        weighted_progress(self.model.entities().iter().map(|e| ProgressInput {
            ev: self.row_current(&e.code, column_key),
            budget: weights.entity_weight(e),
        }))
    }

    /// Active column by key, or an additive money column for keys the view
    /// does not expose (e.g. a budget class hidden by the toggle).
    fn lookup_column(&self, key: &str) -> Column {
        self.model
            .column(key)
            .cloned()
            .unwrap_or_else(|| Column::money(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(rows: &[(f64, f64)]) -> Vec<ProgressInput> {
        rows.iter()
            .map(|&(ev, budget)| ProgressInput { ev, budget })
            .collect()
    }

    #[test]
    fn unbudgeted_entities_do_not_dilute_weighted_progress() {
        let rollup = weighted_progress(inputs(&[(50.0, 1000.0), (80.0, 0.0), (20.0, 3000.0)]));
        assert!((rollup.value - 27.5).abs() < 1e-9);
        assert_eq!(rollup.basis, ProgressBasis::BudgetWeighted);
        assert_eq!(rollup.weighted_entities, 2);
        assert_eq!(rollup.unweighted_entities, 1);
    }

    #[test]
    fn falls_back_to_plain_mean_without_budgets() {
        let rollup = weighted_progress(inputs(&[(80.0, 0.0), (20.0, 0.0)]));
        assert_eq!(rollup.value, 50.0);
        assert_eq!(rollup.basis, ProgressBasis::Unweighted);
    }

    #[test]
    fn empty_pools_yield_zero() {
        let rollup = weighted_progress(Vec::new());
        assert_eq!(rollup.value, 0.0);
        assert_eq!(rollup.basis, ProgressBasis::Empty);
    }

    #[test]
    fn negative_budgets_are_excluded() {
        let rollup = weighted_progress(inputs(&[(10.0, -500.0), (40.0, 0.0)]));
        assert_eq!(rollup.value, 40.0);
        assert_eq!(rollup.excluded_entities, 1);
    }

    struct Row(Vec<(&'static str, &'static str)>);

    impl Record for Row {
        fn raw(&self, column: &str) -> Option<&str> {
            self.0.iter().find(|(k, _)| *k == column).map(|(_, v)| *v)
        }
    }

    #[test]
    fn recovery_total_is_ratio_of_sums_in_stored_scale() {
        let rows = vec![
            Row(vec![("PROD", "10"), ("FED", "100")]),
            Row(vec![("PROD", "9"), ("FED", "50")]),
        ];
        let rec = Column::ratio_of("REC", capgrid_common::ValueKind::Percentage, "PROD", "FED");
        let total = total_over(&rows, &rec, PercentScale::Hundred).unwrap();
        assert!((total - 1900.0 / 150.0).abs() < 1e-9);
        let fraction = total_over(&rows, &rec, PercentScale::Fraction).unwrap();
        assert!((fraction - 19.0 / 150.0).abs() < 1e-9);
    }

    #[test]
    fn record_presence_distinguishes_blank_from_zero() {
        let rows = vec![Row(vec![("X", "")]), Row(vec![("X", "0")]), Row(vec![])];
        let avg = Column::new("X", capgrid_common::ValueKind::Ratio);
        assert_eq!(total_over(&rows, &avg, PercentScale::Hundred), Some(0.0));
        let sum_col = Column::money("X");
        assert_eq!(total_over(&rows, &sum_col, PercentScale::Hundred), Some(0.0));
        let none = vec![Row(vec![("X", "")])];
        assert_eq!(total_over(&none, &avg, PercentScale::Hundred), None);
    }
}
