//! Aggregation strategies over groups of resolved cells.
//!
//! Every strategy takes `Option<f64>` samples where `None` means "never
//! entered". Absent samples are skipped; present zeros count. Coercing an
//! absent cell to `0` before it reaches this module drags averages and
//! weighted sums toward zero, so callers must pass presence through
//! unchanged (see [`crate::CellValueResolver::present`]).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One cell of a group: its value and, for two-column strategies, the
/// companion weight or denominator.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Sample {
    pub value: Option<f64>,
    pub weight: Option<f64>,
}

impl Sample {
    pub fn value(value: Option<f64>) -> Self {
        Self {
            value,
            weight: None,
        }
    }

    pub fn weighted(value: Option<f64>, weight: Option<f64>) -> Self {
        Self { value, weight }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Strategy {
    Sum,
    Average,
    /// `Sample::weight` is the weight.
    WeightedAverage,
    /// `Sample::value` is the numerator, `Sample::weight` the denominator.
    RatioOfSums,
    /// Samples must be in period order.
    LastNonEmpty,
}

impl Strategy {
    /// Apply the strategy to a group. `Sum` and `LastNonEmpty` always yield a
    /// number; the others yield `None` when undefined.
    pub fn apply(self, samples: &[Sample]) -> Option<f64> {
        let values = samples.iter().map(|s| s.value);
        let pairs = samples.iter().map(|s| (s.value, s.weight));
        match self {
            Strategy::Sum => Some(sum(values)),
            Strategy::Average => average(values),
            Strategy::WeightedAverage => weighted_average(pairs),
            Strategy::RatioOfSums => ratio_of_sums(pairs),
            Strategy::LastNonEmpty => Some(last_non_empty(values)),
        }
    }
}

/* ─────────────────────────── SUM ──────────────────────────── */

/// Σ present values; `0` for a group with nothing entered.
pub fn sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().fold(0.0, |acc, v| acc + v)
}

/* ─────────────────────────── AVERAGE ──────────────────────────── */

/// Σ present values / count of present values.
pub fn average<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (total, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(t, n), v| (t + v, n + 1));
    (count > 0).then(|| total / count as f64)
}

/* ─────────────────────────── WEIGHTED AVERAGE ──────────────────────────── */

/// Σ value·weight / Σ weight over pairs where both sides are present.
///
/// `None` when the summed weight is not positive.
pub fn weighted_average<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (Option<f64>, Option<f64>)>,
{
    let mut weighted = 0.0;
    let mut weights = 0.0;
    for (value, weight) in pairs {
        if let (Some(v), Some(w)) = (value, weight) {
            weighted += v * w;
            weights += w;
        }
    }
    (weights > 0.0).then(|| weighted / weights)
}

/* ─────────────────────────── RATIO OF SUMS ──────────────────────────── */

/// Σ numerator / Σ denominator, each summed over its present samples.
///
/// This is the recovery and production-rate rule. `None` when the summed
/// denominator is zero: a recovery with no feed is unknown, not zero.
pub fn ratio_of_sums<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (Option<f64>, Option<f64>)>,
{
    let (num, den) = pairs.into_iter().fold((0.0, 0.0), |(n, d), (num, den)| {
        (n + num.unwrap_or(0.0), d + den.unwrap_or(0.0))
    });
    (den != 0.0).then(|| num / den)
}

/* ─────────────────────────── LAST NON-EMPTY ──────────────────────────── */

/// Last present value in iteration order, `0` if none.
pub fn last_non_empty<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().last().unwrap_or(0.0)
}
