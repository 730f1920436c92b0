#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a column's numbers measure. Drives the default rollup policy and
/// whether percent-scale conversion applies at the column boundary.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Money,
    Percentage,
    Ratio,
    Count,
    /// Physical mass (TMH/TMS tonnage, metal content).
    Mass,
    /// Operating hours.
    Hours,
}

impl ValueKind {
    /// Extensive quantities add up across rows; intensive ones do not.
    pub fn is_additive(self) -> bool {
        matches!(self, Self::Money | Self::Count | Self::Mass | Self::Hours)
    }
}

/// How a column's day/project total is formed from its cells.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "policy", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RollupPolicy {
    Sum,
    Average,
    /// Weighted by another column of the same row (e.g. grade by dry tonnage).
    WeightedBy { weight: String },
    /// Σ numerator / Σ denominator over rows; never an average of row ratios.
    RatioOf {
        numerator: String,
        denominator: String,
    },
    /// Most recent entered value; for cumulative columns such as EV%.
    LastNonEmpty,
}

/// How percentages are stored in cell text.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum PercentScale {
    /// `0..=1`
    Fraction,
    /// `0..=100`
    #[default]
    Hundred,
}

impl PercentScale {
    pub fn factor(self) -> f64 {
        match self {
            Self::Fraction => 1.0,
            Self::Hundred => 100.0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    pub key: String,
    pub kind: ValueKind,
    pub rollup: RollupPolicy,
}

impl Column {
    /// Column with the natural policy for its kind: `Sum` for additive kinds,
    /// `Average` otherwise.
    pub fn new(key: impl Into<String>, kind: ValueKind) -> Self {
        let rollup = if kind.is_additive() {
            RollupPolicy::Sum
        } else {
            RollupPolicy::Average
        };
        Self {
            key: key.into(),
            kind,
            rollup,
        }
    }

    pub fn with_rollup(mut self, rollup: RollupPolicy) -> Self {
        self.rollup = rollup;
        self
    }

    pub fn money(key: impl Into<String>) -> Self {
        Self::new(key, ValueKind::Money)
    }

    pub fn mass(key: impl Into<String>) -> Self {
        Self::new(key, ValueKind::Mass)
    }

    pub fn hours(key: impl Into<String>) -> Self {
        Self::new(key, ValueKind::Hours)
    }

    /// Percentage column averaged by `weight` (grade, moisture).
    pub fn weighted_percentage(key: impl Into<String>, weight: impl Into<String>) -> Self {
        Self::new(key, ValueKind::Percentage).with_rollup(RollupPolicy::WeightedBy {
            weight: weight.into(),
        })
    }

    /// Cumulative percentage column where only the latest entry counts.
    pub fn cumulative_percentage(key: impl Into<String>) -> Self {
        Self::new(key, ValueKind::Percentage).with_rollup(RollupPolicy::LastNonEmpty)
    }

    /// Derived rate column totalled as Σ numerator / Σ denominator.
    pub fn ratio_of(
        key: impl Into<String>,
        kind: ValueKind,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self::new(key, kind).with_rollup(RollupPolicy::RatioOf {
            numerator: numerator.into(),
            denominator: denominator.into(),
        })
    }

    /// Stored value → canonical fraction. Identity for non-percentage kinds.
    pub fn to_fraction(&self, stored: f64, scale: PercentScale) -> f64 {
        match self.kind {
            ValueKind::Percentage => stored / scale.factor(),
            _ => stored,
        }
    }

    /// Canonical fraction → stored value. Identity for non-percentage kinds.
    pub fn from_fraction(&self, fraction: f64, scale: PercentScale) -> f64 {
        match self.kind {
            ValueKind::Percentage => fraction * scale.factor(),
            _ => fraction,
        }
    }
}
