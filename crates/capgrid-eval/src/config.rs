use capgrid_common::PercentScale;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Column names and conventions shared by every grid in a deployment.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// How percentage cells are written. Conversion to fractions happens only
    /// at the column boundary.
    pub percent_scale: PercentScale,
    /// Cumulative earned-value percentage column.
    pub ev_column: String,
    /// Actual-cost column.
    pub actual_cost_column: String,
    /// Every budget class; an entity's budget is the sum across all of them.
    pub budget_columns: Vec<String>,
    pub forecast_column: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            percent_scale: PercentScale::Hundred,
            ev_column: "EV_PCT".to_string(),
            actual_cost_column: "AC".to_string(),
            budget_columns: vec!["ORIG".to_string(), "SOC".to_string()],
            forecast_column: "FCST".to_string(),
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: GridConfig =
            serde_json::from_str(r#"{ "percent_scale": "fraction", "ev_column": "PCT" }"#)
                .unwrap();
        assert_eq!(config.percent_scale, PercentScale::Fraction);
        assert_eq!(config.ev_column, "PCT");
        assert_eq!(config.actual_cost_column, "AC");
        assert_eq!(config.budget_columns, vec!["ORIG", "SOC"]);
    }

    #[test]
    fn view_mode_is_tagged() {
        let mode: crate::ViewMode =
            serde_json::from_str(r#"{ "view": "budget", "class": "soc" }"#).unwrap();
        assert_eq!(
            mode,
            crate::ViewMode::Budget {
                class: crate::BudgetClass::Soc
            }
        );
    }
}
