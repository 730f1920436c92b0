//! Read-only description of an editable grid: ordered periods, ordered
//! entities, and the columns the current view exposes.

use capgrid_common::{
    Column, Entity, KEY_SEPARATOR, ModelError, Period, PeriodId, ValueKind, decode, encode,
};
use rustc_hash::{FxHashMap, FxHashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::GridConfig;

/// Metallurgical balance column keys shared by every metal.
pub mod balance {
    /// Wet tonnage.
    pub const TMH: &str = "TMH";
    /// Moisture percentage, weighted by wet tonnage.
    pub const H2O: &str = "H2O";
    /// Dry tonnage.
    pub const TMS: &str = "TMS";
    pub const HOURS: &str = "HOURS";
    /// Dry tonnes per operating hour.
    pub const RATE: &str = "RATE";

    pub fn grade(metal: &str) -> String {
        format!("{metal}_GRADE")
    }

    /// Metal content fed.
    pub fn fed(metal: &str) -> String {
        format!("{metal}_FINO")
    }

    pub fn produced(metal: &str) -> String {
        format!("{metal}_PROD")
    }

    pub fn recovery(metal: &str) -> String {
        format!("{metal}_REC")
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BudgetClass {
    /// Original budget.
    Orig,
    /// Supplemental / contingency budget.
    Soc,
}

impl BudgetClass {
    pub fn key(self) -> &'static str {
        match self {
            BudgetClass::Orig => "ORIG",
            BudgetClass::Soc => "SOC",
        }
    }
}

/// Which grid the user is looking at. Determines the active columns.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "view", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewMode {
    Budget { class: BudgetClass },
    Forecast,
    Progress { with_actual_cost: bool },
    MetallurgicalBalance { metals: Vec<String> },
}

impl ViewMode {
    pub fn active_columns(&self, config: &GridConfig) -> Vec<Column> {
        match self {
            ViewMode::Budget { class } => vec![Column::money(class.key())],
            ViewMode::Forecast => vec![Column::money(&config.forecast_column)],
            ViewMode::Progress { with_actual_cost } => {
                let mut columns = vec![Column::cumulative_percentage(&config.ev_column)];
                if *with_actual_cost {
                    columns.push(Column::money(&config.actual_cost_column));
                }
                columns
            }
            ViewMode::MetallurgicalBalance { metals } => balance_columns(metals),
        }
    }
}

/// Shift-balance columns: shared tonnage/time columns, then per-metal
/// grade, fed, produced and recovery.
pub fn balance_columns(metals: &[String]) -> Vec<Column> {
    use balance::*;

    let mut columns = vec![
        Column::mass(TMH),
        Column::weighted_percentage(H2O, TMH),
        Column::mass(TMS),
        Column::hours(HOURS),
        Column::ratio_of(RATE, ValueKind::Ratio, TMS, HOURS),
    ];
    for metal in metals {
        columns.push(Column::weighted_percentage(grade(metal), TMS));
        columns.push(Column::mass(fed(metal)));
        columns.push(Column::mass(produced(metal)));
        columns.push(Column::ratio_of(
            recovery(metal),
            ValueKind::Percentage,
            produced(metal),
            fed(metal),
        ));
    }
    columns
}

/// Position of a cell inside a matrix: entity, period and column indices.
pub type CellPosition = (usize, usize, usize);

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixModel {
    periods: Vec<Period>,
    entities: Vec<Entity>,
    mode: ViewMode,
    columns: Vec<Column>,
    entity_index: FxHashMap<String, usize>,
}

impl MatrixModel {
    /// Build a model, sorting periods ascending.
    ///
    /// Rejects duplicate period ids, duplicate entity codes, duplicate column
    /// keys and any code containing the key separator, so every cell key of
    /// the model is unique and decodable.
    pub fn new(
        mut periods: Vec<Period>,
        entities: Vec<Entity>,
        mode: ViewMode,
        config: &GridConfig,
    ) -> Result<Self, ModelError> {
        periods.sort();
        if let Some(dup) = periods.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(ModelError::DuplicatePeriod(dup[0].id));
        }

        let mut entity_index = FxHashMap::default();
        for (idx, entity) in entities.iter().enumerate() {
            if entity.code.contains(KEY_SEPARATOR) {
                return Err(ModelError::SeparatorInCode(entity.code.clone()));
            }
            if entity_index.insert(entity.code.clone(), idx).is_some() {
                return Err(ModelError::DuplicateEntity(entity.code.clone()));
            }
        }

        let columns = mode.active_columns(config);
        let mut seen = FxHashSet::default();
        for column in &columns {
            if column.key.contains(KEY_SEPARATOR) {
                return Err(ModelError::SeparatorInCode(column.key.clone()));
            }
            if !seen.insert(column.key.as_str()) {
                return Err(ModelError::DuplicateColumn(column.key.clone()));
            }
        }

        Ok(Self {
            periods,
            entities,
            mode,
            columns,
            entity_index,
        })
    }

    /// Build a model from `YYYYMM` ids, labelling each month.
    pub fn from_period_ids(
        ids: impl IntoIterator<Item = PeriodId>,
        entities: Vec<Entity>,
        mode: ViewMode,
        config: &GridConfig,
    ) -> Result<Self, ModelError> {
        let periods = ids
            .into_iter()
            .map(Period::from_id)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(periods, entities, mode, config)
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn entity(&self, code: &str) -> Option<&Entity> {
        self.entity_index.get(code).map(|&idx| &self.entities[idx])
    }

    pub fn cell_count(&self) -> usize {
        self.entities.len() * self.periods.len() * self.columns.len()
    }

    /// Every cell key, entity-major, then period, then column.
    pub fn cell_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.entities.iter().flat_map(move |e| {
            self.periods.iter().flat_map(move |p| {
                self.columns
                    .iter()
                    .map(move |c| encode(&e.code, p.id, &c.key))
            })
        })
    }

    /// Where `key` sits in [`Self::cell_keys`] order, if it belongs here.
    pub fn position(&self, key: &str) -> Option<CellPosition> {
        let cell = decode(key).ok()?;
        let entity = *self.entity_index.get(&cell.entity_code)?;
        let period = self
            .periods
            .binary_search_by_key(&cell.period_id, |p| p.id)
            .ok()?;
        let column = self.columns.iter().position(|c| c.key == cell.column_key)?;
        Some((entity, period, column))
    }

    /// Same grid restricted to periods in `from..=to`.
    pub fn period_scope(&self, from: PeriodId, to: PeriodId) -> Self {
        let mut scoped = self.clone();
        scoped.periods.retain(|p| (from..=to).contains(&p.id));
        scoped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities() -> Vec<Entity> {
        vec![Entity::new("01.01", "Civil works"), Entity::new("01.02", "Piping")]
    }

    #[test]
    fn budget_view_exposes_selected_class_only() {
        let config = GridConfig::default();
        let cols = ViewMode::Budget {
            class: BudgetClass::Soc,
        }
        .active_columns(&config);
        let keys: Vec<_> = cols.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["SOC"]);
    }

    #[test]
    fn progress_view_toggles_actual_cost() {
        let config = GridConfig::default();
        let single = ViewMode::Progress {
            with_actual_cost: false,
        }
        .active_columns(&config);
        let double = ViewMode::Progress {
            with_actual_cost: true,
        }
        .active_columns(&config);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].key, "EV_PCT");
        assert_eq!(double[1].key, "AC");
    }

    #[test]
    fn balance_columns_cover_each_metal() {
        let cols = balance_columns(&["CU".to_string(), "AU".to_string()]);
        let keys: Vec<_> = cols.iter().map(|c| c.key.as_str()).collect();
        assert!(keys.contains(&"CU_REC"));
        assert!(keys.contains(&"AU_GRADE"));
        assert_eq!(cols.len(), 5 + 2 * 4);
    }

    #[test]
    fn periods_are_sorted_and_keys_enumerated_in_order() {
        let model = MatrixModel::from_period_ids(
            [202602, 202601],
            entities(),
            ViewMode::Budget {
                class: BudgetClass::Orig,
            },
            &GridConfig::default(),
        )
        .unwrap();
        assert_eq!(model.periods()[0].id, 202601);
        let keys: Vec<_> = model.cell_keys().collect();
        assert_eq!(
            keys,
            vec![
                "01.01|202601|ORIG",
                "01.01|202602|ORIG",
                "01.02|202601|ORIG",
                "01.02|202602|ORIG",
            ]
        );
        assert_eq!(model.cell_count(), 4);
        assert_eq!(model.position("01.02|202601|ORIG"), Some((1, 0, 0)));
        assert_eq!(model.position("01.02|202601|SOC"), None);
        assert_eq!(model.position("garbage"), None);
    }

    #[test]
    fn rejects_duplicates_and_separators() {
        let config = GridConfig::default();
        let mode = ViewMode::Forecast;
        let err = MatrixModel::from_period_ids([202601, 202601], entities(), mode.clone(), &config)
            .unwrap_err();
        assert_eq!(err, ModelError::DuplicatePeriod(202601));

        let dup = vec![Entity::new("A", "a"), Entity::new("A", "b")];
        let err = MatrixModel::from_period_ids([202601], dup, mode.clone(), &config).unwrap_err();
        assert_eq!(err, ModelError::DuplicateEntity("A".into()));

        let piped = vec![Entity::new("A|B", "a")];
        let err = MatrixModel::from_period_ids([202601], piped, mode.clone(), &config).unwrap_err();
        assert_eq!(err, ModelError::SeparatorInCode("A|B".into()));

        let err = MatrixModel::from_period_ids([202613], entities(), mode, &config).unwrap_err();
        assert!(matches!(err, ModelError::Period(_)));
    }

    #[test]
    fn period_scope_keeps_range() {
        let model = MatrixModel::from_period_ids(
            [202601, 202602, 202603],
            entities(),
            ViewMode::Forecast,
            &GridConfig::default(),
        )
        .unwrap();
        let scoped = model.period_scope(202602, 202603);
        let ids: Vec<_> = scoped.periods().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![202602, 202603]);
        assert_eq!(scoped.entities().len(), 2);
    }
}
