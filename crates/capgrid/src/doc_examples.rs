use crate::{BudgetClass, EditSession, Entity, GridConfig, LatestMap, MatrixModel, ViewMode};

/// Build an original-budget session over `periods` with one entity per code
/// and the given persisted values.
///
/// This helper is intended for documentation examples to avoid repetitive setup.
///
/// # Example
///
/// ```rust
/// # use capgrid::doc_examples::budget_session;
/// let mut session = budget_session(
///     &[202601, 202602],
///     &["01.01"],
///     &[("01.01|202601|ORIG", "100")],
/// )?;
/// session.set_cell("01.01", 202602, "ORIG", "50");
/// assert_eq!(session.rollups().row_total("01.01", "ORIG"), 150.0);
/// session.reset();
/// assert_eq!(session.rollups().row_total("01.01", "ORIG"), 100.0);
/// # Ok::<(), capgrid::ModelError>(())
/// ```
pub fn budget_session(
    periods: &[crate::PeriodId],
    codes: &[&str],
    latest: &[(&str, &str)],
) -> Result<EditSession, crate::ModelError> {
    let config = GridConfig::default();
    let model = MatrixModel::from_period_ids(
        periods.iter().copied(),
        codes.iter().map(|c| Entity::new(*c, *c)).collect(),
        ViewMode::Budget {
            class: BudgetClass::Orig,
        },
        &config,
    )?;
    let latest: LatestMap = latest
        .iter()
        .map(|(k, v)| (k.to_string(), Some(v.to_string())))
        .collect();
    Ok(EditSession::new(model, config, latest))
}
