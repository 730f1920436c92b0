//! Meta crate that re-exports the capgrid building blocks. Downstream users
//! can depend on this crate and opt into layers via feature flags while
//! keeping access to the underlying crates.

#[cfg(feature = "common")]
pub use capgrid_common as common;

#[cfg(feature = "eval")]
pub use capgrid_eval as eval;

#[cfg(feature = "common")]
pub use capgrid_common::{
    CellKey, Column, Entity, KeyError, ModelError, PercentScale, Period, PeriodId, RollupPolicy,
    ValueKind, decode, encode, parse_lenient,
};

#[cfg(feature = "eval")]
pub use capgrid_eval::{
    BudgetClass, CellValueResolver, CommitAdapter, CommitEntry, CommitError, DraftMap,
    EditSession, GridConfig, LatestMap, MatrixModel, MemoryStore, ProgressRollup, Rollups,
    ViewMode,
};

#[cfg(feature = "eval")]
pub mod doc_examples;
