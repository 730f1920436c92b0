//! Aggregation and override engine for editable period grids.
//!
//! A grid is a [`MatrixModel`] of entities × periods × columns. Cell values
//! come from a persisted snapshot overlaid by the session's drafts
//! ([`CellValueResolver`]); [`Rollups`] turns them into row, day and project
//! totals, and [`EditSession`] owns the commit/reset lifecycle of the drafts.

pub mod aggregate;
pub mod config;
pub mod matrix;
pub mod metallurgy;
pub mod resolver;
pub mod rollup;
pub mod session;
pub mod store;

pub use aggregate::{Sample, Strategy};
pub use config::GridConfig;
pub use matrix::{BudgetClass, CellPosition, MatrixModel, ViewMode, balance, balance_columns};
pub use metallurgy::{MergedShiftRow, MetalDataset, ShiftBalance, ShiftEntry, Side, merge_join};
pub use resolver::{CellValueResolver, DraftMap, LatestMap};
pub use rollup::{
    CellRecord, ColumnTotal, ProgressBasis, ProgressInput, ProgressRollup, Record, Rollups,
    total_over, weighted_progress,
};
pub use session::{CommitAdapter, CommitEntry, CommitError, EditSession, commit_payload};
pub use store::{MemoryStore, MemoryStoreError};
