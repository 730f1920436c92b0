//! Editing session: one matrix, its latest snapshot and the user's drafts.
//!
//! Drafts are only ever cleared wholesale: on a successful commit or on an
//! explicit reset. A failed commit leaves them untouched. The session never
//! folds its own commit into `latest`; callers reload from the persistence
//! layer via [`EditSession::reload`].

use std::error::Error as StdError;

use capgrid_common::{CellKey, KeyError, PeriodId, decode, encode};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{CellValueResolver, DraftMap, GridConfig, LatestMap, MatrixModel, Rollups};

/// One changed cell as handed to the persistence collaborator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitEntry {
    pub key: String,
    /// Verbatim draft text, parsable or not.
    pub value: String,
}

/// Persistence collaborator receiving committed drafts.
///
/// An implementation either stores the whole batch or fails; partial success
/// is not part of the contract.
pub trait CommitAdapter {
    type Error: StdError + Send + Sync + 'static;

    fn commit(&mut self, entries: &[CommitEntry]) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum CommitError<E: StdError + 'static> {
    #[error("persistence layer rejected the commit")]
    Adapter(#[source] E),
}

/// Every draft, ordered by its position in `model` (entity, period, column);
/// keys outside the model follow in lexicographic order.
///
/// No-op edits are not filtered: a draft key's presence means the user
/// acknowledged that value.
pub fn commit_payload(drafts: &DraftMap, model: &MatrixModel) -> Vec<CommitEntry> {
    let mut placed: Vec<(Option<_>, &String, &String)> = drafts
        .iter()
        .map(|(key, value)| (model.position(key), key, value))
        .collect();
    placed.sort_by(|a, b| match (a.0, b.0) {
        (Some(pa), Some(pb)) => pa.cmp(&pb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.1.cmp(b.1),
    });
    placed
        .into_iter()
        .map(|(_, key, value)| CommitEntry {
            key: key.clone(),
            value: value.clone(),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct EditSession {
    model: MatrixModel,
    config: GridConfig,
    latest: LatestMap,
    drafts: DraftMap,
}

impl EditSession {
    pub fn new(model: MatrixModel, config: GridConfig, latest: LatestMap) -> Self {
        Self {
            model,
            config,
            latest,
            drafts: DraftMap::default(),
        }
    }

    pub fn model(&self) -> &MatrixModel {
        &self.model
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn latest(&self) -> &LatestMap {
        &self.latest
    }

    pub fn drafts(&self) -> &DraftMap {
        &self.drafts
    }

    pub fn is_dirty(&self) -> bool {
        !self.drafts.is_empty()
    }

    /// Record an edit for an engine-generated key.
    ///
    /// A key that does not decode is a programming error and is returned as
    /// [`KeyError::MalformedKey`]; the draft map is left unchanged.
    pub fn set_draft(&mut self, key: &str, value: impl Into<String>) -> Result<(), KeyError> {
        decode(key)?;
        self.drafts.insert(key.to_owned(), value.into());
        Ok(())
    }

    pub fn set_cell(
        &mut self,
        entity_code: &str,
        period_id: PeriodId,
        column_key: &str,
        value: impl Into<String>,
    ) {
        self.drafts
            .insert(encode(entity_code, period_id, column_key), value.into());
    }

    pub fn set_cell_key(&mut self, key: &CellKey, value: impl Into<String>) {
        self.drafts.insert(key.encode(), value.into());
    }

    /// Drop every draft. Idempotent.
    pub fn reset(&mut self) {
        self.drafts.clear();
    }

    pub fn resolver(&self) -> CellValueResolver<'_> {
        CellValueResolver::new(&self.latest, &self.drafts)
    }

    pub fn rollups(&self) -> Rollups<'_> {
        Rollups::new(&self.model, self.resolver(), &self.config)
    }

    pub fn effective(&self, key: &str) -> f64 {
        self.resolver().effective(key)
    }

    pub fn payload(&self) -> Vec<CommitEntry> {
        commit_payload(&self.drafts, &self.model)
    }

    /// Hand every draft to `adapter` as one batch.
    ///
    /// On success all drafts are cleared and the number of committed cells is
    /// returned; `latest` is not touched until [`Self::reload`]. On failure
    /// the drafts stay exactly as they were. An empty draft map commits
    /// nothing and does not call the adapter.
    pub fn commit<A: CommitAdapter>(
        &mut self,
        adapter: &mut A,
    ) -> Result<usize, CommitError<A::Error>> {
        let entries = self.payload();
        if entries.is_empty() {
            return Ok(0);
        }

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("commit", cells = entries.len()).entered();

        match adapter.commit(&entries) {
            Ok(()) => {
                self.drafts.clear();
                #[cfg(feature = "tracing")]
                tracing::debug!("commit accepted; drafts cleared");
                Ok(entries.len())
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %err, "commit rejected; drafts kept");
                Err(CommitError::Adapter(err))
            }
        }
    }

    /// Replace the latest snapshot with a fresh read from persistence.
    pub fn reload(&mut self, latest: LatestMap) {
        self.latest = latest;
    }
}
