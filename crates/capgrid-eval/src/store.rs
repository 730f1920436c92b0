//! In-memory persistence collaborator.

use capgrid_common::{KeyError, decode};
use thiserror::Error;

use crate::LatestMap;
use crate::session::{CommitAdapter, CommitEntry};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryStoreError {
    #[error("store is read-only")]
    ReadOnly,
    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Latest values held in memory.
///
/// A batch is validated in full before any entry is applied, so a rejected
/// commit leaves the store unchanged. Empty draft text is stored as a null.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: LatestMap,
    read_only: bool,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
            ..Self::default()
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Snapshot of the stored values, for [`crate::EditSession::reload`].
    pub fn latest(&self) -> LatestMap {
        self.values.clone()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_deref())
    }

    /// Number of accepted batches.
    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl CommitAdapter for MemoryStore {
    type Error = MemoryStoreError;

    fn commit(&mut self, entries: &[CommitEntry]) -> Result<(), Self::Error> {
        if self.read_only {
            return Err(MemoryStoreError::ReadOnly);
        }
        for entry in entries {
            decode(&entry.key)?;
        }
        for entry in entries {
            let value = (!entry.value.trim().is_empty()).then(|| entry.value.clone());
            self.values.insert(entry.key.clone(), value);
        }
        self.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &str) -> CommitEntry {
        CommitEntry {
            key: key.into(),
            value: value.into(),
        }
    }

    #[test]
    fn applies_batch_and_nulls_blank_text() {
        let mut store = MemoryStore::from_pairs([("A|202601|ORIG", "5")]);
        store
            .commit(&[entry("A|202601|ORIG", ""), entry("A|202602|ORIG", "7")])
            .unwrap();
        assert_eq!(store.get("A|202601|ORIG"), None);
        assert_eq!(store.latest().get("A|202601|ORIG"), Some(&None));
        assert_eq!(store.get("A|202602|ORIG"), Some("7"));
        assert_eq!(store.commits(), 1);
    }

    #[test]
    fn malformed_key_rejects_whole_batch() {
        let mut store = MemoryStore::new();
        let err = store
            .commit(&[entry("A|202601|ORIG", "1"), entry("broken", "2")])
            .unwrap_err();
        assert!(matches!(err, MemoryStoreError::Key(_)));
        assert!(store.latest().is_empty());
        assert_eq!(store.commits(), 0);
    }

    #[test]
    fn read_only_store_refuses() {
        let mut store = MemoryStore::new().read_only(true);
        assert_eq!(
            store.commit(&[entry("A|202601|ORIG", "1")]),
            Err(MemoryStoreError::ReadOnly)
        );
    }
}
