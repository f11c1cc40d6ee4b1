//! In-memory store for testing and ephemeral use.

use crate::error::{StoreError, StoreResult};
use crate::store::{KeyCursor, KeyValueStore, Namespace};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

type NamespaceMap = BTreeMap<String, BTreeMap<String, String>>;

/// An in-memory namespaced store.
///
/// Entries live in ordered maps and vanish with the process. Suitable
/// for:
/// - Unit and integration tests
/// - Ephemeral word lists that are re-ingested on every start
///
/// # Thread Safety
///
/// All operations take the interior lock; the store can be shared
/// across threads behind an `Arc`.
///
/// # Failure Injection
///
/// Tests can call [`InMemoryStore::fail_next_commit`] to make the next
/// `put_all` fail, simulating a commit failure mid-ingest.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<NamespaceMap>,
    fail_next_commit: AtomicBool,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `put_all` fail with an I/O error.
    ///
    /// Useful for testing that a failed flush aborts a run without
    /// advancing the resume bookmark.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, ns: &Namespace, key: &str) -> StoreResult<Option<String>> {
        let data = self.data.read();
        Ok(data.get(ns.as_str()).and_then(|m| m.get(key).cloned()))
    }

    fn put(&self, ns: &Namespace, key: &str, value: &str) -> StoreResult<()> {
        let mut data = self.data.write();
        data.entry(ns.as_str().to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn put_all(&self, ns: &Namespace, entries: &[(String, String)]) -> StoreResult<()> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected commit failure",
            )));
        }
        let mut data = self.data.write();
        let map = data.entry(ns.as_str().to_string()).or_default();
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn remove(&self, ns: &Namespace, key: &str) -> StoreResult<()> {
        let mut data = self.data.write();
        if let Some(map) = data.get_mut(ns.as_str()) {
            map.remove(key);
        }
        Ok(())
    }

    fn contains(&self, ns: &Namespace, key: &str) -> StoreResult<bool> {
        let data = self.data.read();
        Ok(data.get(ns.as_str()).is_some_and(|m| m.contains_key(key)))
    }

    fn truncate(&self, ns: &Namespace) -> StoreResult<()> {
        let mut data = self.data.write();
        data.remove(ns.as_str());
        Ok(())
    }

    fn len(&self, ns: &Namespace) -> StoreResult<u64> {
        let data = self.data.read();
        Ok(data.get(ns.as_str()).map_or(0, |m| m.len() as u64))
    }

    fn iter(&self, ns: &Namespace) -> StoreResult<Box<dyn KeyCursor>> {
        let data = self.data.read();
        let entries: Vec<(String, String)> = data
            .get(ns.as_str())
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        Ok(Box::new(SnapshotCursor {
            entries: entries.into_iter(),
        }))
    }
}

/// Cursor over a point-in-time copy of one namespace.
struct SnapshotCursor {
    entries: std::vec::IntoIter<(String, String)>,
}

impl KeyCursor for SnapshotCursor {
    fn next_entry(&mut self) -> StoreResult<Option<(String, String)>> {
        Ok(self.entries.next())
    }
}
