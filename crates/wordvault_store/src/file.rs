//! File-backed store with snapshot persistence.
//!
//! Directory layout:
//!
//! ```text
//! <store_path>/
//! ├─ LOCK           # advisory lock for single-process access
//! ├─ SNAPSHOT       # CBOR snapshot of all namespaces
//! └─ SNAPSHOT.tmp   # staging file for atomic rewrite
//! ```
//!
//! Every commit rewrites the snapshot through a temp file and rename,
//! so a crash leaves either the old or the new snapshot, never a torn
//! one. The LOCK file keeps a second process from opening the same
//! store directory.
//!
//! Commit cost scales with the total store size, not the write size:
//! each flush serializes every namespace. That stays cheap while the
//! snapshot fits comfortably in memory; very large stores want a
//! log-structured backend behind the same trait instead.

use crate::error::{StoreError, StoreResult};
use crate::store::{KeyCursor, KeyValueStore, Namespace};
use fs2::FileExt;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const SNAPSHOT_FILE: &str = "SNAPSHOT";
const SNAPSHOT_TEMP: &str = "SNAPSHOT.tmp";

type NamespaceMap = BTreeMap<String, BTreeMap<String, String>>;

/// A persistent namespaced store backed by a locked directory.
///
/// Data lives in memory and is written out as a full CBOR snapshot on
/// every commit. This favors simple, atomic durability over write
/// throughput; bulk loaders batch their writes through `put_all`, so
/// snapshot frequency is bounded by the caller's batch size.
///
/// # Thread Safety
///
/// Interior locking makes the store shareable across threads behind
/// an `Arc`. Cross-process access is excluded by the LOCK file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: RwLock<NamespaceMap>,
    sync_on_commit: bool,
    /// Held for the lifetime of the store.
    _lock_file: File,
}

impl FileStore {
    /// Opens or creates a store directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Another process holds the lock (`StoreError::Locked`)
    /// - The snapshot exists but cannot be decoded (`Corrupted`)
    /// - I/O errors occur
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::open_with_sync(path, true)
    }

    /// Opens a store, choosing whether commits fsync the snapshot.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`FileStore::open`].
    pub fn open_with_sync(path: &Path, sync_on_commit: bool) -> StoreResult<Self> {
        fs::create_dir_all(path)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path.join(LOCK_FILE))?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;

        let snapshot_path = path.join(SNAPSHOT_FILE);
        let data = if snapshot_path.exists() {
            let reader = BufReader::new(File::open(&snapshot_path)?);
            ciborium::from_reader(reader)
                .map_err(|e| StoreError::corrupted(format!("snapshot decode failed: {e}")))?
        } else {
            NamespaceMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            data: RwLock::new(data),
            sync_on_commit,
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current state through a temp file and rename.
    fn persist(&self, data: &NamespaceMap) -> StoreResult<()> {
        let temp_path = self.path.join(SNAPSHOT_TEMP);
        let file = File::create(&temp_path)?;
        ciborium::into_writer(data, &file)
            .map_err(|e| StoreError::corrupted(format!("snapshot encode failed: {e}")))?;
        if self.sync_on_commit {
            file.sync_all()?;
        }
        drop(file);
        fs::rename(&temp_path, self.path.join(SNAPSHOT_FILE))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, ns: &Namespace, key: &str) -> StoreResult<Option<String>> {
        let data = self.data.read();
        Ok(data.get(ns.as_str()).and_then(|m| m.get(key).cloned()))
    }

    fn put(&self, ns: &Namespace, key: &str, value: &str) -> StoreResult<()> {
        let mut data = self.data.write();
        data.entry(ns.as_str().to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.persist(&data)
    }

    fn put_all(&self, ns: &Namespace, entries: &[(String, String)]) -> StoreResult<()> {
        let mut data = self.data.write();
        let map = data.entry(ns.as_str().to_string()).or_default();
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        self.persist(&data)
    }

    fn remove(&self, ns: &Namespace, key: &str) -> StoreResult<()> {
        let mut data = self.data.write();
        let removed = data
            .get_mut(ns.as_str())
            .is_some_and(|m| m.remove(key).is_some());
        if removed {
            self.persist(&data)?;
        }
        Ok(())
    }

    fn contains(&self, ns: &Namespace, key: &str) -> StoreResult<bool> {
        let data = self.data.read();
        Ok(data.get(ns.as_str()).is_some_and(|m| m.contains_key(key)))
    }

    fn truncate(&self, ns: &Namespace) -> StoreResult<()> {
        let mut data = self.data.write();
        if data.remove(ns.as_str()).is_some() {
            self.persist(&data)?;
        }
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

struct SnapshotCursor {
    entries: std::vec::IntoIter<(String, String)>,
}

impl KeyCursor for SnapshotCursor {
    fn next_entry(&mut self) -> StoreResult<Option<(String, String)>> {
        Ok(self.entries.next())
    }
}
