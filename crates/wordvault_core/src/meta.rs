//! Word-list metadata records and the trust gate.

use crate::checksum::SourceChecksum;
use crate::config::WordlistConfig;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use wordvault_store::{KeyValueStore, Namespace};

/// Schema version constant; bump when the stored layout changes.
const SCHEMA_VERSION: &str = "wordvault-1";

/// Key under which the meta record lives in its namespace.
pub const META_KEY: &str = "meta";

/// Ingestion status of a word list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestStatus {
    /// Data is stale or was reset; a full reingest is required.
    Dirty,
    /// A load is running or was interrupted; resumable.
    InProgress,
    /// Fully loaded and trusted.
    Complete,
}

/// Metadata for one logical word list.
///
/// Created and mutated by the ingestion engine during a run; the
/// facade only reads it, apart from resetting it to `Dirty` before a
/// reingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaRecord {
    /// Ingestion status.
    pub status: IngestStatus,
    /// Schema constant plus configuration fingerprint.
    pub version: String,
    /// Checksum of the source the data came from.
    pub checksum: Option<SourceChecksum>,
    /// Resume bookmark: count of source lines durably committed.
    pub last_line: u64,
    /// Next sampled-list index to assign; advances with the bookmark
    /// so a replayed tail overwrites its own indices instead of
    /// appending duplicates. Always 0 for containment lists.
    ///
    /// Defaults to 0 when absent so records written before this field
    /// existed still decode.
    #[serde(default)]
    pub next_index: u64,
    /// Accumulated ingestion time across runs, in seconds.
    pub elapsed_seconds: u64,
    /// Stored word count; authoritative only when status is Complete.
    pub size: u64,
}

impl MetaRecord {
    /// Creates a fresh dirty record for the given configuration.
    #[must_use]
    pub fn dirty(config: &WordlistConfig, checksum: Option<SourceChecksum>) -> Self {
        Self {
            status: IngestStatus::Dirty,
            version: version_string(config),
            checksum,
            last_line: 0,
            next_index: 0,
            elapsed_seconds: 0,
            size: 0,
        }
    }

    /// Loads the record from the metadata namespace, if present.
    ///
    /// # Errors
    ///
    /// Returns a store error, or [`CoreError::InvalidMeta`] if the
    /// stored value cannot be decoded.
    pub fn load(store: &dyn KeyValueStore, ns: &Namespace) -> CoreResult<Option<Self>> {
        match store.get(ns, META_KEY)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| CoreError::invalid_meta(format!("meta decode failed: {e}"))),
            None => Ok(None),
        }
    }

    /// Persists the record to the metadata namespace.
    ///
    /// # Errors
    ///
    /// Returns a store error if the commit fails.
    pub fn save(&self, store: &dyn KeyValueStore, ns: &Namespace) -> CoreResult<()> {
        let raw = serde_json::to_string(self)
            .map_err(|e| CoreError::invalid_meta(format!("meta encode failed: {e}")))?;
        store.put(ns, META_KEY, &raw)?;
        Ok(())
    }
}

/// Builds the version string for a configuration.
///
/// Any configuration change that alters the stored representation
/// shows up here and forces a mismatch against older data.
#[must_use]
pub fn version_string(config: &WordlistConfig) -> String {
    format!(
        "{SCHEMA_VERSION}/chunk={},case={},kind={}",
        config.chunk_size,
        config.case_sensitive,
        config.list_kind.tag()
    )
}

/// Outcome of validating stored metadata against the current source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Stored data matches the current source and schema.
    Trusted,
    /// Stored data must be truncated and reingested.
    MustReset {
        /// Why the data was rejected.
        reason: String,
    },
}

/// Applies the trust gate: stored data is usable only if it completed,
/// was written by the current schema/configuration, and came from the
/// current source bytes.
#[must_use]
pub fn validate(
    meta: Option<&MetaRecord>,
    config: &WordlistConfig,
    current: &SourceChecksum,
) -> Validation {
    let Some(meta) = meta else {
        return Validation::MustReset {
            reason: "no stored metadata".to_string(),
        };
    };

    if meta.status != IngestStatus::Complete {
        return Validation::MustReset {
            reason: format!("stored status is {:?}", meta.status),
        };
    }

    let version = version_string(config);
    if meta.version != version {
        return Validation::MustReset {
            reason: format!("version mismatch: stored {}, current {version}", meta.version),
        };
    }

    match &meta.checksum {
        Some(stored) if stored == current => Validation::Trusted,
        Some(_) => Validation::MustReset {
            reason: "source checksum mismatch".to_string(),
        },
        None => Validation::MustReset {
            reason: "no stored checksum".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wordvault_store::InMemoryStore;

    fn checksum() -> SourceChecksum {
        SourceChecksum {
            digest: "abc123".to_string(),
            length: 42,
            case_sensitive: false,
        }
    }

    fn complete_meta(config: &WordlistConfig) -> MetaRecord {
        MetaRecord {
            status: IngestStatus::Complete,
            version: version_string(config),
            checksum: Some(checksum()),
            last_line: 100,
            next_index: 0,
            elapsed_seconds: 7,
            size: 95,
        }
    }

    #[test]
    fn save_and_load_roundtrip() {
        let store = Arc::new(InMemoryStore::new());
        let ns = Namespace::new("meta:default");
        let config = WordlistConfig::default();
        let meta = complete_meta(&config);

        meta.save(store.as_ref(), &ns).unwrap();
        let loaded = MetaRecord::load(store.as_ref(), &ns).unwrap().unwrap();
        assert_eq!(loaded.status, IngestStatus::Complete);
        assert_eq!(loaded.last_line, 100);
        assert_eq!(loaded.size, 95);
        assert_eq!(loaded.checksum, Some(checksum()));
    }

    #[test]
    fn load_missing_returns_none() {
        let store = InMemoryStore::new();
        let ns = Namespace::new("meta:default");
        assert!(MetaRecord::load(&store, &ns).unwrap().is_none());
    }

    #[test]
    fn load_garbage_is_invalid_meta() {
        let store = InMemoryStore::new();
        let ns = Namespace::new("meta:default");
        store.put(&ns, META_KEY, "not json").unwrap();
        let result = MetaRecord::load(&store, &ns);
        assert!(matches!(result, Err(CoreError::InvalidMeta { .. })));
    }

    #[test]
    fn complete_matching_meta_is_trusted() {
        let config = WordlistConfig::default();
        let meta = complete_meta(&config);
        assert_eq!(
            validate(Some(&meta), &config, &checksum()),
            Validation::Trusted
        );
    }

    #[test]
    fn missing_meta_must_reset() {
        let config = WordlistConfig::default();
        assert!(matches!(
            validate(None, &config, &checksum()),
            Validation::MustReset { .. }
        ));
    }

    #[test]
    fn in_progress_meta_must_reset() {
        let config = WordlistConfig::default();
        let mut meta = complete_meta(&config);
        meta.status = IngestStatus::InProgress;
        assert!(matches!(
            validate(Some(&meta), &config, &checksum()),
            Validation::MustReset { .. }
        ));
    }

    #[test]
    fn version_change_must_reset() {
        let config = WordlistConfig::default();
        let meta = complete_meta(&config);

        // Same stored record, evaluated under a different chunk size.
        let reconfigured = WordlistConfig::default().chunk_size(4);
        assert!(matches!(
            validate(Some(&meta), &reconfigured, &checksum()),
            Validation::MustReset { .. }
        ));
    }

    #[test]
    fn checksum_change_must_reset() {
        let config = WordlistConfig::default();
        let meta = complete_meta(&config);
        let changed = SourceChecksum {
            digest: "different".to_string(),
            length: 42,
            case_sensitive: false,
        };
        assert!(matches!(
            validate(Some(&meta), &config, &changed),
            Validation::MustReset { .. }
        ));
    }
}
