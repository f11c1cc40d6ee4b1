//! Word-list facade: lifecycle, validation gate, query API.

use crate::checksum::SourceChecksum;
use crate::config::WordlistConfig;
use crate::error::CoreResult;
use crate::ingest::IngestionEngine;
use crate::meta::{self, MetaRecord, Validation};
use crate::normalize::normalize_line;
use crate::progress::PopulationProgress;
use crate::query;
use crate::state::{HealthRecord, HealthSeverity, StateCell, StoreState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use wordvault_store::{KeyValueStore, Namespace};

/// Queries slower than this are logged (observability, not an error).
const QUERY_WARN_LATENCY: Duration = Duration::from_millis(100);

/// How long `close` waits for an active population run to stop.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(60);

/// Poll interval for the bounded close wait.
const CLOSE_POLL: Duration = Duration::from_millis(250);

/// Lifecycle and query facade over one logical word list.
///
/// Construction is cheap; [`WordStore::open`] does the work and may
/// block for a full ingestion run, so callers invoke it from a
/// background worker ([`WordStore::spawn_open`]) rather than a serving
/// thread. Queries are safe at any time: before the store is `OPEN`
/// they simply return "not found", and `len` reports 0 until a load
/// completes.
pub struct WordStore {
    name: String,
    store: Arc<dyn KeyValueStore>,
    config: WordlistConfig,
    words_ns: Namespace,
    meta_ns: Namespace,
    state: StateCell,
    size: AtomicU64,
    pause: Arc<AtomicBool>,
    progress: Arc<PopulationProgress>,
    close_reason: Mutex<Option<String>>,
}

impl WordStore {
    /// Creates an unopened facade for the named word list.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        config: WordlistConfig,
    ) -> Self {
        let name = name.into();
        Self {
            words_ns: Namespace::new(format!("words:{name}")),
            meta_ns: Namespace::new(format!("meta:{name}")),
            name,
            store,
            config,
            state: StateCell::new(),
            size: AtomicU64::new(0),
            pause: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(PopulationProgress::new()),
            close_reason: Mutex::new(None),
        }
    }

    /// Opens the store: validates existing data, reingests if needed.
    ///
    /// Runs synchronously and may take minutes to hours for a large
    /// source; call from a background worker. An unusable
    /// configuration (no source, missing source file) closes the
    /// store quietly rather than erroring - the owner observes the
    /// CLOSED state through [`WordStore::health`].
    ///
    /// # Errors
    ///
    /// Returns the underlying error after transitioning to CLOSED
    /// when validation or ingestion fails with a store or I/O error.
    pub fn open(&self) -> CoreResult<()> {
        if !self.state.transition(StoreState::New, StoreState::Opening) {
            debug!(list = %self.name, state = %self.state.get(), "open ignored");
            return Ok(());
        }

        let Some(source) = self.config.source.clone() else {
            self.close_with("no source configured");
            return Ok(());
        };
        if !source.exists() {
            self.close_with(format!("source not found: {}", source.display()));
            return Ok(());
        }

        match self.validate_and_populate(&source) {
            Ok(()) => {
                if self.pause.load(Ordering::Acquire) {
                    // close() raced the open; leave the state to it.
                    return Ok(());
                }
                let size = MetaRecord::load(self.store.as_ref(), &self.meta_ns)?
                    .map_or(0, |m| m.size);
                self.size.store(size, Ordering::Release);
                if self.state.transition(StoreState::Opening, StoreState::Open) {
                    info!(list = %self.name, size, "word store open");
                }
                Ok(())
            }
            Err(e) => {
                self.close_with(format!("open failed: {e}"));
                Err(e)
            }
        }
    }

    /// Submits `open` to a new worker thread, returning its handle.
    pub fn spawn_open(self: &Arc<Self>) -> thread::JoinHandle<CoreResult<()>> {
        let this = Arc::clone(self);
        thread::spawn(move || this.open())
    }

    /// Checksum/version/status gate, then ingestion when required.
    fn validate_and_populate(&self, source: &std::path::Path) -> CoreResult<()> {
        let current = SourceChecksum::compute(source, self.config.case_sensitive)?;

        let stored = MetaRecord::load(self.store.as_ref(), &self.meta_ns)?;
        match meta::validate(stored.as_ref(), &self.config, &current) {
            Validation::Trusted => {
                debug!(list = %self.name, "stored data trusted, no ingestion needed");
                return Ok(());
            }
            Validation::MustReset { reason } => {
                // A resumable run keeps its data and bookmark; anything
                // else is wiped before reingesting.
                let resumable = stored.as_ref().is_some_and(|m| {
                    m.status == crate::meta::IngestStatus::InProgress
                        && m.version == meta::version_string(&self.config)
                        && m.checksum.as_ref() == Some(&current)
                });
                if resumable {
                    info!(list = %self.name, "resuming interrupted population");
                } else {
                    info!(list = %self.name, reason, "stored data rejected, reingesting");
                    self.store.truncate(&self.words_ns)?;
                    self.store.truncate(&self.meta_ns)?;
                    MetaRecord::dirty(&self.config, Some(current.clone()))
                        .save(self.store.as_ref(), &self.meta_ns)?;
                }
            }
        }

        let mut engine = IngestionEngine::new(
            Arc::clone(&self.store),
            self.config.clone(),
            self.words_ns.clone(),
            self.meta_ns.clone(),
            Arc::clone(&self.pause),
            Arc::clone(&self.progress),
        )?;
        engine.init()?;
        engine.populate()
    }

    /// Whether any qualifying substring of `word` is in the list.
    ///
    /// Fail-safe: returns false when the store is not open, the input
    /// normalizes to nothing, or the store errors mid-query (logged).
    #[must_use]
    pub fn contains_word(&self, word: &str) -> bool {
        if self.state.get() != StoreState::Open {
            return false;
        }
        let Some(normalized) = normalize_line(
            word,
            self.config.case_sensitive,
            self.config.max_word_length,
        ) else {
            return false;
        };

        let started = Instant::now();
        let result = query::contains(
            self.store.as_ref(),
            &self.words_ns,
            &normalized,
            self.config.chunk_size,
        );
        let elapsed = started.elapsed();
        if elapsed > QUERY_WARN_LATENCY {
            warn!(list = %self.name, ?elapsed, "slow containment query");
        }

        match result {
            Ok(found) => found,
            Err(e) => {
                warn!(list = %self.name, error = %e, "query failed, treating as not found");
                false
            }
        }
    }

    /// Stored word count; 0 unless the store is open and the list is
    /// completely loaded.
    #[must_use]
    pub fn len(&self) -> u64 {
        if self.state.get() == StoreState::Open {
            self.size.load(Ordering::Acquire)
        } else {
            0
        }
    }

    /// Whether the open store holds no words.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> StoreState {
        self.state.get()
    }

    /// Progress line while the store is opening.
    #[must_use]
    pub fn progress_line(&self) -> Option<String> {
        (self.state.get() == StoreState::Opening).then(|| self.progress.summary())
    }

    /// Structured health report.
    #[must_use]
    pub fn health(&self) -> HealthRecord {
        match self.state.get() {
            StoreState::Open => HealthRecord::new(
                HealthSeverity::Ok,
                format!("open, {} words", self.size.load(Ordering::Acquire)),
            ),
            StoreState::New => {
                HealthRecord::new(HealthSeverity::Caution, "word store not yet opened")
            }
            StoreState::Opening => HealthRecord::new(
                HealthSeverity::Caution,
                format!("word store opening: {}", self.progress.summary()),
            ),
            StoreState::Closed => {
                let reason = self
                    .close_reason
                    .lock()
                    .clone()
                    .unwrap_or_else(|| "word store closed".to_string());
                HealthRecord::new(HealthSeverity::Warn, reason)
            }
        }
    }

    /// Shuts the store down.
    ///
    /// Pauses any active population run and poll-waits (bounded) for
    /// the worker to stop; after the timeout the store closes anyway
    /// and the lingering worker is logged. Idempotent.
    pub fn close(&self) {
        if self.state.get() == StoreState::Closed {
            return;
        }
        self.pause.store(true, Ordering::Release);

        let deadline = Instant::now() + CLOSE_TIMEOUT;
        while self.progress.is_running() {
            if Instant::now() >= deadline {
                warn!(
                    list = %self.name,
                    "population worker did not stop within {CLOSE_TIMEOUT:?}, closing anyway"
                );
                break;
            }
            thread::sleep(CLOSE_POLL);
        }

        self.state.close();
        info!(list = %self.name, "word store closed");
    }

    /// Closes with a recorded diagnostic.
    fn close_with(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(list = %self.name, reason, "closing word store");
        *self.close_reason.lock() = Some(reason);
        self.state.close();
    }
}

impl std::fmt::Debug for WordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordStore")
            .field("name", &self.name)
            .field("state", &self.state.get())
            .field("size", &self.size.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Drop for WordStore {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchTuning;
    use crate::meta::IngestStatus;
    use std::path::PathBuf;
    use tempfile::tempdir;
    use wordvault_store::InMemoryStore;

    fn write_source(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("words.txt");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn open_store(config: WordlistConfig) -> (Arc<WordStore>, Arc<InMemoryStore>) {
        let backing = Arc::new(InMemoryStore::new());
        let store = Arc::new(WordStore::new(
            "default",
            Arc::clone(&backing) as Arc<dyn KeyValueStore>,
            config,
        ));
        store.open().unwrap();
        (store, backing)
    }

    #[test]
    fn example_scenario() {
        let temp = tempdir().unwrap();
        let source = write_source(&temp, "apple\nbanana\n!#comment:skip\n\n");
        let (store, _) = open_store(WordlistConfig::new().source(source));

        assert_eq!(store.status(), StoreState::Open);
        assert_eq!(store.len(), 2);
        assert!(store.contains_word("APPLE"));
        assert!(!store.contains_word("grape"));
    }

    #[test]
    fn no_source_closes_quietly() {
        let (store, _) = open_store(WordlistConfig::new());
        assert_eq!(store.status(), StoreState::Closed);
        assert_eq!(store.health().severity, HealthSeverity::Warn);
    }

    #[test]
    fn missing_source_closes_quietly() {
        let (store, _) = open_store(WordlistConfig::new().source("/nonexistent/words.txt"));
        assert_eq!(store.status(), StoreState::Closed);
        assert!(!store.contains_word("anything"));
    }

    #[test]
    fn queries_before_open_return_false() {
        let backing: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let store = WordStore::new("default", backing, WordlistConfig::new());
        assert!(!store.contains_word("apple"));
        assert_eq!(store.len(), 0);
        assert_eq!(store.status(), StoreState::New);
    }

    #[test]
    fn blank_query_is_false() {
        let temp = tempdir().unwrap();
        let source = write_source(&temp, "apple\n");
        let (store, _) = open_store(WordlistConfig::new().source(source));
        assert!(!store.contains_word("   "));
        assert!(!store.contains_word(""));
    }

    #[test]
    fn chunked_containment_through_the_facade() {
        let temp = tempdir().unwrap();
        let source = write_source(&temp, "pass\n");
        let (store, _) = open_store(WordlistConfig::new().source(source).chunk_size(4));

        assert!(store.contains_word("password"));
        assert!(store.contains_word("pass"));
        assert!(!store.contains_word("abcd"));
    }

    #[test]
    fn second_open_with_same_source_skips_ingestion() {
        let temp = tempdir().unwrap();
        let source = write_source(&temp, "apple\nbanana\n");
        let backing = Arc::new(InMemoryStore::new());

        let first = WordStore::new(
            "default",
            Arc::clone(&backing) as Arc<dyn KeyValueStore>,
            WordlistConfig::new().source(&source),
        );
        first.open().unwrap();
        first.close();

        let second = WordStore::new(
            "default",
            Arc::clone(&backing) as Arc<dyn KeyValueStore>,
            WordlistConfig::new().source(&source),
        );
        second.open().unwrap();
        assert_eq!(second.status(), StoreState::Open);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn changed_source_forces_reingest() {
        let temp = tempdir().unwrap();
        let source = write_source(&temp, "apple\nbanana\n");
        let backing = Arc::new(InMemoryStore::new());

        {
            let store = WordStore::new(
                "default",
                Arc::clone(&backing) as Arc<dyn KeyValueStore>,
                WordlistConfig::new().source(&source),
            );
            store.open().unwrap();
            assert!(store.contains_word("apple"));
        }

        // Same path, different content.
        std::fs::write(&source, "cherry\ndate\n").unwrap();
        let store = WordStore::new(
            "default",
            Arc::clone(&backing) as Arc<dyn KeyValueStore>,
            WordlistConfig::new().source(&source),
        );
        store.open().unwrap();

        assert!(store.contains_word("cherry"));
        assert!(!store.contains_word("apple"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn config_change_forces_reingest() {
        let temp = tempdir().unwrap();
        let source = write_source(&temp, "password\n");
        let backing = Arc::new(InMemoryStore::new());

        {
            let store = WordStore::new(
                "default",
                Arc::clone(&backing) as Arc<dyn KeyValueStore>,
                WordlistConfig::new().source(&source),
            );
            store.open().unwrap();
            assert!(store.contains_word("password"));
        }

        let store = WordStore::new(
            "default",
            Arc::clone(&backing) as Arc<dyn KeyValueStore>,
            WordlistConfig::new().source(&source).chunk_size(4),
        );
        store.open().unwrap();

        // Reingested in chunked form.
        assert!(store.contains_word("mypassword"));
    }

    #[test]
    fn close_is_idempotent() {
        let temp = tempdir().unwrap();
        let source = write_source(&temp, "apple\n");
        let (store, _) = open_store(WordlistConfig::new().source(source));
        store.close();
        store.close();
        assert_eq!(store.status(), StoreState::Closed);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn spawn_open_runs_on_a_worker() {
        let temp = tempdir().unwrap();
        let source = write_source(&temp, "apple\nbanana\n");
        let backing: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let store = Arc::new(WordStore::new(
            "default",
            backing,
            WordlistConfig::new().source(source),
        ));

        let handle = store.spawn_open();
        handle.join().unwrap().unwrap();
        assert_eq!(store.status(), StoreState::Open);
        assert!(store.contains_word("banana"));
    }

    #[test]
    fn close_during_population_pauses_and_resumes() {
        let temp = tempdir().unwrap();
        let lines: String = (0..500).map(|i| format!("w{i}\n")).collect();
        let source = write_source(&temp, &lines);

        // Roughly 20ms per line keeps the run alive well past the
        // close below; small batches guarantee a bookmark commit
        // before it lands.
        let backing = Arc::new(InMemoryStore::new());
        let store = Arc::new(WordStore::new(
            "default",
            Arc::clone(&backing) as Arc<dyn KeyValueStore>,
            WordlistConfig::new()
                .source(&source)
                .load_factor(2_000)
                .batch(BatchTuning {
                    min: 10,
                    max: 100,
                    target_latency: Duration::from_millis(100),
                }),
        ));

        let worker = store.spawn_open();
        thread::sleep(Duration::from_millis(300));
        store.close();
        worker.join().unwrap().unwrap();
        assert_eq!(store.status(), StoreState::Closed);

        // The interrupted run left its bookmark mid-source.
        let meta = MetaRecord::load(backing.as_ref(), &Namespace::new("meta:default"))
            .unwrap()
            .unwrap();
        assert_eq!(meta.status, IngestStatus::InProgress);
        assert!(meta.last_line > 0, "no bookmark committed before close");
        assert!(meta.last_line < 500, "run finished before close landed");

        // A fresh store over the same backing resumes and completes.
        let reopened = WordStore::new(
            "default",
            Arc::clone(&backing) as Arc<dyn KeyValueStore>,
            WordlistConfig::new().source(&source),
        );
        reopened.open().unwrap();
        assert_eq!(reopened.status(), StoreState::Open);
        assert_eq!(reopened.len(), 500);
        assert!(reopened.contains_word("w499"));
    }

    #[test]
    fn health_reflects_lifecycle() {
        let temp = tempdir().unwrap();
        let source = write_source(&temp, "apple\n");
        let backing: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let store = WordStore::new("default", backing, WordlistConfig::new().source(source));

        assert_eq!(store.health().severity, HealthSeverity::Caution);
        store.open().unwrap();
        assert_eq!(store.health().severity, HealthSeverity::Ok);
        store.close();
        assert_eq!(store.health().severity, HealthSeverity::Warn);
    }
}
