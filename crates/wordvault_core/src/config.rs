//! Engine configuration.

use crate::batch::BatchTuning;
use std::path::PathBuf;
use std::time::Duration;

/// Storage layout of a word list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Containment list: keys are words or word chunks, values empty.
    /// Supports substring-containment queries.
    Containment,
    /// Sampled list: keys are sequential indices, values are words.
    /// Supports random sampling by index.
    SampledIndex,
}

impl ListKind {
    /// Short tag used in the version fingerprint.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Containment => "containment",
            Self::SampledIndex => "sampled",
        }
    }
}

/// Configuration for one logical word list.
///
/// Immutable once the facade is opened. The fields that change the
/// stored representation (`case_sensitive`, `chunk_size`, `list_kind`)
/// are folded into the metadata version string, so changing any of
/// them invalidates previously ingested data.
#[derive(Debug, Clone)]
pub struct WordlistConfig {
    /// Path to the source container (plain, `.lz4`, `.tar`, `.tar.lz4`).
    /// `None` leaves the store inert.
    pub source: Option<PathBuf>,

    /// Throttle knob; average ingest throughput is inversely
    /// proportional to this factor. 0 disables throttling.
    pub load_factor: u32,

    /// Whether words keep their case. When false, lines are folded to
    /// lowercase during ingestion and queries.
    pub case_sensitive: bool,

    /// Minimum substring length for containment checks.
    /// 0 means whole-word matching only.
    pub chunk_size: usize,

    /// Lines longer than this are truncated before storage.
    pub max_word_length: usize,

    /// Adaptive batch sizing bounds and latency target.
    pub batch: BatchTuning,

    /// Storage layout for this list.
    pub list_kind: ListKind,
}

impl Default for WordlistConfig {
    fn default() -> Self {
        Self {
            source: None,
            load_factor: 0,
            case_sensitive: false,
            chunk_size: 0,
            max_word_length: 256,
            batch: BatchTuning::default(),
            list_kind: ListKind::Containment,
        }
    }
}

impl WordlistConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source container path.
    #[must_use]
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Sets the throttle load factor.
    #[must_use]
    pub const fn load_factor(mut self, value: u32) -> Self {
        self.load_factor = value;
        self
    }

    /// Sets case sensitivity.
    #[must_use]
    pub const fn case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = value;
        self
    }

    /// Sets the containment chunk size (0 = whole word).
    #[must_use]
    pub const fn chunk_size(mut self, value: usize) -> Self {
        self.chunk_size = value;
        self
    }

    /// Sets the maximum stored word length.
    #[must_use]
    pub const fn max_word_length(mut self, value: usize) -> Self {
        self.max_word_length = value;
        self
    }

    /// Sets the batch tuning parameters.
    #[must_use]
    pub const fn batch(mut self, tuning: BatchTuning) -> Self {
        self.batch = tuning;
        self
    }

    /// Sets the storage layout.
    #[must_use]
    pub const fn list_kind(mut self, kind: ListKind) -> Self {
        self.list_kind = kind;
        self
    }
}

/// Configuration for the history store.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Entries older than this are expired.
    pub max_age: Duration,

    /// Number of digest iterations applied to each salted word.
    /// Fixed per deployment; folded into the version string, so
    /// changing it invalidates all stored hashes.
    pub hash_loops: u32,

    /// Throttle factor for the background sweep; 0 disables yielding.
    pub load_factor: u32,
}

/// Lower bound on the sweep interval.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Upper bound on the sweep interval.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(90 * 24 * 60 * 60),
            hash_loops: 10_000,
            load_factor: 1,
        }
    }
}

impl HistoryConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum entry age.
    #[must_use]
    pub const fn max_age(mut self, value: Duration) -> Self {
        self.max_age = value;
        self
    }

    /// Sets the hash iteration count.
    #[must_use]
    pub const fn hash_loops(mut self, value: u32) -> Self {
        self.hash_loops = value;
        self
    }

    /// Sets the sweep throttle factor.
    #[must_use]
    pub const fn load_factor(mut self, value: u32) -> Self {
        self.load_factor = value;
        self
    }

    /// Sweep interval: proportional to `max_age`, clamped between one
    /// hour and one day.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        (self.max_age / 10).clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL)
    }
}
