//! Salted hashed history with time-to-live expiry.

use crate::checksum;
use crate::clock::{Clock, SystemClock};
use crate::config::HistoryConfig;
use crate::error::CoreResult;
use crate::throttle::Throttle;
use parking_lot::{Condvar, Mutex};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use wordvault_store::{KeyValueStore, Namespace};

/// Schema version constant for the history layout.
const SCHEMA_VERSION: &str = "history-1";

/// Metadata key holding the schema/config fingerprint.
const VERSION_KEY: &str = "version";

/// Metadata key holding the persisted salt.
const SALT_KEY: &str = "salt";

/// Metadata key holding the oldest surviving entry timestamp.
const OLDEST_KEY: &str = "oldest";

/// Sentinel for "no known oldest entry".
const NO_OLDEST: i64 = i64::MAX;

/// Records words as salted iterative hashes with a millisecond
/// timestamp, and answers "was this word seen within the window".
///
/// Plaintext never reaches the backing store. Expiry is enforced at
/// query time; a background sweeper reclaims the space later, so a
/// stale entry can linger on disk but is never reported as present.
pub struct HistoryStore {
    name: String,
    store: Arc<dyn KeyValueStore>,
    config: HistoryConfig,
    entries_ns: Namespace,
    meta_ns: Namespace,
    salt: String,
    clock: Arc<dyn Clock>,
    closed: AtomicBool,
    /// Timestamp of the oldest entry believed present, or [`NO_OLDEST`].
    /// Lets the sweeper skip a full scan when nothing can have expired.
    oldest: AtomicI64,
    sweep_gate: Mutex<bool>,
    sweep_signal: Condvar,
}

impl HistoryStore {
    /// Opens the named history, validating the stored layout.
    ///
    /// A version mismatch (schema change or a different `hash_loops`)
    /// truncates the stored entries, as does a missing salt: hashes
    /// written under other parameters can never match again.
    ///
    /// # Errors
    ///
    /// Returns a store error if reading or writing metadata fails.
    pub fn open(
        name: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        config: HistoryConfig,
    ) -> CoreResult<Self> {
        Self::open_with_clock(name, store, config, Arc::new(SystemClock))
    }

    /// Opens with an explicit clock; tests drive expiry deterministically.
    ///
    /// # Errors
    ///
    /// Returns a store error if reading or writing metadata fails.
    pub fn open_with_clock(
        name: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        config: HistoryConfig,
        clock: Arc<dyn Clock>,
    ) -> CoreResult<Self> {
        let name = name.into();
        let entries_ns = Namespace::new(format!("history:{name}"));
        let meta_ns = Namespace::new(format!("history-meta:{name}"));

        let version = format!("{SCHEMA_VERSION}/loops={}", config.hash_loops.max(1));
        match store.get(&meta_ns, VERSION_KEY)? {
            Some(stored) if stored == version => {}
            stored => {
                if let Some(stored) = stored {
                    info!(history = %name, stored, current = version,
                        "history version mismatch, truncating");
                } else {
                    debug!(history = %name, "initializing history metadata");
                }
                store.truncate(&entries_ns)?;
                store.truncate(&meta_ns)?;
                store.put(&meta_ns, VERSION_KEY, &version)?;
            }
        }

        let salt = match store.get(&meta_ns, SALT_KEY)? {
            Some(salt) => salt,
            None => {
                // Entries hashed under a lost salt are dead weight.
                store.truncate(&entries_ns)?;
                let mut bytes = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut bytes);
                let salt = checksum::hex(&bytes);
                store.put(&meta_ns, SALT_KEY, &salt)?;
                info!(history = %name, "generated new history salt");
                salt
            }
        };

        let oldest = store
            .get(&meta_ns, OLDEST_KEY)?
            .and_then(|raw| raw.parse::<i64>().ok())
            .unwrap_or(NO_OLDEST);

        Ok(Self {
            name,
            store,
            config,
            entries_ns,
            meta_ns,
            salt,
            clock,
            closed: AtomicBool::new(false),
            oldest: AtomicI64::new(oldest),
            sweep_gate: Mutex::new(false),
            sweep_signal: Condvar::new(),
        })
    }

    /// Records a word as seen now. Upserts: a repeat sighting refreshes
    /// the timestamp. Blank input and a closed store are no-ops.
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails.
    pub fn add_word(&self, word: &str) -> CoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }
        let Some(key) = self.hash_word(word) else {
            return Ok(());
        };
        let now = self.clock.now_millis();
        self.store.put(&self.entries_ns, &key, &now.to_string())?;
        self.oldest.fetch_min(now, Ordering::AcqRel);
        Ok(())
    }

    /// Whether the word was recorded within the retention window.
    ///
    /// An entry past its age is reported absent even if the sweeper
    /// has not reclaimed it yet.
    #[must_use]
    pub fn contains_word(&self, word: &str) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        let Some(key) = self.hash_word(word) else {
            return false;
        };
        match self.store.get(&self.entries_ns, &key) {
            Ok(Some(raw)) => match raw.parse::<i64>() {
                Ok(ts) => self.age_of(ts) < self.max_age_millis(),
                Err(_) => false,
            },
            Ok(None) => false,
            Err(e) => {
                warn!(history = %self.name, error = %e, "history lookup failed");
                false
            }
        }
    }

    /// Stored entry count, including entries awaiting sweep.
    ///
    /// # Errors
    ///
    /// Returns a store error if the count fails.
    pub fn len(&self) -> CoreResult<u64> {
        Ok(self.store.len(&self.entries_ns)?)
    }

    /// Whether the history holds no entries.
    ///
    /// # Errors
    ///
    /// Returns a store error if the count fails.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Age of the oldest entry believed present, if any.
    #[must_use]
    pub fn oldest_entry_age(&self) -> Option<Duration> {
        let oldest = self.oldest.load(Ordering::Acquire);
        if oldest == NO_OLDEST {
            return None;
        }
        u64::try_from(self.age_of(oldest))
            .ok()
            .map(Duration::from_millis)
    }

    /// Removes expired entries; returns how many were reclaimed.
    ///
    /// Skips the scan entirely while the oldest known entry is still
    /// inside the window. A full pass refreshes the persisted oldest
    /// timestamp; an interrupted pass (store closing) leaves it alone.
    ///
    /// # Errors
    ///
    /// Returns a store error if iteration or deletion fails.
    pub fn sweep(&self) -> CoreResult<u64> {
        let max_age = self.max_age_millis();
        let oldest = self.oldest.load(Ordering::Acquire);
        if oldest != NO_OLDEST && self.age_of(oldest) < max_age {
            debug!(history = %self.name, "sweep skipped, nothing can have expired");
            return Ok(0);
        }

        let mut throttle = Throttle::new(self.config.load_factor);
        let mut removed = 0u64;
        let mut surviving_oldest = NO_OLDEST;

        let mut cursor = self.store.iter(&self.entries_ns)?;
        while let Some((key, raw)) = cursor.next_entry()? {
            if self.closed.load(Ordering::Acquire) {
                debug!(history = %self.name, removed, "sweep interrupted by close");
                return Ok(removed);
            }
            throttle.sleep();

            // Unparseable timestamps are treated as expired.
            let expired = raw.parse::<i64>().map_or(true, |ts| {
                if self.age_of(ts) >= max_age {
                    true
                } else {
                    surviving_oldest = surviving_oldest.min(ts);
                    false
                }
            });
            if expired {
                self.store.remove(&self.entries_ns, &key)?;
                removed += 1;
            }
        }

        self.oldest.store(surviving_oldest, Ordering::Release);
        if surviving_oldest == NO_OLDEST {
            self.store.remove(&self.meta_ns, OLDEST_KEY)?;
        } else {
            self.store
                .put(&self.meta_ns, OLDEST_KEY, &surviving_oldest.to_string())?;
        }

        if removed > 0 {
            info!(history = %self.name, removed, "history sweep reclaimed entries");
        }
        Ok(removed)
    }

    /// Spawns the periodic sweeper; it runs every
    /// [`HistoryConfig::sweep_interval`] until the store closes.
    pub fn spawn_sweeper(self: &Arc<Self>) -> thread::JoinHandle<()> {
        let this = Arc::clone(self);
        thread::spawn(move || {
            let interval = this.config.sweep_interval();
            loop {
                let mut stop = this.sweep_gate.lock();
                if !*stop {
                    this.sweep_signal.wait_for(&mut stop, interval);
                }
                if *stop {
                    break;
                }
                drop(stop);
                if let Err(e) = this.sweep() {
                    warn!(history = %this.name, error = %e, "history sweep failed");
                }
            }
        })
    }

    /// Shuts the history down; wakes and stops the sweeper. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        *self.sweep_gate.lock() = true;
        self.sweep_signal.notify_all();
        info!(history = %self.name, "history closed");
    }

    /// Normalizes and hashes a word into its storage key.
    ///
    /// Case-insensitive by construction. The digest is folded over
    /// itself `hash_loops` times to keep brute-forcing the stored
    /// keys expensive.
    fn hash_word(&self, word: &str) -> Option<String> {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            return None;
        }
        let mut digest = Sha256::new()
            .chain_update(self.salt.as_bytes())
            .chain_update(word.as_bytes())
            .finalize();
        for _ in 1..self.config.hash_loops.max(1) {
            digest = Sha256::digest(digest);
        }
        Some(checksum::hex(&digest))
    }

    fn age_of(&self, ts: i64) -> i64 {
        self.clock.now_millis().saturating_sub(ts)
    }

    fn max_age_millis(&self) -> i64 {
        i64::try_from(self.config.max_age.as_millis()).unwrap_or(i64::MAX)
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("name", &self.name)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Drop for HistoryStore {
    fn drop(&mut self) {
        self.close();
    }
}
