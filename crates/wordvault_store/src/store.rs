//! Store trait and namespace definitions.

use crate::error::StoreResult;
use std::fmt;

/// A logical namespace within a store.
///
/// Namespaces isolate the different record families the engine keeps:
/// word data, word-list metadata, history entries, history metadata.
/// A namespace can be truncated without touching its siblings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// Creates a namespace from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the namespace name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A snapshot cursor over the entries of one namespace.
///
/// Entries are yielded in key order. Dropping the cursor closes it
/// early; a sweep that is interrupted mid-pass simply stops pulling.
pub trait KeyCursor: Send {
    /// Returns the next `(key, value)` pair, or `None` when exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails mid-iteration.
    fn next_entry(&mut self) -> StoreResult<Option<(String, String)>>;
}

/// An ordered, durable, namespaced key-value store.
///
/// This is the full capability surface the ingestion and query engine
/// requires from its backing store. The store's internal engine is
/// out of scope here - it may be an embedded database, a remote
/// service, or a plain in-memory map.
///
/// # Invariants
///
/// - `put_all` commits all entries as a single durable unit; when it
///   returns, a crash must not lose the batch
/// - Iteration order within a namespace follows key order
/// - Operations on distinct namespaces never interfere
/// - Implementations must be `Send + Sync`: queries run concurrently
///   with an in-progress bulk load
pub trait KeyValueStore: Send + Sync {
    /// Looks up the value for `key`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable.
    fn get(&self, ns: &Namespace, key: &str) -> StoreResult<Option<String>>;

    /// Inserts or replaces a single entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    fn put(&self, ns: &Namespace, key: &str, value: &str) -> StoreResult<()>;

    /// Inserts or replaces a batch of entries as one durable commit.
    ///
    /// Callers time this call to adapt their batch sizes, so the
    /// commit must be synchronous.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; the store must not have
    /// applied a partial batch observable to later readers.
    fn put_all(&self, ns: &Namespace, entries: &[(String, String)]) -> StoreResult<()>;

    /// Removes an entry. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    fn remove(&self, ns: &Namespace, key: &str) -> StoreResult<()>;

    /// Returns whether `key` is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable.
    fn contains(&self, ns: &Namespace, key: &str) -> StoreResult<bool>;

    /// Removes every entry in the namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    fn truncate(&self, ns: &Namespace) -> StoreResult<()>;

    /// Returns the number of entries in the namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable.
    fn len(&self, ns: &Namespace) -> StoreResult<u64>;

    /// Opens a snapshot cursor over the namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable.
    fn iter(&self, ns: &Namespace) -> StoreResult<Box<dyn KeyCursor>>;
}
