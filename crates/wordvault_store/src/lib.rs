//! # wordvault store
//!
//! Namespaced key-value store boundary for wordvault.
//!
//! The ingestion and query engine treats its backing store as an
//! external collaborator: an ordered, durable, namespaced map of
//! string keys to string values. This crate defines that boundary
//! and ships two implementations:
//!
//! - [`InMemoryStore`] - ordered, ephemeral, for tests and embedding
//! - [`FileStore`] - persistent, snapshot-based, single-process locked
//!
//! ## Design Principles
//!
//! - Stores are opaque string maps; they know nothing about word
//!   lists, checksums, or bookmarks
//! - Every operation is scoped to a [`Namespace`]
//! - `put_all` is a single durable commit; callers time it to tune
//!   batch sizes
//! - Implementations must be `Send + Sync` for concurrent access
//!
//! ## Example
//!
//! ```rust
//! use wordvault_store::{InMemoryStore, KeyValueStore, Namespace};
//!
//! let store = InMemoryStore::new();
//! let ns = Namespace::new("words:default");
//! store.put(&ns, "apple", "").unwrap();
//! assert!(store.contains(&ns, "apple").unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use store::{KeyCursor, KeyValueStore, Namespace};
