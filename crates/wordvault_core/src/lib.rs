//! # wordvault core
//!
//! Word-list ingestion and query engine.
//!
//! This crate provides:
//! - Resumable, throttled, adaptively-batched bulk loading of word
//!   lists from compressed sources into a namespaced key-value store
//! - Substring-containment and exact-membership queries over the
//!   stored words
//! - A salted, iteratively-hashed history store with periodic
//!   background expiration
//!
//! The backing store is supplied by the caller through the
//! [`wordvault_store::KeyValueStore`] trait.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod checksum;
mod clock;
mod config;
mod error;
mod history;
mod ingest;
mod meta;
mod normalize;
mod progress;
mod query;
mod source;
mod state;
mod throttle;
mod transform;
mod wordstore;

pub use batch::{BatchSizer, BatchTuning};
pub use checksum::SourceChecksum;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{HistoryConfig, ListKind, WordlistConfig};
pub use error::{CoreError, CoreResult};
pub use history::HistoryStore;
pub use ingest::IngestionEngine;
pub use meta::{IngestStatus, MetaRecord};
pub use progress::PopulationProgress;
pub use source::SourceReader;
pub use state::{HealthRecord, HealthSeverity, StoreState};
pub use throttle::Throttle;
pub use transform::RecordTransform;
pub use wordstore::WordStore;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
