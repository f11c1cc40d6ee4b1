//! Load command implementation.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wordvault_core::{StoreState, WordStore, WordlistConfig};
use wordvault_store::FileStore;

/// Runs the load command: opens the list against the given source and
/// reports progress until ingestion settles.
pub fn run(
    path: &Path,
    name: &str,
    source: &Path,
    chunk_size: usize,
    case_sensitive: bool,
    load_factor: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let backing = Arc::new(FileStore::open(path)?);
    let config = WordlistConfig::new()
        .source(source)
        .chunk_size(chunk_size)
        .case_sensitive(case_sensitive)
        .load_factor(load_factor);

    let store = Arc::new(WordStore::new(name, backing, config));
    let worker = store.spawn_open();

    while store.status() != StoreState::Open && store.status() != StoreState::Closed {
        if let Some(line) = store.progress_line() {
            println!("{line}");
        }
        std::thread::sleep(Duration::from_secs(2));
    }
    worker
        .join()
        .map_err(|_| "ingestion worker panicked")??;

    match store.status() {
        StoreState::Open => {
            println!("Loaded {} words into '{name}'", store.len());
            Ok(())
        }
        _ => Err(store.health().message.into()),
    }
}
