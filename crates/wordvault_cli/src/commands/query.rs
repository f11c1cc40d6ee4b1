//! Query command implementation.

use std::path::Path;
use std::sync::Arc;
use wordvault_core::{StoreState, WordStore, WordlistConfig};
use wordvault_store::FileStore;

/// Runs the query command. The configuration must match what the list
/// was loaded with, or the trust gate will reingest from the source
/// before answering.
pub fn run(
    path: &Path,
    name: &str,
    word: &str,
    source: &Path,
    chunk_size: usize,
    case_sensitive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let backing = Arc::new(FileStore::open(path)?);
    let config = WordlistConfig::new()
        .source(source)
        .chunk_size(chunk_size)
        .case_sensitive(case_sensitive);

    let store = WordStore::new(name, backing, config);
    store.open()?;
    if store.status() != StoreState::Open {
        return Err(store.health().message.into());
    }

    if store.contains_word(word) {
        println!("blocked");
    } else {
        println!("allowed");
    }
    Ok(())
}
