//! History command implementation.

use clap::Subcommand;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wordvault_core::{HistoryConfig, HistoryStore};
use wordvault_store::FileStore;

/// History subcommands.
#[derive(Subcommand)]
pub enum Action {
    /// Record a word as seen now
    Add {
        /// The word to record
        word: String,
    },
    /// Check whether a word was seen within the retention window
    Check {
        /// The word to check
        word: String,
    },
    /// Remove expired entries
    Sweep,
    /// Show entry count and oldest entry age
    Stats,
}

/// Runs a history subcommand.
pub fn run(
    path: &Path,
    name: &str,
    action: Action,
    max_age_days: u64,
    hash_loops: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let backing = Arc::new(FileStore::open(path)?);
    let config = HistoryConfig::new()
        .max_age(Duration::from_secs(max_age_days * 24 * 60 * 60))
        .hash_loops(hash_loops);
    let history = HistoryStore::open(name, backing, config)?;

    match action {
        Action::Add { word } => {
            history.add_word(&word)?;
            println!("recorded");
        }
        Action::Check { word } => {
            if history.contains_word(&word) {
                println!("seen");
            } else {
                println!("not seen");
            }
        }
        Action::Sweep => {
            let removed = history.sweep()?;
            println!("removed {removed} expired entries");
        }
        Action::Stats => {
            println!("Entries:  {}", history.len()?);
            match history.oldest_entry_age() {
                Some(age) => println!("Oldest:   {}s ago", age.as_secs()),
                None => println!("Oldest:   none"),
            }
        }
    }
    Ok(())
}
