//! Status command implementation.

use serde::Serialize;
use std::path::Path;
use wordvault_core::{IngestStatus, MetaRecord};
use wordvault_store::{FileStore, Namespace};

/// Printable word-list status.
#[derive(Debug, Serialize)]
pub struct StatusResult {
    /// Word-list name.
    pub name: String,
    /// Ingestion status.
    pub status: IngestStatus,
    /// Metadata version string.
    pub version: String,
    /// Stored word count.
    pub size: u64,
    /// Resume bookmark.
    pub last_line: u64,
    /// Accumulated ingestion seconds.
    pub elapsed_seconds: u64,
    /// Source digest, if recorded.
    pub checksum: Option<String>,
}

/// Runs the status command.
pub fn run(path: &Path, name: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open(path)?;
    let meta_ns = Namespace::new(format!("meta:{name}"));

    let Some(meta) = MetaRecord::load(&store, &meta_ns)? else {
        return Err(format!("no word list named '{name}' at {}", path.display()).into());
    };

    let result = StatusResult {
        name: name.to_string(),
        status: meta.status,
        version: meta.version,
        size: meta.size,
        last_line: meta.last_line,
        elapsed_seconds: meta.elapsed_seconds,
        checksum: meta.checksum.map(|c| c.digest),
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Word list:  {}", result.name);
        println!("Status:     {:?}", result.status);
        println!("Version:    {}", result.version);
        println!("Size:       {} words", result.size);
        println!("Bookmark:   line {}", result.last_line);
        println!("Elapsed:    {}s", result.elapsed_seconds);
        if let Some(digest) = &result.checksum {
            println!("Checksum:   {digest}");
        }
    }
    Ok(())
}
