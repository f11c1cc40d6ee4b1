//! WordVault CLI
//!
//! Command-line tools for managing WordVault word lists.
//!
//! # Commands
//!
//! - `load` - Ingest a source file into a word list
//! - `query` - Check whether a word is blocked by a list
//! - `status` - Display word-list metadata
//! - `history` - Manage the hashed history store

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// WordVault command-line word-list tools.
#[derive(Parser)]
#[command(name = "wordvault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Word-list name within the store
    #[arg(global = true, short, long, default_value = "default")]
    name: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a source file into a word list
    Load {
        /// Source word list (plain, .lz4, .tar, or .tar.lz4)
        #[arg(short, long)]
        source: PathBuf,

        /// Store substrings of this length instead of whole words
        #[arg(short, long, default_value = "0")]
        chunk_size: usize,

        /// Match case exactly instead of folding to lowercase
        #[arg(long)]
        case_sensitive: bool,

        /// Throttle factor; 0 runs unthrottled
        #[arg(short, long, default_value = "1")]
        load_factor: u32,
    },

    /// Check whether a word is blocked by a list
    Query {
        /// The word to check
        word: String,

        /// Source the list was loaded from (revalidated before querying)
        #[arg(short, long)]
        source: PathBuf,

        /// Chunk size the list was loaded with
        #[arg(short, long, default_value = "0")]
        chunk_size: usize,

        /// Case sensitivity the list was loaded with
        #[arg(long)]
        case_sensitive: bool,
    },

    /// Display word-list metadata
    Status {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Manage the hashed history store
    History {
        #[command(subcommand)]
        action: commands::history::Action,

        /// Retention window in days
        #[arg(long, default_value = "90")]
        max_age_days: u64,

        /// Hash iteration count
        #[arg(long, default_value = "10000")]
        hash_loops: u32,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Load {
            source,
            chunk_size,
            case_sensitive,
            load_factor,
        } => {
            let path = cli.path.ok_or("Store path required for load")?;
            commands::load::run(
                &path,
                &cli.name,
                &source,
                chunk_size,
                case_sensitive,
                load_factor,
            )?;
        }
        Commands::Query {
            word,
            source,
            chunk_size,
            case_sensitive,
        } => {
            let path = cli.path.ok_or("Store path required for query")?;
            commands::query::run(&path, &cli.name, &word, &source, chunk_size, case_sensitive)?;
        }
        Commands::Status { format } => {
            let path = cli.path.ok_or("Store path required for status")?;
            commands::status::run(&path, &cli.name, &format)?;
        }
        Commands::History {
            action,
            max_age_days,
            hash_loops,
        } => {
            let path = cli.path.ok_or("Store path required for history")?;
            commands::history::run(&path, &cli.name, action, max_age_days, hash_loops)?;
        }
        Commands::Version => {
            println!("wordvault {}", wordvault_core::VERSION);
        }
    }

    Ok(())
}
