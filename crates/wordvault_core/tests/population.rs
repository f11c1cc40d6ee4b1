//! End-to-end population tests over the durable file store.

use lz4_flex::frame::FrameEncoder;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wordvault_core::{
    Clock, HistoryConfig, HistoryStore, ManualClock, StoreState, WordStore, WordlistConfig,
};
use wordvault_store::{FileStore, KeyValueStore};

fn write_source(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn write_lz4_source(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = FrameEncoder::new(file);
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

fn file_store(dir: &TempDir) -> Arc<dyn KeyValueStore> {
    Arc::new(FileStore::open(&dir.path().join("store")).unwrap())
}

#[test]
fn load_then_query_through_file_store() {
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "words.txt", "apple\nbanana\n!#comment:skip\n\n");

    let store = WordStore::new(
        "default",
        file_store(&temp),
        WordlistConfig::new().source(&source),
    );
    store.open().unwrap();

    assert_eq!(store.status(), StoreState::Open);
    assert_eq!(store.len(), 2);
    assert!(store.contains_word("APPLE"));
    assert!(store.contains_word("banana"));
    assert!(!store.contains_word("grape"));
}

#[test]
fn reopen_from_disk_without_reingesting() {
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "words.txt", "apple\nbanana\ncherry\n");

    {
        let store = WordStore::new(
            "default",
            file_store(&temp),
            WordlistConfig::new().source(&source),
        );
        store.open().unwrap();
        assert_eq!(store.len(), 3);
        store.close();
    }

    // Unchanged source bytes: the trust gate accepts the stored data
    // and skips ingestion entirely.
    let store = WordStore::new(
        "default",
        file_store(&temp),
        WordlistConfig::new().source(&source),
    );
    store.open().unwrap();
    assert_eq!(store.status(), StoreState::Open);
    assert_eq!(store.len(), 3);
    assert!(store.contains_word("cherry"));
}

#[test]
fn source_change_triggers_truncate_and_reingest() {
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "words.txt", "apple\nbanana\n");

    {
        let store = WordStore::new(
            "default",
            file_store(&temp),
            WordlistConfig::new().source(&source),
        );
        store.open().unwrap();
        assert!(store.contains_word("apple"));
        store.close();
    }

    std::fs::write(&source, "cherry\n").unwrap();
    let store = WordStore::new(
        "default",
        file_store(&temp),
        WordlistConfig::new().source(&source),
    );
    store.open().unwrap();

    assert_eq!(store.len(), 1);
    assert!(store.contains_word("cherry"));
    assert!(!store.contains_word("apple"));
}

#[test]
fn chunked_list_blocks_containing_words() {
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "words.txt", "password\nletmein\n");

    let store = WordStore::new(
        "default",
        file_store(&temp),
        WordlistConfig::new().source(&source).chunk_size(4),
    );
    store.open().unwrap();

    // Any word containing a 4-character window of a stored word is
    // blocked.
    assert!(store.contains_word("password"));
    assert!(store.contains_word("mypassword123"));
    assert!(store.contains_word("pass"));
    assert!(store.contains_word("sswo"));
    assert!(!store.contains_word("qwerty"));
    assert!(!store.contains_word("pas"));
}

#[test]
fn compressed_source_loads_transparently() {
    let temp = TempDir::new().unwrap();
    let source = write_lz4_source(&temp, "words.txt.lz4", "alpha\nbeta\ngamma\n");

    let store = WordStore::new(
        "default",
        file_store(&temp),
        WordlistConfig::new().source(&source),
    );
    store.open().unwrap();

    assert_eq!(store.len(), 3);
    assert!(store.contains_word("beta"));
}

#[test]
fn independent_lists_share_one_store() {
    let temp = TempDir::new().unwrap();
    let fruits = write_source(&temp, "fruits.txt", "apple\nbanana\n");
    let animals = write_source(&temp, "animals.txt", "cat\ndog\nfox\n");
    let backing = file_store(&temp);

    let fruit_store = WordStore::new(
        "fruits",
        Arc::clone(&backing),
        WordlistConfig::new().source(&fruits),
    );
    let animal_store = WordStore::new(
        "animals",
        Arc::clone(&backing),
        WordlistConfig::new().source(&animals),
    );
    fruit_store.open().unwrap();
    animal_store.open().unwrap();

    assert_eq!(fruit_store.len(), 2);
    assert_eq!(animal_store.len(), 3);
    assert!(fruit_store.contains_word("apple"));
    assert!(!fruit_store.contains_word("cat"));
    assert!(animal_store.contains_word("cat"));
    assert!(!animal_store.contains_word("apple"));
}

#[test]
fn history_survives_reopen_and_expires() {
    let temp = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::starting_at(0));
    let config = HistoryConfig::new()
        .hash_loops(3)
        .max_age(Duration::from_millis(1_000));

    {
        let history = HistoryStore::open_with_clock(
            "default",
            file_store(&temp),
            config.clone(),
            Arc::clone(&clock) as Arc<dyn Clock>,
        )
        .unwrap();
        history.add_word("secret").unwrap();
        history.close();
    }

    let history = HistoryStore::open_with_clock(
        "default",
        file_store(&temp),
        config,
        Arc::clone(&clock) as Arc<dyn Clock>,
    )
    .unwrap();

    // Same salt, so the stored hash still matches.
    assert!(history.contains_word("secret"));
    clock.advance(1_001);
    assert!(!history.contains_word("secret"));
    assert_eq!(history.sweep().unwrap(), 1);
    assert_eq!(history.len().unwrap(), 0);
}

#[test]
fn history_and_word_list_share_one_store() {
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "words.txt", "apple\n");
    let backing = file_store(&temp);

    let store = WordStore::new(
        "default",
        Arc::clone(&backing),
        WordlistConfig::new().source(&source),
    );
    store.open().unwrap();

    let history = HistoryStore::open(
        "default",
        Arc::clone(&backing),
        HistoryConfig::new().hash_loops(3),
    )
    .unwrap();
    history.add_word("apple").unwrap();

    assert!(store.contains_word("apple"));
    assert!(history.contains_word("apple"));
    assert_eq!(store.len(), 1);
}
