//! Substring-containment membership query.

use crate::error::CoreResult;
use crate::transform::char_windows;
use std::collections::HashSet;
use wordvault_store::{KeyValueStore, Namespace};

/// Checks whether any qualifying substring of `word` is a stored key.
///
/// With `chunk_size == 0` this is a plain whole-word membership test.
/// Otherwise every distinct contiguous substring of at least
/// `chunk_size` characters is probed, shortest lengths first, and the
/// first hit short-circuits. Scan order across lengths is an
/// implementation detail; only membership is guaranteed.
///
/// # Errors
///
/// Returns a store error if a probe fails; callers on the query path
/// treat that as "not found" after logging.
pub fn contains(
    store: &dyn KeyValueStore,
    ns: &Namespace,
    word: &str,
    chunk_size: usize,
) -> CoreResult<bool> {
    if word.is_empty() {
        return Ok(false);
    }

    if chunk_size == 0 {
        return Ok(store.contains(ns, word)?);
    }

    let char_count = word.chars().count();
    let shortest = chunk_size.min(char_count);
    let mut probed: HashSet<&str> = HashSet::new();

    for len in shortest..=char_count {
        for window in char_windows(word, len) {
            if !probed.insert(window) {
                continue;
            }
            if store.contains(ns, window)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
