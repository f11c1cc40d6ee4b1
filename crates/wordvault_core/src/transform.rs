//! Word-to-record transforms.
//!
//! A transform turns one normalized word into zero or more store
//! key/value pairs. The two variants replace what would otherwise be
//! subclass-supplied storage logic:
//!
//! - [`RecordTransform::Containment`] stores words keyed for
//!   substring-containment queries
//! - [`RecordTransform::SampledIndex`] stores words under sequential
//!   indices for random sampling

use std::collections::BTreeSet;

/// Tagged transform strategy applied to every ingested word.
#[derive(Debug)]
pub enum RecordTransform {
    /// Emit the word's distinct chunks as keys with empty values.
    ///
    /// With `chunk_size == 0` the whole word is the only key. With a
    /// positive chunk size, the keys are the distinct substrings of
    /// exactly `min(chunk_size, word length)` characters, so a query
    /// can probe substrings of its input against exact store keys.
    Containment {
        /// Minimum containment-match length; 0 = whole word.
        chunk_size: usize,
    },
    /// Emit `(index, word)` with a monotonically increasing index.
    SampledIndex {
        /// Next index to assign.
        next_index: u64,
    },
}

impl RecordTransform {
    /// Picks the transform for a list kind.
    #[must_use]
    pub fn for_kind(kind: crate::config::ListKind, chunk_size: usize) -> Self {
        match kind {
            crate::config::ListKind::Containment => Self::Containment { chunk_size },
            crate::config::ListKind::SampledIndex => Self::SampledIndex { next_index: 0 },
        }
    }

    /// Index checkpoint to persist alongside the resume bookmark.
    ///
    /// Always 0 for containment lists; for sampled lists, the next
    /// index to assign, so a resumed run continues numbering exactly
    /// where the committed data left off.
    #[must_use]
    pub fn next_index(&self) -> u64 {
        match self {
            Self::Containment { .. } => 0,
            Self::SampledIndex { next_index } => *next_index,
        }
    }

    /// Applies the transform, appending records to `out`.
    pub fn emit(&mut self, word: &str, out: &mut Vec<(String, String)>) {
        match self {
            Self::Containment { chunk_size } => {
                for chunk in chunks(word, *chunk_size) {
                    out.push((chunk, String::new()));
                }
            }
            Self::SampledIndex { next_index } => {
                out.push((next_index.to_string(), word.to_string()));
                *next_index += 1;
            }
        }
    }
}

/// Distinct stored chunks of a word for a given chunk size.
///
/// Whole word when `chunk_size` is 0 or at least the word length;
/// otherwise every distinct window of exactly `chunk_size` characters.
fn chunks(word: &str, chunk_size: usize) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    if word.is_empty() {
        return out;
    }

    let char_count = word.chars().count();
    if chunk_size == 0 || chunk_size >= char_count {
        out.insert(word.to_string());
        return out;
    }

    for window in char_windows(word, chunk_size) {
        out.insert(window.to_string());
    }
    out
}

/// All contiguous windows of `len` characters, as subslices.
///
/// Operates on character boundaries so multibyte words never split a
/// code point. Empty when `len` is 0 or exceeds the word length.
pub(crate) fn char_windows(word: &str, len: usize) -> Vec<&str> {
    if len == 0 {
        return Vec::new();
    }
    let mut boundaries: Vec<usize> = word.char_indices().map(|(i, _)| i).collect();
    boundaries.push(word.len());

    let char_count = boundaries.len() - 1;
    if len > char_count {
        return Vec::new();
    }

    (0..=char_count - len)
        .map(|i| &word[boundaries[i]..boundaries[i + len]])
        .collect()
}
