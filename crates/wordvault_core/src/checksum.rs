//! Source checksums for the validation gate.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Fingerprint of a source container.
///
/// Stored alongside ingested data; any difference between the stored
/// and freshly computed checksum forces a truncate-and-reingest. The
/// case-sensitivity flag is part of the fingerprint because it changes
/// the stored representation of every word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceChecksum {
    /// SHA-256 of the raw container bytes, hex encoded.
    pub digest: String,
    /// Container length in bytes.
    pub length: u64,
    /// Case sensitivity the data was ingested with.
    pub case_sensitive: bool,
}

impl SourceChecksum {
    /// Computes the checksum of a source container.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SourceMissing`] if the path does not
    /// exist, or an I/O error if reading fails.
    pub fn compute(path: &Path, case_sensitive: bool) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::source_missing(path));
        }

        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        let mut length = 0u64;
        let mut buf = [0u8; 64 * 1024];
        loop {
            let read = file.read(&mut buf)?;
            if read == 0 {
                break;
            }
            hasher.update(&buf[..read]);
            length += read as u64;
        }

        Ok(Self {
            digest: hex(&hasher.finalize()),
            length,
            case_sensitive,
        })
    }
}

/// Lowercase hex encoding of a byte slice.
pub(crate) fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn identical_content_has_identical_checksum() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("words.txt");
        std::fs::write(&path, b"apple\nbanana\n").unwrap();

        let a = SourceChecksum::compute(&path, false).unwrap();
        let b = SourceChecksum::compute(&path, false).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.length, 13);
    }

    #[test]
    fn changed_content_changes_checksum() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("words.txt");

        std::fs::write(&path, b"apple\n").unwrap();
        let before = SourceChecksum::compute(&path, false).unwrap();

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap();
        file.write_all(b"banana\n").unwrap();
        drop(file);

        let after = SourceChecksum::compute(&path, false).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn case_sensitivity_is_part_of_the_fingerprint() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("words.txt");
        std::fs::write(&path, b"apple\n").unwrap();

        let folded = SourceChecksum::compute(&path, false).unwrap();
        let exact = SourceChecksum::compute(&path, true).unwrap();
        assert_ne!(folded, exact);
        assert_eq!(folded.digest, exact.digest);
    }

    #[test]
    fn missing_source_is_reported() {
        let temp = tempdir().unwrap();
        let result = SourceChecksum::compute(&temp.path().join("absent"), false);
        assert!(matches!(result, Err(CoreError::SourceMissing { .. })));
    }

    #[test]
    fn hex_encodes_lowercase() {
        assert_eq!(hex(&[0x00, 0xab, 0xff]), "00abff");
    }
}
