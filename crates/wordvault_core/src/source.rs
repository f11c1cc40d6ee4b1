//! Sequential line reader over word-list source containers.

use crate::error::{CoreError, CoreResult};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

/// Container format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    /// Plain UTF-8 text, one word per line.
    Plain,
    /// lz4 frame-compressed text.
    Lz4,
    /// Multi-entry tar archive of text files, optionally lz4-framed.
    Tar {
        /// Whether the archive itself is lz4 frame-compressed.
        lz4: bool,
    },
}

impl Container {
    fn detect(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.ends_with(".tar.lz4") {
            Self::Tar { lz4: true }
        } else if name.ends_with(".tar") {
            Self::Tar { lz4: false }
        } else if name.ends_with(".lz4") {
            Self::Lz4
        } else {
            Self::Plain
        }
    }
}

/// Streams lines out of a word-list source container.
///
/// Tar archives are walked entry by entry in archive order;
/// directory-like entries are skipped and the reader switches to the
/// next file entry transparently when the current one is exhausted.
/// The source format has no random access, so resuming is always a
/// sequential skip from the start.
///
/// A reader can be constructed any number of times against the same
/// locator; the loader opens it twice per run (pre-scan, then load).
pub struct SourceReader {
    path: PathBuf,
    container: Container,
    current: Option<Box<dyn BufRead + Send>>,
    /// Index of the next tar file entry to load.
    next_entry: usize,
    exhausted: bool,
}

impl std::fmt::Debug for SourceReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceReader")
            .field("path", &self.path)
            .field("container", &self.container)
            .field("next_entry", &self.next_entry)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl SourceReader {
    /// Opens a source container for sequential reading.
    ///
    /// # Errors
    ///
    /// - [`CoreError::SourceMissing`] if the path does not exist
    /// - [`CoreError::SourceEmpty`] if the container holds no
    ///   readable content (zero-length file, archive with no file
    ///   entries)
    /// - I/O errors from opening or decoding the container
    pub fn open(locator: &Path) -> CoreResult<Self> {
        if !locator.exists() {
            return Err(CoreError::source_missing(locator));
        }

        let container = Container::detect(locator);
        let mut reader = Self {
            path: locator.to_path_buf(),
            container,
            current: None,
            next_entry: 0,
            exhausted: false,
        };

        match container {
            Container::Plain | Container::Lz4 => {
                if locator.metadata()?.len() == 0 {
                    return Err(CoreError::source_empty(locator));
                }
                reader.current = Some(reader.open_stream()?);
            }
            Container::Tar { .. } => {
                // Buffer the first file entry up front so an archive
                // with no file entries fails at open, not first read.
                match reader.load_next_tar_entry()? {
                    Some(buf) => reader.current = Some(Box::new(Cursor::new(buf))),
                    None => return Err(CoreError::source_empty(locator)),
                }
            }
        }

        Ok(reader)
    }

    /// Returns the next line, without its terminator, or `None` at
    /// end of container.
    ///
    /// # Errors
    ///
    /// Propagates I/O and UTF-8 decode errors from the underlying
    /// stream.
    pub fn next_line(&mut self) -> CoreResult<Option<String>> {
        loop {
            if self.exhausted {
                return Ok(None);
            }

            let Some(stream) = self.current.as_mut() else {
                self.advance()?;
                continue;
            };

            let mut line = String::new();
            if stream.read_line(&mut line)? == 0 {
                self.current = None;
                self.advance()?;
                continue;
            }

            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            return Ok(Some(line));
        }
    }

    /// Counts the remaining lines, consuming the reader.
    ///
    /// Used for the pre-scan that sizes progress reporting. The
    /// callback is invoked per line and may abort the count early by
    /// returning false (for cooperative pause).
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn count_lines(mut self, mut keep_going: impl FnMut() -> bool) -> CoreResult<Option<u64>> {
        let mut count = 0u64;
        while self.next_line()?.is_some() {
            count += 1;
            if !keep_going() {
                return Ok(None);
            }
        }
        Ok(Some(count))
    }

    /// Moves to the next entry, or marks the reader exhausted.
    fn advance(&mut self) -> CoreResult<()> {
        match self.container {
            Container::Plain | Container::Lz4 => {
                self.exhausted = true;
            }
            Container::Tar { .. } => match self.load_next_tar_entry()? {
                Some(buf) => self.current = Some(Box::new(Cursor::new(buf))),
                None => self.exhausted = true,
            },
        }
        Ok(())
    }

    /// Opens the raw (decompressed) container byte stream.
    fn open_stream(&self) -> CoreResult<Box<dyn BufRead + Send>> {
        let file = File::open(&self.path)?;
        let stream: Box<dyn BufRead + Send> = match self.container {
            Container::Plain | Container::Tar { lz4: false } => Box::new(BufReader::new(file)),
            Container::Lz4 | Container::Tar { lz4: true } => Box::new(BufReader::new(
                lz4_flex::frame::FrameDecoder::new(BufReader::new(file)),
            )),
        };
        Ok(stream)
    }

    /// Reads the next file entry of the tar archive into memory.
    ///
    /// The tar entry iterator borrows the archive, so it cannot be
    /// held across calls; instead each switch re-opens the archive
    /// and skips forward sequentially. Archives hold a handful of
    /// entries, so the re-scan cost is negligible against the read.
    ///
    /// Each entry is buffered whole, so peak memory is bounded by the
    /// largest file in the archive rather than the archive size.
    fn load_next_tar_entry(&mut self) -> CoreResult<Option<Vec<u8>>> {
        let stream = self.open_stream()?;
        let mut archive = tar::Archive::new(stream);
        let mut seen = 0usize;
        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            if seen == self.next_entry {
                let mut buf = Vec::new();
                entry.read_to_end(&mut buf)?;
                self.next_entry += 1;
                return Ok(Some(buf));
            }
            seen += 1;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn read_all(mut reader: SourceReader) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    fn write_tar(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(file);
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.finish().unwrap();
    }

    #[test]
    fn plain_file_lines() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("words.txt");
        std::fs::write(&path, "apple\nbanana\r\ncherry").unwrap();

        let reader = SourceReader::open(&path).unwrap();
        assert_eq!(read_all(reader), vec!["apple", "banana", "cherry"]);
    }

    #[test]
    fn missing_container_fails_at_open() {
        let temp = tempdir().unwrap();
        let result = SourceReader::open(&temp.path().join("absent.txt"));
        assert!(matches!(result, Err(CoreError::SourceMissing { .. })));
    }

    #[test]
    fn empty_file_fails_at_open() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("empty.txt");
        std::fs::write(&path, b"").unwrap();
        let result = SourceReader::open(&path);
        assert!(matches!(result, Err(CoreError::SourceEmpty { .. })));
    }

    #[test]
    fn lz4_frame_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("words.lz4");
        let file = File::create(&path).unwrap();
        let mut encoder = lz4_flex::frame::FrameEncoder::new(file);
        encoder.write_all(b"apple\nbanana\n").unwrap();
        encoder.finish().unwrap();

        let reader = SourceReader::open(&path).unwrap();
        assert_eq!(read_all(reader), vec!["apple", "banana"]);
    }

    #[test]
    fn tar_switches_entries_transparently() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("words.tar");
        write_tar(
            &path,
            &[("a.txt", "apple\nbanana\n"), ("b.txt", "cherry\n")],
        );

        let reader = SourceReader::open(&path).unwrap();
        assert_eq!(read_all(reader), vec!["apple", "banana", "cherry"]);
    }

    #[test]
    fn tar_without_file_entries_is_empty() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("dirs.tar");
        let file = File::create(&path).unwrap();
        let mut builder = tar::Builder::new(file);
        builder
            .append_dir("subdir", temp.path())
            .unwrap();
        builder.finish().unwrap();

        let result = SourceReader::open(&path);
        assert!(matches!(result, Err(CoreError::SourceEmpty { .. })));
    }

    #[test]
    fn tar_lz4_round_trip() {
        let temp = tempdir().unwrap();

        // Build the tar in memory, then frame-compress it.
        let mut tar_bytes = Vec::new();
        {
            let mut builder = tar::Builder::new(&mut tar_bytes);
            let mut header = tar::Header::new_gnu();
            let content = b"apple\nbanana\n";
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, "words.txt", &content[..])
                .unwrap();
            builder.finish().unwrap();
        }

        let path = temp.path().join("words.tar.lz4");
        let file = File::create(&path).unwrap();
        let mut encoder = lz4_flex::frame::FrameEncoder::new(file);
        encoder.write_all(&tar_bytes).unwrap();
        encoder.finish().unwrap();

        let reader = SourceReader::open(&path).unwrap();
        assert_eq!(read_all(reader), vec!["apple", "banana"]);
    }

    #[test]
    fn double_open_sees_the_same_lines() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("words.txt");
        std::fs::write(&path, "one\ntwo\nthree\n").unwrap();

        let count = SourceReader::open(&path)
            .unwrap()
            .count_lines(|| true)
            .unwrap();
        assert_eq!(count, Some(3));

        let reader = SourceReader::open(&path).unwrap();
        assert_eq!(read_all(reader).len(), 3);
    }

    #[test]
    fn count_lines_can_be_aborted() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("words.txt");
        std::fs::write(&path, "one\ntwo\nthree\n").unwrap();

        let mut remaining = 2;
        let count = SourceReader::open(&path)
            .unwrap()
            .count_lines(|| {
                remaining -= 1;
                remaining > 0
            })
            .unwrap();
        assert_eq!(count, None);
    }

    #[test]
    fn invalid_utf8_surfaces_as_io_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bad.txt");
        std::fs::write(&path, [0x66, 0x6f, 0xff, 0xfe, 0x0a]).unwrap();

        let mut reader = SourceReader::open(&path).unwrap();
        assert!(matches!(reader.next_line(), Err(CoreError::Io(_))));
    }
}
