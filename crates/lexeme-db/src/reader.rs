//! Line-oriented, batched access to a (bzip2-compressed) lexeme dump.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use bzip2::read::MultiBzDecoder;
use tracing::debug;

use crate::error::ConfigError;

/// Average compressed bytes per lexeme in the Wikidata dumps; only used to
/// size the progress bar.
pub const AVERAGE_ENTRY_BYTES: u64 = 263;
pub const DEFAULT_BATCH_SIZE: usize = 1000;
const READ_BUFFER: usize = 256 * 1024;

/// A dump line with its 1-based physical line number.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawLine {
    pub number: u64,
    pub text: String,
}

/// Streams the dump in fixed-size batches of non-structural lines.
///
/// Only one batch of decompressed lines is held at a time.
pub struct DumpReader {
    path: PathBuf,
    reader: Box<dyn BufRead>,
    estimated_entries: u64,
    batch_size: usize,
    line_no: u64,
    buf: Vec<u8>,
}

impl DumpReader {
    /// Open a dump file. Paths ending in `.bz2` are decompressed on the fly,
    /// anything else is read as plain text.
    pub fn open(path: impl AsRef<Path>, batch_size: usize) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::DumpNotFound { path: path.clone() },
            _ => ConfigError::DumpUnreadable {
                path: path.clone(),
                source,
            },
        })?;
        let size = file
            .metadata()
            .map_err(|source| ConfigError::DumpUnreadable {
                path: path.clone(),
                source,
            })?
            .len();

        let reader: Box<dyn BufRead> = if is_bzip2(&path) {
            Box::new(BufReader::with_capacity(
                READ_BUFFER,
                MultiBzDecoder::new(file),
            ))
        } else {
            Box::new(BufReader::with_capacity(READ_BUFFER, file))
        };

        let estimated_entries = size / AVERAGE_ENTRY_BYTES;
        debug!(
            "opened {} ({size} bytes, ~{estimated_entries} entries)",
            path.display()
        );
        Ok(Self::with_estimate(path, reader, estimated_entries, batch_size))
    }

    /// Wrap an already-open line source.
    pub fn from_reader(reader: impl BufRead + 'static, batch_size: usize) -> Self {
        Self::with_estimate(PathBuf::from("<reader>"), Box::new(reader), 0, batch_size)
    }

    fn with_estimate(
        path: PathBuf,
        reader: Box<dyn BufRead>,
        estimated_entries: u64,
        batch_size: usize,
    ) -> Self {
        Self {
            path,
            reader,
            estimated_entries,
            batch_size: batch_size.max(1),
            line_no: 0,
            buf: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rough entry count derived from the file size.
    pub fn estimated_entries(&self) -> u64 {
        self.estimated_entries
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Read up to `batch_size` non-structural lines; `None` at end of stream.
    pub fn next_batch(&mut self) -> Result<Option<Vec<RawLine>>, ConfigError> {
        let mut batch = Vec::with_capacity(self.batch_size.min(DEFAULT_BATCH_SIZE));
        while batch.len() < self.batch_size {
            self.buf.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .map_err(|source| ConfigError::DumpUnreadable {
                    path: self.path.clone(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            self.line_no += 1;

            let text = String::from_utf8_lossy(&self.buf);
            if is_structural(&text) {
                continue;
            }
            batch.push(RawLine {
                number: self.line_no,
                text: text.into_owned(),
            });
        }
        Ok((!batch.is_empty()).then_some(batch))
    }
}

impl Iterator for DumpReader {
    type Item = Result<Vec<RawLine>, ConfigError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch().transpose()
    }
}

/// Lines that only frame the JSON array: `[`, `]`, `,` or blank.
pub fn is_structural(line: &str) -> bool {
    matches!(line.trim(), "" | "[" | "]" | ",")
}

fn is_bzip2(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bz2"))
}
