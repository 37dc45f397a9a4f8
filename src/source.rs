//! Self-verifying data sources with transparent decompression.
//!
//! A [`Source`] couples a data file with its `.qcd` verification side-file:
//! construction verifies the stream against the recorded checksums and then
//! retains every (masked) line in memory for diffing.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::checksum::{Checksummer, Metadata};
use crate::diff;
use crate::error::{QcdError, Result};
use crate::scan::LineScanner;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const BZIP2_MAGIC: [u8; 3] = *b"BZh";
const XZ_MAGIC: [u8; 6] = [0xfd, b'7', b'z', b'X', b'Z', 0x00];

/// Strip a recognized compression suffix from a file name.
fn strip_compression_suffix(name: &str) -> &str {
    for suffix in [".gz", ".bz2", ".xz"] {
        if let Some(base) = name.strip_suffix(suffix) {
            return base;
        }
    }
    name
}

/// Open a data file, layering a decompressor selected by its extension
/// (`.gz`, `.bz2`, `.xz`).
///
/// Returns the byte stream and the file name with any compression suffix
/// removed (the base the `.qcd` side-file name derives from). A file whose
/// extension promises compression but whose content does not start with the
/// matching magic is read raw after a logged warning; it does not abort.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn open_input(path: &Path) -> Result<(Box<dyn Read>, String)> {
    let name = path.to_string_lossy().into_owned();
    let base = strip_compression_suffix(&name).to_string();
    let mut reader = BufReader::new(File::open(path)?);

    if name.ends_with(".gz") {
        let sniff = reader.fill_buf()?;
        if sniff.starts_with(&GZIP_MAGIC) {
            return Ok((Box::new(flate2::read::MultiGzDecoder::new(reader)), base));
        }
        warn!("{name}: looks like gzip but the stream does not, reading raw");
    } else if name.ends_with(".bz2") {
        let sniff = reader.fill_buf()?;
        if sniff.starts_with(&BZIP2_MAGIC) {
            return Ok((Box::new(bzip2::read::MultiBzDecoder::new(reader)), base));
        }
        warn!("{name}: looks like bzip2 but the stream does not, reading raw");
    } else if name.ends_with(".xz") {
        let sniff = reader.fill_buf()?;
        if sniff.starts_with(&XZ_MAGIC) {
            return Ok((Box::new(xz2::read::XzDecoder::new(reader)), base));
        }
        warn!("{name}: looks like xz but the stream does not, reading raw");
    }

    Ok((Box::new(reader), base))
}

/// A data source verified against its `.qcd` side-file.
///
/// Construction reads the stream twice: once to verify it against the
/// recorded checksums, once to retain the (masked) lines. Non-seekable
/// inputs such as pipes therefore cannot back a `Source`; they are limited
/// to a one-shot [`Checksummer`].
pub struct Source {
    filename: PathBuf,
    check_filename: PathBuf,
    checksummer: Checksummer,
    lines: Vec<String>,
}

impl Source {
    /// Open and self-verify a data source.
    ///
    /// The side-file name is the input name with any compression suffix
    /// stripped and `.qcd` appended (`x.csv.gz` reads `x.csv.qcd`).
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, a missing or undecodable side-file, or
    /// [`QcdError::SelfCheckFailed`] when the stream does not verify
    /// against its own metadata.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (reader, base) = open_input(path)?;
        let check_filename = PathBuf::from(format!("{base}.qcd"));

        let meta: Metadata = serde_json::from_slice(&fs::read(&check_filename)?)?;

        let mut checksummer = Checksummer::new();
        let outcome = checksummer.verify(reader, &meta)?;
        if !outcome.valid || outcome.unverified > 0 {
            return Err(QcdError::SelfCheckFailed {
                unverified: outcome.unverified,
                total: outcome.records,
            });
        }

        // The first pass consumed the stream; re-open with the same
        // decompression layering to retain the masked lines.
        let (reader, _) = open_input(path)?;
        let mut scanner = LineScanner::new(reader);
        let mut lines = Vec::with_capacity(usize::try_from(outcome.records).unwrap_or(0));
        while let Some(record) = scanner.next_record()? {
            let masked = match checksummer.mask() {
                Some(rule) => rule.apply(record).into_owned(),
                None => record.to_vec(),
            };
            lines.push(String::from_utf8_lossy(&masked).into_owned());
        }

        Ok(Self {
            filename: path.to_path_buf(),
            check_filename,
            checksummer,
            lines,
        })
    }

    /// The data file this source was loaded from.
    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// The side-file the checksums were loaded from.
    #[must_use]
    pub fn check_filename(&self) -> &Path {
        &self.check_filename
    }

    /// The retained (masked) line sequence, in source order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The checksummer populated during self-verification, carrying the
    /// imported membership sketch.
    #[must_use]
    pub fn checksummer(&self) -> &Checksummer {
        &self.checksummer
    }

    /// Emit a reorder-tolerant diff of `self` (left) against `other`
    /// (right) to the sink. See [`crate::diff`] for the line alphabet.
    ///
    /// Returns `true` iff the two sources resolved as the same multiset in
    /// the same order up to in-loop reorder matches.
    ///
    /// # Errors
    ///
    /// Propagates write errors from the sink.
    pub fn diff_against<W: Write>(&self, other: &Source, out: W) -> std::io::Result<bool> {
        diff::diff(self, other, out)
    }
}
