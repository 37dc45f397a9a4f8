//! The Checksummer: order-independent summing and verification of streams.
//!
//! A `Checksummer` is single-use per stream: created empty, mutated by
//! [`Checksummer::sum`] or [`Checksummer::verify`], observed by
//! [`Checksummer::info`].

use std::collections::BTreeMap;
use std::io::{Read, Write};

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::aggregate::AggregateDigest;
use crate::codec;
use crate::error::Result;
use crate::hash::RecordDigest;
use crate::mask::MaskRule;
use crate::scan::LineScanner;
use crate::sketch::{false_positive_rate, Sketch, SketchKind};

/// Stringly-typed checksum metadata, serialized as JSON in the side-file.
///
/// A `BTreeMap` keeps the emitted JSON deterministic. Unknown keys are
/// ignored on read; missing optional keys are treated as absent.
pub type Metadata = BTreeMap<String, String>;

/// Outcome of a verification pass.
///
/// Verification results are values, not errors: a mismatching stream is a
/// normal answer, while I/O and decode failures surface as [`crate::QcdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    /// Whether the aggregate digest matched the recorded `content_hash`.
    pub valid: bool,
    /// Lines whose per-record membership test failed.
    ///
    /// Forced to zero when the aggregate matches: false negatives of the
    /// aggregate are impossible, so remaining per-record misses are benign
    /// sketch aliasing and not reported as errors.
    pub unverified: u64,
    /// Lines scanned in this pass.
    pub records: u64,
}

/// Checksums the contents of a data stream independent of record order.
///
/// [`Checksummer::info`] reports the accumulated state as a metadata map:
///
/// | key                | meaning                                              |
/// |--------------------|------------------------------------------------------|
/// | `when_checked`     | UTC timestamp (RFC 3339) when stats were produced    |
/// | `content_hash`     | order-independent aggregate digest, 64 hex chars     |
/// | `records_hash`     | encoded membership sketch; empty when disabled       |
/// | `total_records`    | decimal record count                                 |
/// | `records_esterr`   | modelled false-positive rate of the exported sketch  |
/// | `mask_regex`       | masking pattern, if any                              |
/// | `mask_replacement` | replacement text for masked content, if any          |
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
///
/// use qcd::Checksummer;
///
/// let mut ck = Checksummer::new();
/// ck.sum(Cursor::new("a\nb\n")).unwrap();
/// assert_eq!(ck.record_count(), 2);
/// ```
pub struct Checksummer {
    sum: AggregateDigest,
    mask: Option<MaskRule>,
    sketch: Sketch,
    nrecs: u64,
    verbose: Option<Box<dyn Write>>,
}

impl Checksummer {
    /// Create a checksummer with the auto-selecting sketch.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sketch(SketchKind::Auto)
    }

    /// Create a checksummer with an explicit sketch capacity.
    ///
    /// The capacity must be chosen before scanning begins; it is effectively
    /// immutable during a run.
    #[must_use]
    pub fn with_sketch(kind: SketchKind) -> Self {
        Self {
            sum: AggregateDigest::new(),
            mask: None,
            sketch: Sketch::new(kind),
            nrecs: 0,
            verbose: None,
        }
    }

    /// Set a regex whose matches are replaced in every record before
    /// hashing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QcdError::InvalidRegex`] if the pattern does not
    /// compile; the previous mask (if any) is left untouched.
    pub fn set_mask(&mut self, pattern: &str, replacement: &str) -> Result<()> {
        self.mask = Some(MaskRule::new(pattern, replacement)?);
        Ok(())
    }

    /// Attach a sink receiving one `UNVERIFIED: <line>: <text>` diagnostic
    /// per record that fails its membership test during verification.
    pub fn set_verbose<W: Write + 'static>(&mut self, sink: W) {
        self.verbose = Some(Box::new(sink));
    }

    /// The active mask rule, if any.
    #[must_use]
    pub fn mask(&self) -> Option<&MaskRule> {
        self.mask.as_ref()
    }

    /// The membership sketch in its current state.
    #[must_use]
    pub fn sketch(&self) -> &Sketch {
        &self.sketch
    }

    /// The aggregate digest in its current state.
    #[must_use]
    pub fn aggregate(&self) -> &AggregateDigest {
        &self.sum
    }

    /// Records observed so far.
    #[must_use]
    pub const fn record_count(&self) -> u64 {
        self.nrecs
    }

    /// Scan records from the reader until EOF, folding each into the
    /// aggregate digest and the sketch.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors and oversized records.
    pub fn sum<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut scanner = LineScanner::new(reader);
        while let Some(record) = scanner.next_record()? {
            let digest = RecordDigest::compute(record, self.mask.as_ref());
            self.nrecs += 1;
            self.sketch.add(&digest);
            self.sum.fold(&digest);
        }
        Ok(())
    }

    /// Scan records from the reader and verify them against previously
    /// recorded metadata.
    ///
    /// The sketch is reconstructed from `records_hash` (disabled when empty
    /// or absent). If the metadata carries a `mask_regex` and no mask is set
    /// yet, it is installed together with `mask_replacement`, so a verifier
    /// need not be told the mask out-of-band.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors, oversized records, sketch decode failures,
    /// and invalid recorded mask patterns.
    pub fn verify<R: Read>(&mut self, reader: R, meta: &Metadata) -> Result<Verification> {
        let blob = meta.get("records_hash").map_or("", String::as_str);
        self.sketch = codec::unpack(blob)?;

        if self.mask.is_none() {
            if let Some(pattern) = meta.get("mask_regex").filter(|p| !p.is_empty()) {
                let replacement = meta.get("mask_replacement").map_or("", String::as_str);
                self.set_mask(pattern, replacement)?;
            }
        }

        let mut scanner = LineScanner::new(reader);
        let mut nlines = 0u64;
        let mut noverify = 0u64;
        while let Some(record) = scanner.next_record()? {
            nlines += 1;
            let digest = RecordDigest::compute(record, self.mask.as_ref());
            self.nrecs += 1;
            let known = self.sketch.contains(&digest);
            self.sum.fold(&digest);
            if !known {
                noverify += 1;
                if let Some(sink) = self.verbose.as_mut() {
                    writeln!(
                        sink,
                        "UNVERIFIED: {nlines:5}: {}",
                        String::from_utf8_lossy(record)
                    )?;
                }
            }
        }

        let recorded = meta.get("content_hash").map_or("", String::as_str);
        let valid = self.sum.matches_hex(recorded);
        if valid {
            info!("CHECKSUM OK");
            noverify = 0;
        } else {
            warn!("CHECKSUM FAILED");
            warn!("{noverify}/{} records failed verification", self.nrecs);
        }

        Ok(Verification {
            valid,
            unverified: noverify,
            records: nlines,
        })
    }

    /// Statistics about the checksums calculated so far, keyed as described
    /// on [`Checksummer`].
    ///
    /// `records_esterr` is computed from the parameters of the sketch
    /// variant that is actually exported.
    ///
    /// # Errors
    ///
    /// Returns an error if the sketch fails to encode.
    pub fn info(&self) -> Result<Metadata> {
        let mut meta = Metadata::new();
        meta.insert(
            "when_checked".to_string(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        meta.insert("content_hash".to_string(), self.sum.to_hex());
        meta.insert("total_records".to_string(), self.nrecs.to_string());

        if !self.sketch.is_disabled() {
            let est = false_positive_rate(self.sketch.keys(), self.sketch.bits(), self.nrecs);
            meta.insert("records_esterr".to_string(), est.to_string());
            meta.insert("records_hash".to_string(), codec::pack(&self.sketch)?);
        }

        if let Some(mask) = &self.mask {
            meta.insert("mask_regex".to_string(), mask.pattern().to_string());
            meta.insert(
                "mask_replacement".to_string(),
                String::from_utf8_lossy(mask.replacement()).into_owned(),
            );
        }

        Ok(meta)
    }
}

impl Default for Checksummer {
    fn default() -> Self {
        Self::new()
    }
}
