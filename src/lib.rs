//! # qcd
//!
//! Order-independent content checksums for line-oriented data.
//!
//! qcd fingerprints a stream of records (lines) so that a second stream can
//! later be checked for being the *same multiset* of records, tolerating
//! reordering, pinpointing which lines changed, and optionally masking
//! unstable substrings (timestamps, offsets) before hashing.
//!
//! Two artifacts are produced per stream:
//!
//! - an **aggregate digest**: the bitwise XOR of every record's SHA-256,
//!   order-invariant by construction, and
//! - a **quick-sum sketch**: a size-adaptive Bloom filter over the record
//!   digests that lets a verifier test per-record membership without
//!   retaining any plaintext.
//!
//! ## Example
//!
//! ```rust
//! use std::io::Cursor;
//!
//! use qcd::Checksummer;
//!
//! // Fingerprint a stream.
//! let mut producer = Checksummer::new();
//! producer.sum(Cursor::new("a\nb\nc\n")).unwrap();
//! let meta = producer.info().unwrap();
//!
//! // Verify a reordered copy against the recorded metadata.
//! let mut verifier = Checksummer::new();
//! let outcome = verifier.verify(Cursor::new("c\na\nb\n"), &meta).unwrap();
//! assert!(outcome.valid);
//! assert_eq!(outcome.unverified, 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

mod aggregate;
mod checksum;
pub mod codec;
mod diff;
mod error;
mod hash;
mod mask;
mod scan;
mod sketch;
mod source;

pub use aggregate::AggregateDigest;
pub use checksum::{Checksummer, Metadata, Verification};
pub use diff::diff;
pub use error::{QcdError, Result};
pub use hash::RecordDigest;
pub use mask::MaskRule;
pub use scan::{LineScanner, MAX_RECORD_LENGTH};
pub use sketch::{false_positive_rate, Sketch, SketchKind};
pub use source::{open_input, Source};
