//! Masking of unstable record content before hashing.
//!
//! A mask rule pairs a compiled regex with a literal replacement. Applying it
//! rewrites every non-overlapping, leftmost match so that volatile substrings
//! (timestamps, offsets, sequence numbers) do not perturb the checksum.

use std::borrow::Cow;

use regex::bytes::{NoExpand, Regex};

use crate::error::Result;

/// A regex plus literal replacement applied to records before hashing.
///
/// The replacement is literal: `$1`-style capture references have no special
/// meaning. Matching operates on raw bytes, so records do not need to be
/// valid UTF-8.
///
/// # Example
///
/// ```rust
/// use qcd::MaskRule;
///
/// let mask = MaskRule::new(r"ts=\d+", "ts=*").unwrap();
/// assert_eq!(mask.apply(b"id=1 ts=10").as_ref(), b"id=1 ts=*");
/// ```
#[derive(Debug, Clone)]
pub struct MaskRule {
    pattern: Regex,
    replacement: Vec<u8>,
}

impl MaskRule {
    /// Compile a mask rule from a pattern and a literal replacement.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QcdError::InvalidRegex`] if the pattern does not
    /// compile.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.as_bytes().to_vec(),
        })
    }

    /// Replace every non-overlapping match in `record` with the replacement.
    ///
    /// Returns the record unchanged (borrowed) when nothing matches.
    #[must_use]
    pub fn apply<'a>(&self, record: &'a [u8]) -> Cow<'a, [u8]> {
        self.pattern.replace_all(record, NoExpand(&self.replacement))
    }

    /// The source pattern this rule was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// The literal replacement bytes.
    #[must_use]
    pub fn replacement(&self) -> &[u8] {
        &self.replacement
    }
}
