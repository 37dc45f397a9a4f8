//! Record digests: the SHA-256 pipeline behind every checksum artifact.
//!
//! SHA-256 with default parameters keeps digests reproducible across
//! implementations; the aggregate digest, the quick-sum sketch, and the
//! differencer all consume the same 32-byte record digest.

use sha2::{Digest, Sha256};

use crate::mask::MaskRule;

/// The 256-bit SHA-256 digest of one (masked) record.
///
/// # Example
///
/// ```rust
/// use qcd::RecordDigest;
///
/// let d1 = RecordDigest::compute(b"hello world", None);
/// let d2 = RecordDigest::compute(b"hello world", None);
/// assert_eq!(d1, d2);
///
/// let d3 = RecordDigest::compute(b"different data", None);
/// assert_ne!(d1, d3);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordDigest([u8; 32]);

impl RecordDigest {
    /// Hash a record, applying the mask rule (if any) first.
    ///
    /// The pipeline is pure: the entire replacement happens before hashing
    /// and no external state is touched.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qcd::{MaskRule, RecordDigest};
    ///
    /// let mask = MaskRule::new(r"ts=\d+", "ts=*").unwrap();
    /// let a = RecordDigest::compute(b"id=1 ts=10", Some(&mask));
    /// let b = RecordDigest::compute(b"id=1 ts=11", Some(&mask));
    /// assert_eq!(a, b);
    /// ```
    #[must_use]
    pub fn compute(record: &[u8], mask: Option<&MaskRule>) -> Self {
        let digest = match mask {
            Some(rule) => Sha256::digest(rule.apply(record)),
            None => Sha256::digest(record),
        };
        Self(digest.into())
    }

    /// Create a `RecordDigest` from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes of the digest.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create a zero digest (for testing/initialization).
    #[must_use]
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }
}

impl std::fmt::Debug for RecordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RecordDigest({:016x}...)",
            u64::from_be_bytes(self.0[..8].try_into().unwrap_or([0u8; 8]))
        )
    }
}

impl std::fmt::Display for RecordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Default for RecordDigest {
    fn default() -> Self {
        Self::zero()
    }
}

impl AsRef<[u8]> for RecordDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
