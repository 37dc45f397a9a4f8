//! The order-independent aggregate digest.
//!
//! A 32-byte accumulator combined by bitwise XOR of per-record digests. XOR
//! is commutative and associative, so the final value is invariant under any
//! permutation of the input records.

use crate::hash::RecordDigest;

/// 32-byte XOR accumulator over record digests.
///
/// Starts all-zero; after folding records with digests d1..dn the value is
/// d1 XOR d2 XOR ... XOR dn. Two identical records cancel to zero, so equal
/// aggregates with differing `total_records` counts indicate duplicate
/// drift rather than identical content.
///
/// # Example
///
/// ```rust
/// use qcd::{AggregateDigest, RecordDigest};
///
/// let a = RecordDigest::compute(b"a", None);
/// let b = RecordDigest::compute(b"b", None);
///
/// let mut fwd = AggregateDigest::new();
/// fwd.fold(&a);
/// fwd.fold(&b);
///
/// let mut rev = AggregateDigest::new();
/// rev.fold(&b);
/// rev.fold(&a);
///
/// assert_eq!(fwd, rev);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateDigest([u8; 32]);

impl AggregateDigest {
    /// Create an empty (all-zero) aggregate.
    #[must_use]
    pub const fn new() -> Self {
        Self([0u8; 32])
    }

    /// XOR a record digest into the aggregate.
    pub fn fold(&mut self, digest: &RecordDigest) {
        for (acc, byte) in self.0.iter_mut().zip(digest.as_bytes()) {
            *acc ^= byte;
        }
    }

    /// Serialize as 64 lowercase hex characters, no `0x` prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// Compare against a previously recorded hex serialization.
    ///
    /// Equality in verification is a byte-wise comparison of the two hex
    /// strings, so anything but exactly 64 lowercase hex chars mismatches.
    #[must_use]
    pub fn matches_hex(&self, recorded: &str) -> bool {
        self.to_hex() == recorded
    }

    /// Get the raw bytes of the aggregate.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check whether the aggregate is all-zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl std::fmt::Display for AggregateDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_zero() {
        let agg = AggregateDigest::new();
        assert!(agg.is_zero());
        assert_eq!(agg.to_hex(), "0".repeat(64));
    }

    #[test]
    fn single_fold_equals_digest() {
        let d = RecordDigest::compute(b"a", None);
        let mut agg = AggregateDigest::new();
        agg.fold(&d);
        assert_eq!(agg.to_hex(), d.to_string());
    }

    #[test]
    fn identical_pair_cancels() {
        let d = RecordDigest::compute(b"same", None);
        let mut agg = AggregateDigest::new();
        agg.fold(&d);
        agg.fold(&d);
        assert!(agg.is_zero());
    }

    #[test]
    fn matches_hex_exact() {
        let d = RecordDigest::compute(b"x", None);
        let mut agg = AggregateDigest::new();
        agg.fold(&d);
        assert!(agg.matches_hex(&agg.to_hex()));
        assert!(!agg.matches_hex(&agg.to_hex().to_uppercase()));
        assert!(!agg.matches_hex(""));
    }

    #[test]
    fn hex_length() {
        let mut agg = AggregateDigest::new();
        agg.fold(&RecordDigest::compute(b"abc", None));
        assert_eq!(agg.to_hex().len(), 64);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn fold_all(records: &[Vec<u8>]) -> AggregateDigest {
        let mut agg = AggregateDigest::new();
        for r in records {
            agg.fold(&RecordDigest::compute(r, None));
        }
        agg
    }

    proptest! {
        /// The aggregate is invariant under permutation.
        #[test]
        fn order_independent(
            records in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..50), 0..20),
            seed in any::<u64>()
        ) {
            let fwd = fold_all(&records);

            // Deterministic shuffle driven by the seed.
            let mut shuffled = records.clone();
            let mut state = seed | 1;
            for i in (1..shuffled.len()).rev() {
                state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                #[allow(clippy::cast_possible_truncation)]
                let j = (state % (i as u64 + 1)) as usize;
                shuffled.swap(i, j);
            }

            prop_assert_eq!(fwd, fold_all(&shuffled));
        }

        /// Folding a digest twice is the identity.
        #[test]
        fn self_inverse(data in prop::collection::vec(any::<u8>(), 0..100)) {
            let d = RecordDigest::compute(&data, None);
            let mut agg = AggregateDigest::new();
            agg.fold(&d);
            agg.fold(&d);
            prop_assert!(agg.is_zero());
        }
    }
}
