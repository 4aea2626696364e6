//! Mapping of hashes to candidate buckets.

/// The two candidate buckets of an entry.
///
/// `first` is always in the lower half and `second` always in the upper half of the bucket array,
/// so the two are never equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BucketPair {
    /// Candidate bucket in `0..half`.
    pub first: usize,
    /// Candidate bucket in `half..2 * half`.
    pub second: usize,
}

impl BucketPair {
    /// Returns the candidate that is not `bucket`.
    ///
    /// `bucket` must be one of the two candidates.
    #[inline(always)]
    pub fn other(self, bucket: usize) -> usize {
        debug_assert!(bucket == self.first || bucket == self.second);
        if bucket == self.first {
            self.second
        } else {
            self.first
        }
    }

    /// Returns both candidates, lower half first.
    #[inline(always)]
    pub fn as_array(self) -> [usize; 2] {
        [self.first, self.second]
    }
}

/// Scales a 32-bit value into `0..n` using a fixed-point multiply instead of a modulo.
#[inline(always)]
fn reduce(value: u32, n: usize) -> usize {
    ((value as u128 * n as u128) >> 32) as usize
}

/// Computes the candidate buckets for `hash` in a table with `2 * half` buckets.
///
/// The low 32 bits of the hash select a bucket in the lower half, the high 32 bits select a bucket
/// in the upper half.
#[inline(always)]
pub fn candidate_buckets(hash: u64, half: usize) -> BucketPair {
    debug_assert!(half > 0);
    let lo = hash as u32;
    let hi = (hash >> 32) as u32;
    BucketPair {
        first: reduce(lo, half),
        second: reduce(hi, half) + half,
    }
}
