//! Errors reported by cuckoo tables.

/// Error cases of [`CuckooTable`](crate::CuckooTable) and [`CuckooMap`](crate::CuckooMap)
/// operations.
///
/// Only [`NotFound`](Self::NotFound) is an expected outcome. The remaining variants are fatal for
/// the operation that reported them, but the table keeps its previous contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CuckooError {
    /// The requested key is not present.
    #[error("key not found")]
    NotFound,
    /// The bucket count cannot be doubled, or an entry could still not be placed after doubling
    /// it once.
    #[error("table cannot grow beyond {bucket_count} buckets")]
    OutOfCapacity {
        /// Bucket count at the time of the failure.
        bucket_count: usize,
    },
    /// Allocating slot storage failed.
    #[error("failed to allocate storage for {slots} slots")]
    AllocationFailed {
        /// Number of slots requested.
        slots: usize,
    },
    /// The requested configuration is not usable.
    #[error(
        "invalid table configuration: {bucket_count} buckets with {slots_per_bucket} slots each \
         (bucket count must be even and at least 2, slots per bucket and displacement budget \
         at least 1)"
    )]
    InvalidConfig {
        /// Requested bucket count.
        bucket_count: usize,
        /// Requested slots per bucket.
        slots_per_bucket: usize,
    },
}
