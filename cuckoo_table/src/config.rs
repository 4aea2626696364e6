//! Construction-time parameters of a cuckoo table.
use crate::CuckooError;

/// Default number of buckets.
pub const DEFAULT_BUCKET_COUNT: usize = 1024;
/// Default number of slots in each bucket.
pub const DEFAULT_SLOTS_PER_BUCKET: usize = 4;
/// Default number of paths a displacement search may expand before the table grows.
pub const DEFAULT_MAX_DISPLACEMENTS: usize = 500;

/// Occupancy targeted by [`CuckooConfig::for_capacity`] and by `reserve`, as a fraction
/// `TARGET_LOAD_NUM / TARGET_LOAD_DEN`.
pub(crate) const TARGET_LOAD_NUM: usize = 17;
pub(crate) const TARGET_LOAD_DEN: usize = 20;

/// Parameters of a cuckoo table.
///
/// Resizing is costly, so if the expected number of entries is known up front, pick a geometry
/// where it fills about 85-90% of the `bucket_count * slots_per_bucket` slots, e.g. using
/// [`for_capacity`](Self::for_capacity).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CuckooConfig {
    /// Initial number of buckets. Must be even and at least 2; doubles on every growth.
    pub bucket_count: usize,
    /// Number of slots in every bucket. Must be at least 1 and never changes.
    pub slots_per_bucket: usize,
    /// Number of paths a displacement search may expand before the table grows.
    pub max_displacements: usize,
}

impl Default for CuckooConfig {
    fn default() -> Self {
        CuckooConfig {
            bucket_count: DEFAULT_BUCKET_COUNT,
            slots_per_bucket: DEFAULT_SLOTS_PER_BUCKET,
            max_displacements: DEFAULT_MAX_DISPLACEMENTS,
        }
    }
}

impl CuckooConfig {
    /// Returns the default configuration with the given geometry.
    pub fn new(bucket_count: usize, slots_per_bucket: usize) -> Self {
        CuckooConfig {
            bucket_count,
            slots_per_bucket,
            ..Self::default()
        }
    }

    /// Returns a default-geometry configuration sized so that `entries` entries fill at most 85%
    /// of the slots.
    pub fn for_capacity(entries: usize) -> Self {
        let slots_per_bucket = DEFAULT_SLOTS_PER_BUCKET;
        let slots = entries
            .saturating_mul(TARGET_LOAD_DEN)
            .div_ceil(TARGET_LOAD_NUM);
        let buckets = slots.div_ceil(slots_per_bucket).max(2);
        CuckooConfig {
            bucket_count: buckets.saturating_add(buckets & 1),
            slots_per_bucket,
            ..Self::default()
        }
    }

    /// Replaces the initial bucket count.
    pub fn with_bucket_count(self, bucket_count: usize) -> Self {
        CuckooConfig {
            bucket_count,
            ..self
        }
    }

    /// Replaces the number of slots per bucket.
    pub fn with_slots_per_bucket(self, slots_per_bucket: usize) -> Self {
        CuckooConfig {
            slots_per_bucket,
            ..self
        }
    }

    /// Replaces the displacement search budget.
    pub fn with_max_displacements(self, max_displacements: usize) -> Self {
        CuckooConfig {
            max_displacements,
            ..self
        }
    }

    /// Checks that the configuration describes a usable table.
    pub fn validate(&self) -> Result<(), CuckooError> {
        let valid = self.bucket_count >= 2
            && self.bucket_count % 2 == 0
            && self.slots_per_bucket >= 1
            && self.max_displacements >= 1
            && self.bucket_count.checked_mul(self.slots_per_bucket).is_some();
        if valid {
            Ok(())
        } else {
            Err(CuckooError::InvalidConfig {
                bucket_count: self.bucket_count,
                slots_per_bucket: self.slots_per_bucket,
            })
        }
    }
}
