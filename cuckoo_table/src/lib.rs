//! [CuckooTable] and [CuckooMap] are hash tables based on cuckoo hashing with multi-slot buckets.
//!
//! Every entry has exactly two candidate buckets, one in the lower half of the bucket array and
//! one in the upper half, and is always stored in one of them. Lookups and removals therefore
//! inspect at most `2 * slots_per_bucket` slots.
//!
//! When both candidate buckets of a new entry are full, a bounded breadth-first search looks for
//! the shortest chain of entries that can each move to their alternate bucket, ending in an empty
//! slot. The chain is then rotated by one position, freeing a slot for the new entry. When the
//! search exhausts its budget, the bucket count is doubled and every entry is placed again.
//!
//! [CuckooTable] is the low-level table with explicit hashing: callers pass precomputed hashes and
//! equality predicates, similar to hashbrown's `HashTable`. [CuckooMap] builds a key-value map on
//! top of it, computing hashes using a [`BuildHasher`](std::hash::BuildHasher).
//!
//! Neither type is synchronized; wrap the whole table in a lock to share it between threads.

mod addressing;
mod displacement;
mod slots;
mod util;

pub mod config;
pub mod cuckoo_map;
pub mod cuckoo_table;
pub mod error;

pub use addressing::{candidate_buckets, BucketPair};
pub use config::CuckooConfig;
pub use cuckoo_map::CuckooMap;
pub use cuckoo_table::{CuckooTable, TableStats};
pub use error::CuckooError;

#[cfg(test)]
mod test_map;
