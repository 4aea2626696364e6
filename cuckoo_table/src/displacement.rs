//! Breadth-first search for relocation chains.
//!
//! When both candidate buckets of a new entry are full, some entry in them has to move to its
//! alternate bucket, which may in turn require moving an entry out of that bucket, and so on. We
//! search the graph whose nodes are slots and whose edges lead from an occupied slot to every slot
//! of its occupant's alternate bucket, starting at the slots of the new entry's candidates. The
//! first empty slot reached terminates the search, which yields a shortest chain.
use std::{collections::VecDeque, hash::BuildHasherDefault};

use hashbrown::HashSet;
use zwohash::ZwoHasher;

use crate::{addressing::candidate_buckets, slots::Slots, BucketPair};

/// A node of the search tree. Following `parent` links from a node yields the reversed chain.
#[derive(Clone, Copy, Debug)]
struct PathNode {
    slot: usize,
    parent: Option<usize>,
}

/// A relocation chain found by [`find_chain`].
#[derive(Clone, Debug)]
pub struct Chain {
    /// Slot indices from a slot of one of the new entry's candidate buckets to an empty slot.
    path: Vec<usize>,
    /// Number of search tree nodes that were popped from the frontier.
    expansions: usize,
}

impl Chain {
    /// Number of entries moved when applying the chain.
    pub fn moved_entries(&self) -> usize {
        self.path.len() - 1
    }

    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// Shifts every entry on the chain one position towards its end and places `entry` into the
    /// vacated first slot. Returns the index of that slot.
    ///
    /// Must be applied to the unmodified storage the chain was found in.
    pub fn migrate<T>(&self, slots: &mut Slots<T>, entry: T) -> usize {
        debug_assert!(slots.slot(self.path[self.path.len() - 1]).is_empty());
        for step in self.path.windows(2).rev() {
            slots.relocate(step[0], step[1]);
        }
        let start = self.path[0];
        slots.occupy(start, entry);
        start
    }
}

/// Searches for the shortest relocation chain that frees a slot in one of the buckets of `pair`.
///
/// Expands at most `budget` nodes. If no chain is found, either because the budget ran out or
/// because every reachable slot was expanded, returns the number of expansions performed.
/// `hasher` has to return the hash used to place each stored entry.
pub fn find_chain<T>(
    slots: &Slots<T>,
    pair: BucketPair,
    budget: usize,
    hasher: impl Fn(&T) -> u64,
) -> Result<Chain, usize> {
    let half = slots.half_bucket_count();
    let mut search = Search::default();

    for bucket in pair.as_array() {
        for slot in slots.bucket_range(bucket) {
            search.enqueue(slot, None);
        }
    }

    let mut expansions = 0;
    while expansions < budget {
        let Some(node) = search.frontier.pop_front() else {
            break;
        };
        expansions += 1;
        let slot = search.nodes[node].slot;

        let Some(victim) = slots.get(slot) else {
            return Ok(Chain {
                path: search.path_to(node),
                expansions,
            });
        };

        let alternate = candidate_buckets(hasher(victim), half).other(slots.bucket_of(slot));
        for next in slots.bucket_range(alternate) {
            search.enqueue(next, Some(node));
        }
    }

    Err(expansions)
}

#[derive(Default)]
struct Search {
    nodes: Vec<PathNode>,
    frontier: VecDeque<usize>,
    visited: HashSet<usize, BuildHasherDefault<ZwoHasher>>,
}

impl Search {
    /// Adds a node for `slot` unless the slot is already part of the search tree.
    fn enqueue(&mut self, slot: usize, parent: Option<usize>) {
        if self.visited.insert(slot) {
            self.frontier.push_back(self.nodes.len());
            self.nodes.push(PathNode { slot, parent });
        }
    }

    fn path_to(&self, node: usize) -> Vec<usize> {
        let mut path = vec![];
        let mut cursor = Some(node);
        while let Some(index) = cursor {
            path.push(self.nodes[index].slot);
            cursor = self.nodes[index].parent;
        }
        path.reverse();
        path
    }
}
