//! Lock-free issuer of [`PersistentId`]s.
//!
//! Ids are handed out in strictly increasing order and never reissued, so an
//! id retired by a release or sweep can never alias a later entity. `next`
//! touches only an atomic counter and may run concurrently with anything,
//! including a writer holding the graph lock.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::topo_error::TopoError;
use crate::topology::id::PersistentId;

/// Monotonic 64-bit id source.
#[derive(Debug)]
pub struct PersistentIdAllocator {
    /// Raw value the next call to [`next`](Self::next) returns. Zero means exhausted.
    next: AtomicU64,
}

impl PersistentIdAllocator {
    /// Allocator whose first id is `1`.
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocator whose first id is `first`.
    pub fn starting_at(first: PersistentId) -> Self {
        Self {
            next: AtomicU64::new(first.get()),
        }
    }

    /// Issue the next id.
    ///
    /// # Errors
    /// [`TopoError::IdSpaceExhausted`] once `u64::MAX` has been issued.
    pub fn next(&self) -> Result<PersistentId, TopoError> {
        let raw = self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                // `cur == 0` marks exhaustion; `u64::MAX` is the last issuable id.
                (cur != 0).then(|| cur.wrapping_add(1))
            })
            .map_err(|_| TopoError::IdSpaceExhausted)?;
        PersistentId::new(raw)
    }

    /// The id the next call to [`next`](Self::next) would return, if any.
    pub fn peek(&self) -> Option<PersistentId> {
        PersistentId::new(self.next.load(Ordering::Acquire)).ok()
    }

    /// Whether `id` has already been handed out by this allocator.
    pub fn has_issued(&self, id: PersistentId) -> bool {
        match self.next.load(Ordering::Acquire) {
            0 => true,
            next => id.get() < next,
        }
    }

    /// Number of ids issued so far, counting from 1.
    pub fn issued(&self) -> u64 {
        match self.next.load(Ordering::Acquire) {
            0 => u64::MAX,
            next => next - 1,
        }
    }

    /// Make sure `id` and everything below it count as issued.
    ///
    /// Used when adopting ids that were minted elsewhere, e.g. when rebuilding
    /// a graph from exported records.
    pub fn reserve_through(&self, id: PersistentId) {
        let wanted = id.get().wrapping_add(1);
        let _ = self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                if cur == 0 || (wanted != 0 && wanted <= cur) {
                    None
                } else {
                    Some(wanted)
                }
            });
    }
}

impl Default for PersistentIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn pid(raw: u64) -> PersistentId {
        PersistentId::new(raw).unwrap()
    }

    #[test]
    fn issues_increasing_ids_from_one() {
        let alloc = PersistentIdAllocator::new();
        assert_eq!(alloc.next().unwrap(), pid(1));
        assert_eq!(alloc.next().unwrap(), pid(2));
        assert_eq!(alloc.peek(), Some(pid(3)));
        assert_eq!(alloc.issued(), 2);
        assert!(alloc.has_issued(pid(2)));
        assert!(!alloc.has_issued(pid(3)));
    }

    #[test]
    fn exhaustion_is_an_error_not_a_wrap() {
        let alloc = PersistentIdAllocator::starting_at(pid(u64::MAX));
        assert_eq!(alloc.next().unwrap(), pid(u64::MAX));
        assert_eq!(alloc.next(), Err(TopoError::IdSpaceExhausted));
        assert_eq!(alloc.next(), Err(TopoError::IdSpaceExhausted));
        assert_eq!(alloc.peek(), None);
        assert!(alloc.has_issued(pid(5)));
    }

    #[test]
    fn reserve_through_only_moves_forward() {
        let alloc = PersistentIdAllocator::new();
        alloc.reserve_through(pid(10));
        assert_eq!(alloc.next().unwrap(), pid(11));
        alloc.reserve_through(pid(3));
        assert_eq!(alloc.next().unwrap(), pid(12));
        alloc.reserve_through(pid(u64::MAX));
        assert_eq!(alloc.next(), Err(TopoError::IdSpaceExhausted));
    }

    #[test]
    fn concurrent_allocation_is_unique() {
        let alloc = Arc::new(PersistentIdAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let alloc = Arc::clone(&alloc);
                std::thread::spawn(move || {
                    (0..500).map(|_| alloc.next().unwrap()).collect::<Vec<_>>()
                })
            })
            .collect();
        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 4000);
        assert_eq!(alloc.issued(), 4000);
    }
}
