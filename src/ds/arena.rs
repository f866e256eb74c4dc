//! Arena allocator for clock descriptors.
//!
//! A descriptor is created once per observed key and then wanders between
//! the ordering structures by relinking, so its storage must hand out a
//! handle that stays valid for the descriptor's whole lifetime. The arena
//! keeps descriptors in one vector and threads a free chain through the
//! vacated slots: destroying a descriptor donates its slot to the chain,
//! creating one takes the chain head back before the vector grows.
//!
//! ## Architecture
//!
//! ```text
//!   free_head ───► 3 ───► 1 ───► ∅        (chain lives in vacant slots)
//!
//!   slot: 0            1           2            3
//!         [descriptor] [vacant: 1] [descriptor] [vacant: ∅]
//! ```
//!
//! `create` / `destroy` / `get` / `get_mut` are O(1). Because every stored
//! value is [`Linked`], the debug validator can also chase each live
//! descriptor's prev/next links and assert they land on live slots, which
//! catches a descriptor destroyed while still spliced into a list or ring.

use crate::ds::Linked;

/// Stable handle to a descriptor in a [`DescriptorArena`].
///
/// A handle stays valid until its descriptor is destroyed; the slot behind
/// a destroyed handle may be reused by a later `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorId(u32);

impl DescriptorId {
    /// Returns the underlying slot index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
enum Slot<T> {
    Occupied(T),
    Vacant { next_free: Option<u32> },
}

/// Slab of descriptors with an intrusive free chain.
#[derive(Debug)]
pub struct DescriptorArena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T: Linked> DescriptorArena<T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` descriptors.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
        }
    }

    /// Stores a descriptor, reusing the most recently vacated slot when one
    /// exists.
    pub fn create(&mut self, descriptor: T) -> DescriptorId {
        self.len += 1;
        match self.free_head {
            Some(idx) => {
                self.free_head = match &self.slots[idx as usize] {
                    Slot::Vacant { next_free } => *next_free,
                    Slot::Occupied(_) => panic!("free chain points at a live descriptor"),
                };
                self.slots[idx as usize] = Slot::Occupied(descriptor);
                DescriptorId(idx)
            }
            None => {
                self.slots.push(Slot::Occupied(descriptor));
                DescriptorId((self.slots.len() - 1) as u32)
            }
        }
    }

    /// Destroys the descriptor at `id`, vacating its slot for reuse.
    /// Returns `None` if the slot is already vacant or out of bounds.
    pub fn destroy(&mut self, id: DescriptorId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        match std::mem::replace(
            slot,
            Slot::Vacant {
                next_free: self.free_head,
            },
        ) {
            Slot::Occupied(descriptor) => {
                self.free_head = Some(id.0);
                self.len -= 1;
                Some(descriptor)
            }
            Slot::Vacant { next_free } => {
                // Already vacant: restore the chain entry we clobbered.
                *slot = Slot::Vacant { next_free };
                None
            }
        }
    }

    /// Returns a shared reference to the descriptor at `id`, if live.
    pub fn get(&self, id: DescriptorId) -> Option<&T> {
        match self.slots.get(id.index())? {
            Slot::Occupied(descriptor) => Some(descriptor),
            Slot::Vacant { .. } => None,
        }
    }

    /// Returns a mutable reference to the descriptor at `id`, if live.
    pub fn get_mut(&mut self, id: DescriptorId) -> Option<&mut T> {
        match self.slots.get_mut(id.index())? {
            Slot::Occupied(descriptor) => Some(descriptor),
            Slot::Vacant { .. } => None,
        }
    }

    /// Returns `true` if `id` refers to a live descriptor.
    pub fn contains(&self, id: DescriptorId) -> bool {
        matches!(self.slots.get(id.index()), Some(Slot::Occupied(_)))
    }

    /// Number of live descriptors.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no descriptors are live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over live `(DescriptorId, &T)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (DescriptorId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| match slot {
                Slot::Occupied(descriptor) => Some((DescriptorId(idx as u32), descriptor)),
                Slot::Vacant { .. } => None,
            })
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let mut live = 0usize;
        for (_, descriptor) in self.iter() {
            live += 1;
            for link in [descriptor.prev(), descriptor.next()] {
                if let Some(peer) = link {
                    assert!(self.contains(peer), "descriptor linked to a vacant slot");
                }
            }
        }
        assert_eq!(live, self.len);

        let mut vacant = 0usize;
        let mut cursor = self.free_head;
        while let Some(idx) = cursor {
            vacant += 1;
            assert!(vacant <= self.slots.len(), "free chain cycles");
            cursor = match &self.slots[idx as usize] {
                Slot::Vacant { next_free } => *next_free,
                Slot::Occupied(_) => panic!("free chain points at a live descriptor"),
            };
        }
        assert_eq!(live + vacant, self.slots.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Probe {
        key: u64,
        prev: Option<DescriptorId>,
        next: Option<DescriptorId>,
    }

    impl Probe {
        fn new(key: u64) -> Self {
            Self {
                key,
                prev: None,
                next: None,
            }
        }
    }

    impl Linked for Probe {
        fn prev(&self) -> Option<DescriptorId> {
            self.prev
        }
        fn set_prev(&mut self, id: Option<DescriptorId>) {
            self.prev = id;
        }
        fn next(&self) -> Option<DescriptorId> {
            self.next
        }
        fn set_next(&mut self, id: Option<DescriptorId>) {
            self.next = id;
        }
    }

    #[test]
    fn destroy_donates_slot_and_create_takes_it_back() {
        let mut arena = DescriptorArena::new();
        let a = arena.create(Probe::new(1));
        let b = arena.create(Probe::new(2));
        let c = arena.create(Probe::new(3));

        arena.destroy(a);
        arena.destroy(b);
        assert_eq!(arena.len(), 1);

        // The chain hands back the most recently vacated slot first.
        let d = arena.create(Probe::new(4));
        assert_eq!(d.index(), b.index());
        let e = arena.create(Probe::new(5));
        assert_eq!(e.index(), a.index());

        assert_eq!(arena.get(c).map(|p| p.key), Some(3));
        assert_eq!(arena.get(d).map(|p| p.key), Some(4));
        arena.debug_validate_invariants();
    }

    #[test]
    fn destroy_twice_returns_none() {
        let mut arena = DescriptorArena::new();
        let id = arena.create(Probe::new(7));

        assert_eq!(arena.destroy(id).map(|p| p.key), Some(7));
        assert!(arena.destroy(id).is_none());
        assert!(arena.get(id).is_none());
        assert!(!arena.contains(id));
        arena.debug_validate_invariants();
    }

    #[test]
    fn surviving_handles_are_unaffected_by_churn() {
        let mut arena = DescriptorArena::new();
        let keeper = arena.create(Probe::new(42));
        for round in 0..20u64 {
            let id = arena.create(Probe::new(round));
            arena.destroy(id);
        }

        assert_eq!(arena.get(keeper).map(|p| p.key), Some(42));
        assert_eq!(arena.len(), 1);
        arena.debug_validate_invariants();
    }

    #[test]
    fn iter_skips_vacant_slots() {
        let mut arena = DescriptorArena::new();
        let a = arena.create(Probe::new(1));
        let _b = arena.create(Probe::new(2));
        let _c = arena.create(Probe::new(3));
        arena.destroy(a);

        let mut keys: Vec<_> = arena.iter().map(|(_, p)| p.key).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![2, 3]);
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut arena = DescriptorArena::new();
        let id = arena.create(Probe::new(10));
        if let Some(probe) = arena.get_mut(id) {
            probe.key = 20;
        }
        assert_eq!(arena.get(id).map(|p| p.key), Some(20));
    }

    #[test]
    fn validator_catches_links_into_vacant_slots() {
        let mut arena = DescriptorArena::new();
        let a = arena.create(Probe::new(1));
        let b = arena.create(Probe::new(2));
        if let Some(probe) = arena.get_mut(a) {
            probe.set_next(Some(b));
        }
        if let Some(probe) = arena.get_mut(b) {
            probe.set_prev(Some(a));
        }
        arena.debug_validate_invariants();

        // Destroying a still-linked descriptor is the bug the validator
        // exists to catch.
        arena.destroy(b);
        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            arena.debug_validate_invariants();
        }));
        assert!(caught.is_err());
    }
}
