//! Doubly linked recency order over an external arena.
//!
//! The list does not own its nodes: it stores only head/tail handles and a
//! length, and splices values that live in a shared [`DescriptorArena`] through
//! their intrusive [`Linked`] fields. This lets several lists share one
//! arena, so moving a value from list to list is a relink that preserves
//! its `DescriptorId`.
//!
//! ## Architecture
//!
//! ```text
//!   head (most recent)                          tail (oldest)
//!     │                                            │
//!     ▼                                            ▼
//!   [id_4] ◄──► [id_1] ◄──► [id_7] ◄──► ... ◄──► [id_2]
//!
//!   push_front: link a detached node at head
//!   unlink:     detach any member node
//!   tail:       the next scan victim
//! ```
//!
//! All operations are O(1) except `iter`. The caller is responsible for
//! only passing ids that are members of *this* list (or detached, for
//! `push_front`); `debug_validate` checks structural consistency in
//! debug/test builds.

use crate::ds::arena::{DescriptorArena, DescriptorId};
use crate::ds::Linked;

/// Recency order (head = most recent, tail = oldest) over arena values.
#[derive(Debug, Default)]
pub struct RecencyList {
    head: Option<DescriptorId>,
    tail: Option<DescriptorId>,
    len: usize,
}

impl RecencyList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Returns the number of member nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list has no members.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the most recent member.
    pub fn head(&self) -> Option<DescriptorId> {
        self.head
    }

    /// Returns the oldest member, the next scan victim.
    pub fn tail(&self) -> Option<DescriptorId> {
        self.tail
    }

    /// Links a detached node at the head (most recent position).
    pub fn push_front<T: Linked>(&mut self, arena: &mut DescriptorArena<T>, id: DescriptorId) {
        let old_head = self.head;
        {
            let node = arena.get_mut(id).expect("push_front on missing node");
            debug_assert!(node.prev().is_none() && node.next().is_none());
            node.set_prev(None);
            node.set_next(old_head);
        }
        match old_head {
            Some(head) => {
                let head_node = arena.get_mut(head).expect("stale head");
                head_node.set_prev(Some(id));
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
    }

    /// Detaches a member node, leaving both of its links `None`.
    pub fn unlink<T: Linked>(&mut self, arena: &mut DescriptorArena<T>, id: DescriptorId) {
        let (prev, next) = {
            let node = arena.get_mut(id).expect("unlink on missing node");
            let links = (node.prev(), node.next());
            node.set_prev(None);
            node.set_next(None);
            links
        };

        match prev {
            Some(prev_id) => {
                let prev_node = arena.get_mut(prev_id).expect("stale prev link");
                prev_node.set_next(next);
            }
            None => self.head = next,
        }
        match next {
            Some(next_id) => {
                let next_node = arena.get_mut(next_id).expect("stale next link");
                next_node.set_prev(prev);
            }
            None => self.tail = prev,
        }
        self.len -= 1;
    }

    /// Iterates member ids from head (most recent) to tail (oldest).
    pub fn iter<'a, T: Linked>(&self, arena: &'a DescriptorArena<T>) -> RecencyIter<'a, T> {
        RecencyIter {
            arena,
            current: self.head,
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate<T: Linked>(&self, arena: &DescriptorArena<T>) {
        if self.head.is_none() || self.tail.is_none() {
            assert!(self.head.is_none());
            assert!(self.tail.is_none());
            assert_eq!(self.len, 0);
            return;
        }

        let mut seen = std::collections::HashSet::new();
        let mut count = 0usize;
        let mut current = self.head;
        let mut prev = None;

        while let Some(id) = current {
            assert!(seen.insert(id));
            let node = arena.get(id).expect("member node missing from arena");
            assert_eq!(node.prev(), prev);
            prev = Some(id);
            current = node.next();
            count += 1;
            assert!(count <= self.len);
        }

        assert_eq!(prev, self.tail);
        assert_eq!(count, self.len);
    }
}

pub struct RecencyIter<'a, T> {
    arena: &'a DescriptorArena<T>,
    current: Option<DescriptorId>,
}

impl<T: Linked> Iterator for RecencyIter<'_, T> {
    type Item = DescriptorId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.arena.get(id)?.next();
        Some(id)
    }
}


#[cfg(test)]
mod property_tests {
    use super::tests_support::*;
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The list agrees with a VecDeque reference model under random
        /// push_front / unlink-oldest / unlink-random sequences.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_matches_reference_deque(ops in prop::collection::vec(0u8..3, 0..200)) {
            let mut arena = DescriptorArena::new();
            let mut list = RecencyList::new();
            let mut model: std::collections::VecDeque<DescriptorId> = Default::default();

            for op in ops {
                match op {
                    0 => {
                        let id = arena.create(node());
                        list.push_front(&mut arena, id);
                        model.push_front(id);
                    }
                    1 => {
                        if let Some(id) = model.pop_back() {
                            prop_assert_eq!(list.tail(), Some(id));
                            list.unlink(&mut arena, id);
                            arena.destroy(id);
                        }
                    }
                    _ => {
                        if !model.is_empty() {
                            let pick = model.len() / 2;
                            let id = model.remove(pick).unwrap();
                            list.unlink(&mut arena, id);
                            arena.destroy(id);
                        }
                    }
                }

                prop_assert_eq!(list.len(), model.len());
                let order: Vec<_> = list.iter(&arena).collect();
                let expected: Vec<_> = model.iter().copied().collect();
                prop_assert_eq!(order, expected);
                list.debug_validate(&arena);
            }
        }
    }
}
