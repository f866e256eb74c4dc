//! Circular clock ring scanned by a hand cursor.
//!
//! Like [`RecencyList`](crate::ds::RecencyList), the ring does not own its
//! nodes; it splices values living in a shared [`DescriptorArena`] through their
//! [`Linked`] fields. The ring is fully circular and carries a single hand
//! cursor that always rests on the *oldest* member. Recency is positional:
//! the node just behind the hand (`hand.prev`) is the newest, and the hand
//! sweeping past a node is what makes that node newest again.
//!
//! ## Architecture
//!
//! ```text
//!              hand (oldest)
//!                │
//!                ▼
//!      ┌──► [id_2] ──► [id_5] ──► [id_8] ──┐   next: toward newer
//!      │                                   │
//!      └────── [id_4] ◄── [id_1] ◄─────────┘   hand.prev = newest
//!
//!   insert_newest: splice just behind the hand
//!   advance:       hand moves one step, the passed node becomes newest
//!   unlink:        detach a member; a hand resting on it moves on first
//! ```
//!
//! The hand re-validation in `unlink` is a hard contract: a hand must never
//! be left pointing at a detached node. All operations are O(1).

use crate::ds::arena::{DescriptorArena, DescriptorId};
use crate::ds::Linked;

/// Circular ring with a hand resting on the oldest member.
#[derive(Debug, Default)]
pub struct HandRing {
    hand: Option<DescriptorId>,
    len: usize,
}

impl HandRing {
    /// Creates an empty ring.
    pub fn new() -> Self {
        Self { hand: None, len: 0 }
    }

    /// Returns the number of member nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the ring has no members.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the member under the hand, the oldest node and next scan
    /// victim.
    pub fn oldest(&self) -> Option<DescriptorId> {
        self.hand
    }

    /// Splices a detached node in as the newest member, just behind the
    /// hand.
    pub fn insert_newest<T: Linked>(&mut self, arena: &mut DescriptorArena<T>, id: DescriptorId) {
        match self.hand {
            None => {
                let node = arena.get_mut(id).expect("insert of missing node");
                debug_assert!(node.prev().is_none() && node.next().is_none());
                node.set_prev(Some(id));
                node.set_next(Some(id));
                self.hand = Some(id);
            }
            Some(hand) => {
                let newest = arena
                    .get(hand)
                    .expect("stale hand")
                    .prev()
                    .expect("ring member with no prev link");
                {
                    let node = arena.get_mut(id).expect("insert of missing node");
                    debug_assert!(node.prev().is_none() && node.next().is_none());
                    node.set_prev(Some(newest));
                    node.set_next(Some(hand));
                }
                arena
                    .get_mut(newest)
                    .expect("stale newest link")
                    .set_next(Some(id));
                arena
                    .get_mut(hand)
                    .expect("stale hand")
                    .set_prev(Some(id));
            }
        }
        self.len += 1;
    }

    /// Moves the hand one step toward newer members; the node it leaves
    /// behind becomes the newest.
    ///
    /// Must not be called on an empty ring.
    pub fn advance<T: Linked>(&mut self, arena: &DescriptorArena<T>) {
        let hand = self.hand.expect("advance on empty ring");
        let next = arena
            .get(hand)
            .expect("stale hand")
            .next()
            .expect("ring member with no next link");
        self.hand = Some(next);
    }

    /// Detaches a member node, leaving both of its links `None`.
    ///
    /// If the hand rests on the node, it is moved to the next-oldest member
    /// first (or cleared when the node was the only member).
    pub fn unlink<T: Linked>(&mut self, arena: &mut DescriptorArena<T>, id: DescriptorId) {
        if self.hand == Some(id) {
            self.hand = if self.len == 1 {
                None
            } else {
                arena.get(id).expect("unlink of missing node").next()
            };
        }

        let (prev, next) = {
            let node = arena.get_mut(id).expect("unlink of missing node");
            let links = (
                node.prev().expect("ring member with no prev link"),
                node.next().expect("ring member with no next link"),
            );
            node.set_prev(None);
            node.set_next(None);
            links
        };

        if prev != id {
            arena
                .get_mut(prev)
                .expect("stale prev link")
                .set_next(Some(next));
            arena
                .get_mut(next)
                .expect("stale next link")
                .set_prev(Some(prev));
        }
        self.len -= 1;
    }

    /// Iterates member ids from the hand (oldest) toward newer members.
    pub fn iter<'a, T: Linked>(&self, arena: &'a DescriptorArena<T>) -> HandRingIter<'a, T> {
        HandRingIter {
            arena,
            current: self.hand,
            remaining: self.len,
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate<T: Linked>(&self, arena: &DescriptorArena<T>) {
        match self.hand {
            None => assert_eq!(self.len, 0),
            Some(hand) => {
                assert!(self.len > 0);
                let mut current = hand;
                for _ in 0..self.len {
                    let node = arena.get(current).expect("ring member missing from arena");
                    let next = node.next().expect("ring member with no next link");
                    let next_node = arena.get(next).expect("stale next link");
                    assert_eq!(next_node.prev(), Some(current));
                    current = next;
                }
                // The walk must close the circle in exactly `len` steps.
                assert_eq!(current, hand);
            }
        }
    }
}

pub struct HandRingIter<'a, T> {
    arena: &'a DescriptorArena<T>,
    current: Option<DescriptorId>,
    remaining: usize,
}

impl<T: Linked> Iterator for HandRingIter<'_, T> {
    type Item = DescriptorId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.current?;
        self.remaining -= 1;
        self.current = self.arena.get(id)?.next();
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Probe {
        value: u32,
        prev: Option<DescriptorId>,
        next: Option<DescriptorId>,
    }

    impl Probe {
        fn new(value: u32) -> Self {
            Self {
                value,
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

    fn values(ring: &HandRing, arena: &DescriptorArena<Probe>) -> Vec<u32> {
        ring.iter(arena)
            .map(|id| arena.get(id).unwrap().value)
            .collect()
    }

    #[test]
    fn insert_newest_keeps_hand_on_oldest() {
        let mut arena = DescriptorArena::new();
        let mut ring = HandRing::new();

        for value in [1, 2, 3] {
            let id = arena.create(Probe::new(value));
            ring.insert_newest(&mut arena, id);
        }

        // Hand stays on the first insert; newer members queue behind it.
        assert_eq!(values(&ring, &arena), vec![1, 2, 3]);
        assert_eq!(ring.len(), 3);
        ring.debug_validate(&arena);
    }

    #[test]
    fn advance_recycles_the_oldest() {
        let mut arena = DescriptorArena::new();
        let mut ring = HandRing::new();
        for value in [1, 2, 3] {
            let id = arena.create(Probe::new(value));
            ring.insert_newest(&mut arena, id);
        }

        ring.advance(&arena);
        assert_eq!(values(&ring, &arena), vec![2, 3, 1]);

        ring.advance(&arena);
        ring.advance(&arena);
        assert_eq!(values(&ring, &arena), vec![1, 2, 3]);
        ring.debug_validate(&arena);
    }

    #[test]
    fn unlink_revalidates_the_hand() {
        let mut arena = DescriptorArena::new();
        let mut ring = HandRing::new();
        let a = arena.create(Probe::new(1));
        let b = arena.create(Probe::new(2));
        let c = arena.create(Probe::new(3));
        ring.insert_newest(&mut arena, a);
        ring.insert_newest(&mut arena, b);
        ring.insert_newest(&mut arena, c);

        // Unlinking the node under the hand moves the hand to the next
        // oldest rather than leaving it dangling.
        assert_eq!(ring.oldest(), Some(a));
        ring.unlink(&mut arena, a);
        assert_eq!(ring.oldest(), Some(b));
        assert_eq!(values(&ring, &arena), vec![2, 3]);

        // Unlinking elsewhere leaves the hand alone.
        ring.unlink(&mut arena, c);
        assert_eq!(ring.oldest(), Some(b));
        assert_eq!(ring.len(), 1);

        ring.unlink(&mut arena, b);
        assert_eq!(ring.oldest(), None);
        assert!(ring.is_empty());
        ring.debug_validate(&arena);
    }

    #[test]
    fn solo_member_is_self_linked() {
        let mut arena = DescriptorArena::new();
        let mut ring = HandRing::new();
        let a = arena.create(Probe::new(1));
        ring.insert_newest(&mut arena, a);

        assert_eq!(arena.get(a).unwrap().prev(), Some(a));
        assert_eq!(arena.get(a).unwrap().next(), Some(a));
        assert_eq!(values(&ring, &arena), vec![1]);
        ring.debug_validate(&arena);
    }

    #[test]
    fn insert_after_advance_lands_behind_the_hand() {
        let mut arena = DescriptorArena::new();
        let mut ring = HandRing::new();
        for value in [1, 2] {
            let id = arena.create(Probe::new(value));
            ring.insert_newest(&mut arena, id);
        }

        // Pass over node 1, then insert node 3: passed-over 1 must be older
        // than the fresh insert.
        ring.advance(&arena);
        let c = arena.create(Probe::new(3));
        ring.insert_newest(&mut arena, c);
        assert_eq!(values(&ring, &arena), vec![2, 1, 3]);
        ring.debug_validate(&arena);
    }
}
