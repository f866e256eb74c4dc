//! Data structures underpinning the replacement policies.
//!
//! The policies keep every descriptor in one [`DescriptorArena`] and
//! thread the ordering structures through the descriptors themselves: a
//! descriptor carries its own prev/next links (the [`Linked`] trait) and
//! is a member of at most one [`RecencyList`] or [`HandRing`] at a time.
//! Moving a descriptor between lists is a relink, never a reallocation, so
//! the [`DescriptorId`] handed out at creation stays valid for the
//! descriptor's whole lifetime.

pub mod arena;
pub mod hand_ring;
pub mod recency_list;

pub use arena::{DescriptorArena, DescriptorId};
pub use hand_ring::HandRing;
pub use recency_list::RecencyList;

/// Intrusive prev/next links stored inside arena values.
///
/// Implemented by descriptor types so [`RecencyList`] and [`HandRing`] can
/// splice them without owning the arena. An unlinked value has both links
/// set to `None`; the ordering structures keep them consistent while the
/// value is a member.
pub trait Linked {
    fn prev(&self) -> Option<DescriptorId>;
    fn set_prev(&mut self, id: Option<DescriptorId>);
    fn next(&self) -> Option<DescriptorId>;
    fn set_next(&mut self, id: Option<DescriptorId>);
}
