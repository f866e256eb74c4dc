//! CLOCK-Pro replacement policies.
//!
//! Two realisations of the same algorithm live here:
//!
//! - [`clock_pro::ClockProPolicy`]: three recency lists (hot, cold,
//!   non-resident) with a per-descriptor epoch deciding test periods. The
//!   simpler form; prefer it.
//! - [`three_hand::ThreeHandClockProPolicy`]: circular rings scanned by
//!   hand cursors, the shape the algorithm was published in. Behaviourally
//!   identical to the list form.
//!
//! Both share the [`adaptive::ColdTarget`] controller, the [`Status`]
//! classification, and the statistics contract of
//! [`PolicyStats`](crate::stats::PolicyStats).

pub mod adaptive;
pub mod clock_pro;
pub mod three_hand;

pub use adaptive::ColdTarget;
pub use clock_pro::{ClockProPolicy, ConcurrentClockPro};
pub use three_hand::ThreeHandClockProPolicy;

/// Classification of a descriptor within the clock.
///
/// Hot and cold descriptors are resident and count against the capacity;
/// non-resident descriptors are history-only ghosts kept while their test
/// period lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Resident, predicted short inter-reference recency; protected from
    /// direct eviction.
    Hot,
    /// Resident eviction candidate.
    Cold,
    /// Evicted but remembered; a re-fault during the test period promotes.
    NonResident,
}
