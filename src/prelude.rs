pub use crate::config::ClockProConfig;
pub use crate::ds::{DescriptorArena, DescriptorId, HandRing, Linked, RecencyList};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::policy::{
    ClockProPolicy, ColdTarget, ConcurrentClockPro, Status, ThreeHandClockProPolicy,
};
pub use crate::stats::{PolicyStats, StatsSnapshot};
pub use crate::traits::ReplacementPolicy;
