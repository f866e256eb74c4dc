//! Policy trait for trace drivers.
//!
//! A driver replays an access trace by calling [`record`] once per access
//! and reading the counters back when the trace ends. Holding the engines
//! behind this one-method capability keeps the driver independent of which
//! realisation it is exercising.
//!
//! [`record`]: ReplacementPolicy::record

use crate::stats::PolicyStats;

/// Key-only replacement policy driven by an access trace.
///
/// # Example
///
/// ```
/// use clockpro::config::ClockProConfig;
/// use clockpro::policy::clock_pro::ClockProPolicy;
/// use clockpro::traits::ReplacementPolicy;
///
/// fn replay(policy: &mut dyn ReplacementPolicy, trace: &[u64]) {
///     for &key in trace {
///         policy.record(key);
///     }
///     policy.finished();
/// }
///
/// let mut policy = ClockProPolicy::new(&ClockProConfig::new(8)).unwrap();
/// replay(&mut policy, &[1, 2, 3, 1, 2, 3]);
/// assert_eq!(policy.stats().operation_count(), 6);
/// ```
pub trait ReplacementPolicy {
    /// Records one access. Must be total: any `u64` key, any internal
    /// state.
    fn record(&mut self, key: u64);

    /// The counters written so far.
    fn stats(&self) -> &PolicyStats;

    /// Called once when the trace ends. Implementations may verify
    /// internal integrity here; the default does nothing.
    fn finished(&self) {}
}
