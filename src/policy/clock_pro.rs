//! CLOCK-Pro replacement policy, epoch/list form.
//!
//! CLOCK-Pro improves on Clock by classifying resident descriptors as hot
//! or cold by inter-reference recency and by remembering recently evicted
//! cold descriptors as non-resident ghosts. A ghost re-faulting during its
//! test period is evidence the cold allocation is too small, so the policy
//! adapts. Hits touch only a reference bit, which keeps the hit path O(1)
//! and contention-free.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        ClockProPolicy Layout                         │
//! │                                                                      │
//! │   ┌────────────────────────────────────────────────────────────────┐ │
//! │   │  index: FxHashMap<u64, DescriptorId>   (key -> descriptor)     │ │
//! │   │  arena: DescriptorArena<Node>   (every descriptor ever live)   │ │
//! │   └────────────────────────────────────────────────────────────────┘ │
//! │                                                                      │
//! │   hot:           head ──► [9] ◄──► [4] ◄──► [1] ◄── tail (oldest)    │
//! │   cold:          head ──► [7] ◄──► [2] ◄────────── tail (victim)     │
//! │   non_resident:  head ──► [5] ◄──► [3] ◄────────── tail (expiring)   │
//! │                                                                      │
//! │   |hot| + |cold| ≤ maximum_size      |non_resident| ≤ maximum_size   │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm
//!
//! ```text
//! record(key):
//!   hit  (hot or cold)          → set reference bit, nothing else
//!   miss (unknown key)          → insert cold at head, evict()
//!                                 (warm-up: insert hot while free > min_cold)
//!   miss (non-resident ghost)   → can_promote() ? hot : cold, evict()
//!
//! evict():
//!   while resident > maximum_size:
//!     cold non-empty → scan_cold()     else → scan_hot(now)
//!   prune expired ghosts
//!
//! scan_cold():  referenced victim  → try promotion, else back to head
//!               unreferenced       → ghost if in test period, else forget
//! scan_hot(b):  walk oldest-first up to epoch bound b, demote the first
//!               unreferenced descriptor, spare referenced ones
//! ```
//!
//! A descriptor's test period lasts while its epoch is newer than the
//! oldest hot descriptor's epoch; the epoch counter advances on every miss
//! and every re-access observed by a scan, so no separate test hand or flag
//! is needed.

use rustc_hash::FxHashMap;

use crate::config::ClockProConfig;
use crate::ds::{DescriptorArena, DescriptorId, Linked, RecencyList};
use crate::error::ConfigError;
use crate::policy::adaptive::ColdTarget;
use crate::policy::Status;
use crate::stats::{PolicyStats, StatsSnapshot};
use crate::traits::ReplacementPolicy;

#[cfg(any(test, debug_assertions))]
use crate::error::InvariantError;

/// Descriptor tracked for one key, resident or not.
#[derive(Debug)]
struct Node {
    key: u64,
    epoch: u64,
    status: Status,
    referenced: bool,
    prev: Option<DescriptorId>,
    next: Option<DescriptorId>,
}

impl Linked for Node {
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

/// Adaptive CLOCK-Pro over three recency lists.
///
/// Key-only: the policy tracks access history and replacement decisions,
/// not values. Construction validates the configuration; `record` is total
/// and restores every structural invariant before returning.
///
/// # Example
///
/// ```
/// use clockpro::config::ClockProConfig;
/// use clockpro::policy::clock_pro::ClockProPolicy;
///
/// let mut policy = ClockProPolicy::new(&ClockProConfig::new(3)).unwrap();
/// for key in [1, 2, 3, 1, 1] {
///     policy.record(key);
/// }
/// assert_eq!(policy.stats().hit_count(), 2);
/// policy.finished();
/// ```
#[derive(Debug)]
pub struct ClockProPolicy {
    index: FxHashMap<u64, DescriptorId>,
    arena: DescriptorArena<Node>,
    hot: RecencyList,
    cold: RecencyList,
    non_resident: RecencyList,
    max_size: usize,
    cold_target: ColdTarget,
    reaccessed: u64,
    stats: PolicyStats,
}

impl ClockProPolicy {
    /// Creates a policy for the given configuration.
    pub fn new(config: &ClockProConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            index: FxHashMap::with_capacity_and_hasher(config.maximum_size, Default::default()),
            arena: DescriptorArena::with_capacity(config.maximum_size),
            hot: RecencyList::new(),
            cold: RecencyList::new(),
            non_resident: RecencyList::new(),
            max_size: config.maximum_size,
            cold_target: ColdTarget::from_config(config),
            reaccessed: 0,
            stats: PolicyStats::new("clock-pro"),
        })
    }

    /// Records one access. Never fails; side effects are counter updates
    /// and descriptor movement only.
    pub fn record(&mut self, key: u64) {
        self.stats.record_operation();
        match self.index.get(&key).copied() {
            None => self.on_miss(key),
            Some(id) => {
                let status = self.node(id).status;
                match status {
                    Status::Hot | Status::Cold => self.on_hit(id),
                    Status::NonResident => self.on_non_resident_miss(id),
                }
            }
        }
    }

    /// Counters written so far.
    pub fn stats(&self) -> &PolicyStats {
        &self.stats
    }

    /// Runs the integrity checks in debug builds; no-op in release builds.
    /// Intended to be called once when a trace ends.
    pub fn finished(&self) {
        #[cfg(debug_assertions)]
        if let Err(err) = self.check_invariants() {
            panic!("clock-pro invariant violated: {err}");
        }
    }

    /// Maximum resident population.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Current resident population (hot + cold).
    pub fn len(&self) -> usize {
        self.hot.len() + self.cold.len()
    }

    /// Returns `true` if nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of hot descriptors.
    pub fn hot_count(&self) -> usize {
        self.hot.len()
    }

    /// Number of resident cold descriptors.
    pub fn cold_count(&self) -> usize {
        self.cold.len()
    }

    /// Number of non-resident ghost descriptors.
    pub fn ghost_count(&self) -> usize {
        self.non_resident.len()
    }

    /// Current adaptive cold target.
    pub fn cold_target(&self) -> usize {
        self.cold_target.target()
    }

    /// Returns `true` if `key` is resident (hot or cold).
    pub fn contains(&self, key: u64) -> bool {
        matches!(self.status_of(key), Some(Status::Hot | Status::Cold))
    }

    /// Classification of `key`, or `None` if it is not tracked at all.
    pub fn status_of(&self, key: u64) -> Option<Status> {
        let id = self.index.get(&key)?;
        self.arena.get(*id).map(|node| node.status)
    }

    // -----------------------------------------------------------------
    // Access paths
    // -----------------------------------------------------------------

    fn on_hit(&mut self, id: DescriptorId) {
        self.stats.record_hit();
        self.node_mut(id).referenced = true;
    }

    fn on_miss(&mut self, key: u64) {
        self.stats.record_miss();
        let epoch = self.epoch();
        let free = self.max_size - self.len();
        if free > self.cold_target.min_cold() {
            // Warm-up: fill the hot allocation before any cold descriptor
            // exists.
            let id = self.create_descriptor(key, epoch, Status::Hot);
            self.hot.push_front(&mut self.arena, id);
        } else if free > 0 {
            let id = self.create_descriptor(key, epoch, Status::Cold);
            self.cold.push_front(&mut self.arena, id);
        } else {
            let id = self.create_descriptor(key, epoch, Status::Cold);
            self.cold.push_front(&mut self.arena, id);
            self.evict();
        }
    }

    fn on_non_resident_miss(&mut self, id: DescriptorId) {
        self.stats.record_miss();
        self.non_resident.unlink(&mut self.arena, id);
        if self.can_promote(id) {
            self.node_mut(id).status = Status::Hot;
            self.hot.push_front(&mut self.arena, id);
        } else {
            self.node_mut(id).status = Status::Cold;
            self.cold.push_front(&mut self.arena, id);
        }
        let epoch = self.epoch();
        self.node_mut(id).epoch = epoch;
        self.evict();
    }

    // -----------------------------------------------------------------
    // Eviction
    // -----------------------------------------------------------------

    fn evict(&mut self) {
        self.stats.record_eviction();
        while self.len() > self.max_size {
            if self.cold.len() > 0 {
                self.scan_cold();
            } else {
                let bound = self.epoch();
                self.scan_hot(bound);
            }
        }
        self.prune();
    }

    /// Examines the oldest cold descriptor. A referenced victim gets a
    /// promotion attempt and a fresh test period; an unreferenced one
    /// leaves the resident set, surviving as a ghost only while its test
    /// period lasts.
    fn scan_cold(&mut self) {
        let victim = self.cold.tail().expect("cold scan on empty list");
        self.cold.unlink(&mut self.arena, victim);
        if self.node(victim).referenced {
            self.node_mut(victim).referenced = false;
            if self.can_promote(victim) {
                self.node_mut(victim).status = Status::Hot;
                self.hot.push_front(&mut self.arena, victim);
            } else {
                self.cold.push_front(&mut self.arena, victim);
            }
            self.reaccessed += 1;
            let epoch = self.epoch();
            self.node_mut(victim).epoch = epoch;
        } else {
            if self.in_test_period(victim) {
                self.node_mut(victim).status = Status::NonResident;
                self.non_resident.push_front(&mut self.arena, victim);
            } else {
                self.remove_descriptor(victim);
            }
            while self.non_resident.len() > self.max_size {
                self.scan_non_resident();
            }
        }
    }

    /// Walks hot descriptors oldest-first, never past `bound`, demoting the
    /// first unreferenced one. Referenced descriptors are spared with a
    /// fresh epoch: their actual access may be more recent than any cold
    /// descriptor's. Returns whether a demotion happened.
    fn scan_hot(&mut self, bound: u64) -> bool {
        while let Some(victim) = self.hot.tail() {
            if self.node(victim).epoch > bound {
                break;
            }
            self.hot.unlink(&mut self.arena, victim);
            if self.node(victim).referenced {
                self.node_mut(victim).referenced = false;
                self.hot.push_front(&mut self.arena, victim);
                self.reaccessed += 1;
                let epoch = self.epoch();
                self.node_mut(victim).epoch = epoch;
            } else {
                self.node_mut(victim).status = Status::Cold;
                self.cold.push_front(&mut self.arena, victim);
                return true;
            }
        }
        false
    }

    /// Terminates the oldest ghost's test period: it ran out without a
    /// re-access, so the cold allocation narrows.
    fn scan_non_resident(&mut self) {
        let victim = self
            .non_resident
            .tail()
            .expect("non-resident scan on empty list");
        self.non_resident.unlink(&mut self.arena, victim);
        self.remove_descriptor(victim);
        self.cold_target.adjust(-1);
    }

    /// Drops every ghost whose test period has expired.
    fn prune(&mut self) {
        while let Some(oldest) = self.non_resident.tail() {
            if self.in_test_period(oldest) {
                break;
            }
            self.scan_non_resident();
        }
    }

    /// Decides whether `candidate` may enter the hot set. The re-access
    /// itself widens the cold target; the hot set must then shrink to its
    /// allocation before the promotion is granted, and the candidate's test
    /// period must survive that shrinking.
    fn can_promote(&mut self, candidate: DescriptorId) -> bool {
        if !self.in_test_period(candidate) {
            return false;
        }
        self.cold_target.adjust(1);
        while self.hot.len() > 0
            && self.hot.len() >= self.max_size.saturating_sub(self.cold_target.target())
        {
            let bound = self.node(candidate).epoch;
            if !self.scan_hot(bound) {
                return false;
            }
        }
        self.in_test_period(candidate)
    }

    /// A descriptor is on probation exactly while its epoch is newer than
    /// the oldest hot descriptor's.
    fn in_test_period(&self, id: DescriptorId) -> bool {
        match self.hot.tail() {
            None => true,
            Some(oldest_hot) => self.node(id).epoch > self.node(oldest_hot).epoch,
        }
    }

    // -----------------------------------------------------------------
    // Descriptor store plumbing
    // -----------------------------------------------------------------

    /// Event counter ordering insertions and re-accesses.
    fn epoch(&self) -> u64 {
        self.stats.miss_count() + self.reaccessed
    }

    fn create_descriptor(&mut self, key: u64, epoch: u64, status: Status) -> DescriptorId {
        let id = self.arena.create(Node {
            key,
            epoch,
            status,
            referenced: false,
            prev: None,
            next: None,
        });
        self.index.insert(key, id);
        id
    }

    fn remove_descriptor(&mut self, id: DescriptorId) {
        let node = self.arena.destroy(id).expect("descriptor already removed");
        self.index.remove(&node.key);
    }

    fn node(&self, id: DescriptorId) -> &Node {
        self.arena.get(id).expect("descriptor missing from arena")
    }

    fn node_mut(&mut self, id: DescriptorId) -> &mut Node {
        self.arena
            .get_mut(id)
            .expect("descriptor missing from arena")
    }

    // -----------------------------------------------------------------
    // Integrity
    // -----------------------------------------------------------------

    /// Verifies every structural invariant. Available in debug and test
    /// builds.
    #[cfg(any(test, debug_assertions))]
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut hot = 0usize;
        let mut cold = 0usize;
        let mut non_resident = 0usize;
        for (id, node) in self.arena.iter() {
            match node.status {
                Status::Hot => hot += 1,
                Status::Cold => cold += 1,
                Status::NonResident => non_resident += 1,
            }
            if self.index.get(&node.key) != Some(&id) {
                return Err(InvariantError::new(format!(
                    "descriptor for key {} not indexed at its slot",
                    node.key
                )));
            }
        }

        if hot != self.hot.len()
            || cold != self.cold.len()
            || non_resident != self.non_resident.len()
        {
            return Err(InvariantError::new(format!(
                "status counts ({hot}/{cold}/{non_resident}) disagree with list lengths ({}/{}/{})",
                self.hot.len(),
                self.cold.len(),
                self.non_resident.len()
            )));
        }
        if self.index.len() != self.arena.len() {
            return Err(InvariantError::new("index and arena sizes disagree"));
        }
        if self.len() > self.max_size {
            return Err(InvariantError::new(format!(
                "resident population {} exceeds capacity {}",
                self.len(),
                self.max_size
            )));
        }
        if self.non_resident.len() > self.max_size {
            return Err(InvariantError::new(format!(
                "non-resident population {} exceeds capacity {}",
                self.non_resident.len(),
                self.max_size
            )));
        }

        for (list, status) in [
            (&self.hot, Status::Hot),
            (&self.cold, Status::Cold),
            (&self.non_resident, Status::NonResident),
        ] {
            for id in list.iter(&self.arena) {
                if self.node(id).status != status {
                    return Err(InvariantError::new(format!(
                        "descriptor for key {} linked into the wrong list",
                        self.node(id).key
                    )));
                }
            }
            list.debug_validate(&self.arena);
        }

        for id in self.non_resident.iter(&self.arena) {
            if !self.in_test_period(id) {
                return Err(InvariantError::new(format!(
                    "non-resident descriptor for key {} outlived its test period",
                    self.node(id).key
                )));
            }
        }

        let target = self.cold_target.target();
        if target < self.cold_target.min_cold() || target > self.cold_target.max_cold() {
            return Err(InvariantError::new(format!(
                "cold target {target} outside [{}, {}]",
                self.cold_target.min_cold(),
                self.cold_target.max_cold()
            )));
        }
        Ok(())
    }
}

impl ReplacementPolicy for ClockProPolicy {
    fn record(&mut self, key: u64) {
        ClockProPolicy::record(self, key);
    }

    fn stats(&self) -> &PolicyStats {
        ClockProPolicy::stats(self)
    }

    fn finished(&self) {
        ClockProPolicy::finished(self);
    }
}

/// Mutex-guarded [`ClockProPolicy`] for drivers that share one policy
/// across threads. Every access serialises on the lock; the wrapped engine
/// keeps its invariants because `record` runs to completion under it.
#[derive(Debug)]
pub struct ConcurrentClockPro {
    inner: parking_lot::Mutex<ClockProPolicy>,
}

impl ConcurrentClockPro {
    /// Creates a shared policy for the given configuration.
    pub fn new(config: &ClockProConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: parking_lot::Mutex::new(ClockProPolicy::new(config)?),
        })
    }

    /// Records one access.
    pub fn record(&self, key: u64) {
        self.inner.lock().record(key);
    }

    /// Captures the current counter values.
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.inner.lock().stats().snapshot()
    }

    /// Current resident population.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Maximum resident population.
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Runs the debug-build integrity checks.
    pub fn finished(&self) {
        self.inner.lock().finished();
    }
}
