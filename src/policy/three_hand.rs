//! CLOCK-Pro replacement policy, three-hand form.
//!
//! The shape the algorithm was published in: descriptors sit on circular
//! rings swept by hand cursors instead of recency lists. `hand_cold` rests
//! on the next replacement victim, `hand_hot` on the hot descriptor with
//! the largest recency, and `hand_test` on the ghost whose test period
//! expires next. A hand sweeping past a descriptor is what renews that
//! descriptor's position, so the rings are never relinked on the spared
//! path.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                    ThreeHandClockProPolicy Layout                    │
//! │                                                                      │
//! │   index: FxHashMap<u64, DescriptorId>   arena: DescriptorArena<Node> │
//! │                                                                      │
//! │        hot ring              cold ring           test ring           │
//! │      ┌──► [h]──┐           ┌──► [c]──┐          ┌──► [g]──┐          │
//! │      │    ▲    ▼           │    ▲    ▼          │    ▲    ▼          │
//! │      └──[·]◄──[·]          └──[·]◄──[·]         └──[·]◄──[·]         │
//! │           ▲                     ▲                    ▲               │
//! │       hand_hot              hand_cold            hand_test           │
//! │   (largest recency)       (next victim)       (expiring ghost)       │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Decisions are identical to the list form in
//! [`clock_pro`](crate::policy::clock_pro): the same epoch ordering, the
//! same warm-up, the same two-phase promotion check, the same adaptive
//! band. Unlinking a descriptor a hand rests on first moves that hand to
//! its successor; the rings enforce this, so no cursor ever dangles.

use rustc_hash::FxHashMap;

use crate::config::ClockProConfig;
use crate::ds::{DescriptorArena, DescriptorId, HandRing, Linked};
use crate::error::ConfigError;
use crate::policy::adaptive::ColdTarget;
use crate::policy::Status;
use crate::stats::PolicyStats;
use crate::traits::ReplacementPolicy;

#[cfg(any(test, debug_assertions))]
use crate::error::InvariantError;

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

/// Adaptive CLOCK-Pro over three hand-swept rings.
///
/// Behaviourally identical to
/// [`ClockProPolicy`](crate::policy::clock_pro::ClockProPolicy); prefer
/// that form unless the cursor mechanics themselves are of interest.
///
/// # Example
///
/// ```
/// use clockpro::config::ClockProConfig;
/// use clockpro::policy::three_hand::ThreeHandClockProPolicy;
///
/// let mut policy = ThreeHandClockProPolicy::new(&ClockProConfig::new(3)).unwrap();
/// for key in [1, 2, 3, 1, 1] {
///     policy.record(key);
/// }
/// assert_eq!(policy.stats().hit_count(), 2);
/// policy.finished();
/// ```
#[derive(Debug)]
pub struct ThreeHandClockProPolicy {
    index: FxHashMap<u64, DescriptorId>,
    arena: DescriptorArena<Node>,
    hot: HandRing,
    cold: HandRing,
    test: HandRing,
    max_size: usize,
    cold_target: ColdTarget,
    reaccessed: u64,
    stats: PolicyStats,
}

impl ThreeHandClockProPolicy {
    /// Creates a policy for the given configuration.
    pub fn new(config: &ClockProConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            index: FxHashMap::with_capacity_and_hasher(config.maximum_size, Default::default()),
            arena: DescriptorArena::with_capacity(config.maximum_size),
            hot: HandRing::new(),
            cold: HandRing::new(),
            test: HandRing::new(),
            max_size: config.maximum_size,
            cold_target: ColdTarget::from_config(config),
            reaccessed: 0,
            stats: PolicyStats::new("clock-pro.three-hand"),
        })
    }

    /// Records one access. Never fails.
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
        self.test.len()
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
            let id = self.create_descriptor(key, epoch, Status::Hot);
            self.hot.insert_newest(&mut self.arena, id);
        } else if free > 0 {
            let id = self.create_descriptor(key, epoch, Status::Cold);
            self.cold.insert_newest(&mut self.arena, id);
        } else {
            let id = self.create_descriptor(key, epoch, Status::Cold);
            self.cold.insert_newest(&mut self.arena, id);
            self.evict();
        }
    }

    fn on_non_resident_miss(&mut self, id: DescriptorId) {
        self.stats.record_miss();
        self.test.unlink(&mut self.arena, id);
        if self.can_promote(id) {
            self.node_mut(id).status = Status::Hot;
            self.hot.insert_newest(&mut self.arena, id);
        } else {
            self.node_mut(id).status = Status::Cold;
            self.cold.insert_newest(&mut self.arena, id);
        }
        let epoch = self.epoch();
        self.node_mut(id).epoch = epoch;
        self.evict();
    }

    // -----------------------------------------------------------------
    // Hand movement
    // -----------------------------------------------------------------

    fn evict(&mut self) {
        self.stats.record_eviction();
        while self.len() > self.max_size {
            if self.cold.len() > 0 {
                self.run_hand_cold();
            } else {
                let bound = self.epoch();
                self.run_hand_hot(bound);
            }
        }
        self.prune();
    }

    /// Works the descriptor under `hand_cold`. A referenced victim gets a
    /// promotion attempt; if it stays cold the hand simply sweeps past it,
    /// which renews its ring position. An unreferenced victim leaves the
    /// resident set.
    fn run_hand_cold(&mut self) {
        let victim = self.cold.oldest().expect("cold hand on empty ring");
        if self.node(victim).referenced {
            self.node_mut(victim).referenced = false;
            if self.can_promote(victim) {
                self.cold.unlink(&mut self.arena, victim);
                self.node_mut(victim).status = Status::Hot;
                self.hot.insert_newest(&mut self.arena, victim);
            } else {
                self.cold.advance(&self.arena);
            }
            self.reaccessed += 1;
            let epoch = self.epoch();
            self.node_mut(victim).epoch = epoch;
        } else {
            self.cold.unlink(&mut self.arena, victim);
            if self.in_test_period(victim) {
                self.node_mut(victim).status = Status::NonResident;
                self.test.insert_newest(&mut self.arena, victim);
            } else {
                self.remove_descriptor(victim);
            }
            while self.test.len() > self.max_size {
                self.run_hand_test();
            }
        }
    }

    /// Sweeps `hand_hot` toward newer descriptors, never past `bound`,
    /// demoting the first unreferenced one. Returns whether a demotion
    /// happened.
    fn run_hand_hot(&mut self, bound: u64) -> bool {
        while let Some(victim) = self.hot.oldest() {
            if self.node(victim).epoch > bound {
                break;
            }
            if self.node(victim).referenced {
                self.node_mut(victim).referenced = false;
                self.hot.advance(&self.arena);
                self.reaccessed += 1;
                let epoch = self.epoch();
                self.node_mut(victim).epoch = epoch;
            } else {
                self.hot.unlink(&mut self.arena, victim);
                self.node_mut(victim).status = Status::Cold;
                self.cold.insert_newest(&mut self.arena, victim);
                return true;
            }
        }
        false
    }

    /// Works the ghost under `hand_test`: its test period is over, so it
    /// leaves the clock and the cold allocation narrows.
    fn run_hand_test(&mut self) {
        let victim = self.test.oldest().expect("test hand on empty ring");
        self.test.unlink(&mut self.arena, victim);
        self.remove_descriptor(victim);
        self.cold_target.adjust(-1);
    }

    /// Drops every ghost whose test period has expired.
    fn prune(&mut self) {
        while let Some(oldest) = self.test.oldest() {
            if self.in_test_period(oldest) {
                break;
            }
            self.run_hand_test();
        }
    }

    /// Two-phase promotion check; see the list form for the rationale.
    fn can_promote(&mut self, candidate: DescriptorId) -> bool {
        if !self.in_test_period(candidate) {
            return false;
        }
        self.cold_target.adjust(1);
        while self.hot.len() > 0
            && self.hot.len() >= self.max_size.saturating_sub(self.cold_target.target())
        {
            let bound = self.node(candidate).epoch;
            if !self.run_hand_hot(bound) {
                return false;
            }
        }
        self.in_test_period(candidate)
    }

    /// A descriptor is on probation exactly while its epoch is newer than
    /// the epoch under `hand_hot`.
    fn in_test_period(&self, id: DescriptorId) -> bool {
        match self.hot.oldest() {
            None => true,
            Some(oldest_hot) => self.node(id).epoch > self.node(oldest_hot).epoch,
        }
    }

    // -----------------------------------------------------------------
    // Descriptor store plumbing
    // -----------------------------------------------------------------

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

        if hot != self.hot.len() || cold != self.cold.len() || non_resident != self.test.len() {
            return Err(InvariantError::new(format!(
                "status counts ({hot}/{cold}/{non_resident}) disagree with ring lengths ({}/{}/{})",
                self.hot.len(),
                self.cold.len(),
                self.test.len()
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
        if self.test.len() > self.max_size {
            return Err(InvariantError::new(format!(
                "non-resident population {} exceeds capacity {}",
                self.test.len(),
                self.max_size
            )));
        }

        for (ring, status) in [
            (&self.hot, Status::Hot),
            (&self.cold, Status::Cold),
            (&self.test, Status::NonResident),
        ] {
            for id in ring.iter(&self.arena) {
                if self.node(id).status != status {
                    return Err(InvariantError::new(format!(
                        "descriptor for key {} linked into the wrong ring",
                        self.node(id).key
                    )));
                }
            }
            ring.debug_validate(&self.arena);
        }

        for id in self.test.iter(&self.arena) {
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

impl ReplacementPolicy for ThreeHandClockProPolicy {
    fn record(&mut self, key: u64) {
        ThreeHandClockProPolicy::record(self, key);
    }

    fn stats(&self) -> &PolicyStats {
        ThreeHandClockProPolicy::stats(self)
    }

    fn finished(&self) {
        ThreeHandClockProPolicy::finished(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_size: usize) -> ClockProConfig {
        ClockProConfig {
            percent_min_cold: 0.1,
            percent_max_cold: 0.9,
            lower_bound_cold: 1,
            ..ClockProConfig::new(max_size)
        }
    }

    fn policy(max_size: usize) -> ThreeHandClockProPolicy {
        ThreeHandClockProPolicy::new(&config(max_size)).unwrap()
    }

    fn run(policy: &mut ThreeHandClockProPolicy, trace: &[u64]) {
        for &key in trace {
            policy.record(key);
            policy.check_invariants().unwrap();
        }
    }

    #[test]
    fn warm_up_fills_hot_then_cold() {
        let mut policy = policy(3);
        run(&mut policy, &[1, 2, 3]);

        assert_eq!(policy.hot_count(), 2);
        assert_eq!(policy.cold_count(), 1);
        assert_eq!(policy.ghost_count(), 0);
        assert_eq!(policy.stats().eviction_count(), 0);
        policy.finished();
    }

    #[test]
    fn full_miss_turns_cold_victim_into_ghost() {
        let mut policy = policy(3);
        run(&mut policy, &[1, 2, 3, 4]);

        assert_eq!(policy.status_of(3), Some(Status::NonResident));
        assert_eq!(policy.status_of(4), Some(Status::Cold));
        assert_eq!(policy.len(), 3);
        assert_eq!(policy.stats().eviction_count(), 1);
    }

    #[test]
    fn refault_in_test_period_promotes_to_hot() {
        let mut policy = policy(3);
        run(&mut policy, &[1, 2, 3, 4, 3]);

        assert_eq!(policy.status_of(3), Some(Status::Hot));
        assert_eq!(policy.hot_count(), 1);
        assert_eq!(policy.cold_count(), 2);
        assert_eq!(policy.status_of(4), None);
        assert_eq!(policy.cold_target(), 2);
    }

    #[test]
    fn referenced_cold_victim_is_promoted_at_sweep_time() {
        let mut policy = policy(3);
        // Key 3 carries its reference bit when hand_cold reaches it, wins
        // the promotion, and key 4 is replaced instead.
        run(&mut policy, &[1, 2, 3, 3, 4]);

        assert_eq!(policy.status_of(3), Some(Status::Hot));
        assert_eq!(policy.status_of(4), None);
        assert_eq!(policy.hot_count(), 1);
        assert_eq!(policy.cold_count(), 2);
        assert_eq!(policy.cold_target(), 2);
        policy.finished();
    }

    #[test]
    fn ghost_population_is_capped() {
        let mut policy = policy(2);
        for key in 1..=40 {
            policy.record(key);
            assert!(policy.ghost_count() <= 2);
            policy.check_invariants().unwrap();
        }
    }

    #[test]
    fn hands_never_dangle_across_heavy_churn() {
        let mut policy = policy(4);
        // Interleave fresh keys with re-faults to force hand re-validation
        // on every ring.
        for round in 0..50u64 {
            policy.record(round);
            policy.record(round / 2);
            policy.record(round.saturating_sub(3));
            policy.check_invariants().unwrap();
        }
        policy.finished();
    }
}
