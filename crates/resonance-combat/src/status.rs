//! Per-enemy status effects: elemental counters and damage-over-time stacks.
//!
//! Counters are hit-count accumulators keyed by (enemy, element). They never
//! go negative and an entry that reaches zero is deleted.
//!
//! DOT stacks carry pre-resolved damage: ticks subtract `per_tick_damage`
//! directly, with no mitigation reapplied.

use crate::element::Element;
use ahash::AHashMap;
use resonance_common::{EnemyUid, UnitId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Status tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Seconds between DOT ticks.
    pub dot_tick_interval: f64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            dot_tick_interval: 1.0,
        }
    }
}

impl StatusConfig {
    /// Clamps ranges.
    pub fn validate(&mut self) {
        if !self.dot_tick_interval.is_finite() || self.dot_tick_interval <= 0.0 {
            self.dot_tick_interval = 1.0;
        }
    }
}

// ============================================================================
// Damage Over Time
// ============================================================================

/// One independent damage-over-time stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotStack {
    /// Element of the damage.
    pub element: Element,
    /// Damage subtracted per tick.
    pub per_tick_damage: f64,
    /// Ticks left.
    pub ticks_remaining: u32,
    /// Seconds between ticks.
    pub tick_interval: f64,
    /// Time accumulated toward the next tick.
    pub tick_timer: f64,
    /// Unit that applied the stack.
    pub source: Option<UnitId>,
}

impl DotStack {
    /// Creates a stack lasting `duration` seconds: `ceil(duration / interval)` ticks.
    #[must_use]
    pub fn new(
        element: Element,
        per_tick_damage: f64,
        duration: f64,
        tick_interval: f64,
        source: Option<UnitId>,
    ) -> Self {
        let ticks = if duration.is_finite() && duration > 0.0 && tick_interval > 0.0 {
            (duration / tick_interval).ceil() as u32
        } else {
            0
        };
        Self {
            element,
            per_tick_damage: per_tick_damage.max(0.0),
            ticks_remaining: ticks,
            tick_interval,
            tick_timer: 0.0,
            source,
        }
    }

    /// Accumulates time and returns how many ticks are due, capped at the ticks left.
    pub fn tick(&mut self, dt: f64) -> u32 {
        if self.ticks_remaining == 0 {
            return 0;
        }
        self.tick_timer += dt;
        let due = (self.tick_timer / self.tick_interval) as u32;
        self.tick_timer %= self.tick_interval;
        due.min(self.ticks_remaining)
    }

    /// Whether the stack has run out.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.ticks_remaining == 0
    }

    /// Damage the stack still has to deal.
    #[must_use]
    pub fn remaining_damage(&self) -> f64 {
        self.per_tick_damage * f64::from(self.ticks_remaining)
    }
}

/// Result of subtracting DOT damage from an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotHit {
    /// The enemy is still standing.
    Survived,
    /// The tick defeated the enemy.
    Defeated,
    /// The enemy is no longer on the field.
    Missing,
}

/// Whatever owns enemy health. Implemented by the wave director.
pub trait DotTarget {
    /// Subtracts DOT damage from an enemy.
    fn apply_dot_damage(&mut self, enemy: EnemyUid, damage: f64) -> DotHit;

    /// Whether the enemy is still on the field.
    fn is_present(&self, enemy: EnemyUid) -> bool;
}

/// One applied DOT tick, reported for notifications.
#[derive(Debug, Clone, PartialEq)]
pub struct DotTick {
    /// Enemy hit.
    pub enemy: EnemyUid,
    /// Element of the stack.
    pub element: Element,
    /// Damage dealt.
    pub damage: f64,
    /// Unit that applied the stack.
    pub source: Option<UnitId>,
    /// Whether this tick defeated the enemy.
    pub defeated: bool,
}

// ============================================================================
// Tracker
// ============================================================================

/// Owner of every counter and DOT stack.
#[derive(Debug, Clone)]
pub struct StatusEffectTracker {
    counters: AHashMap<EnemyUid, AHashMap<Element, u32>>,
    dots: AHashMap<EnemyUid, Vec<DotStack>>,
    tick_interval: f64,
}

impl Default for StatusEffectTracker {
    fn default() -> Self {
        Self::new(&StatusConfig::default())
    }
}

impl StatusEffectTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new(config: &StatusConfig) -> Self {
        Self {
            counters: AHashMap::new(),
            dots: AHashMap::new(),
            tick_interval: config.dot_tick_interval,
        }
    }

    // === Counters ===

    /// Counter value, 0 when absent.
    #[must_use]
    pub fn counter(&self, enemy: EnemyUid, element: Element) -> u32 {
        self.counters
            .get(&enemy)
            .and_then(|m| m.get(&element))
            .copied()
            .unwrap_or(0)
    }

    /// Every non-zero counter on an enemy, ordered by element.
    #[must_use]
    pub fn counters_of(&self, enemy: EnemyUid) -> Vec<(Element, u32)> {
        let mut out: Vec<_> = self
            .counters
            .get(&enemy)
            .map(|m| m.iter().map(|(&e, &n)| (e, n)).collect())
            .unwrap_or_default();
        out.sort_unstable_by_key(|&(e, _)| e);
        out
    }

    /// Sum of all counters on an enemy.
    #[must_use]
    pub fn total_counters(&self, enemy: EnemyUid) -> u32 {
        self.counters
            .get(&enemy)
            .map_or(0, |m| m.values().fold(0u32, |acc, &n| acc.saturating_add(n)))
    }

    /// Adds `amount` to a counter. Returns the new value.
    pub fn increment(&mut self, enemy: EnemyUid, element: Element, amount: u32) -> u32 {
        if amount == 0 {
            return self.counter(enemy, element);
        }
        let slot = self
            .counters
            .entry(enemy)
            .or_default()
            .entry(element)
            .or_insert(0);
        *slot = slot.saturating_add(amount);
        *slot
    }

    /// Removes up to `amount` from a counter. Returns how many were removed.
    pub fn consume(&mut self, enemy: EnemyUid, element: Element, amount: u32) -> u32 {
        let Some(map) = self.counters.get_mut(&enemy) else {
            return 0;
        };
        let Some(slot) = map.get_mut(&element) else {
            return 0;
        };
        let taken = amount.min(*slot);
        *slot -= taken;
        if *slot == 0 {
            map.remove(&element);
        }
        if map.is_empty() {
            self.counters.remove(&enemy);
        }
        taken
    }

    /// Deletes one counter. Returns its value.
    pub fn clear(&mut self, enemy: EnemyUid, element: Element) -> u32 {
        self.consume(enemy, element, u32::MAX)
    }

    /// Deletes every counter on an enemy and returns them.
    pub fn drain(&mut self, enemy: EnemyUid) -> Vec<(Element, u32)> {
        let drained = self.counters_of(enemy);
        self.counters.remove(&enemy);
        drained
    }

    /// Moves up to `amount` counters of one element between enemies.
    ///
    /// Returns how many moved. Moving onto the same enemy is a no-op.
    pub fn transfer(
        &mut self,
        from: EnemyUid,
        to: EnemyUid,
        element: Element,
        amount: u32,
    ) -> u32 {
        if from == to {
            return 0;
        }
        let moved = self.consume(from, element, amount);
        self.increment(to, element, moved);
        moved
    }

    // === Damage over time ===

    /// Appends an independent DOT stack to an enemy.
    ///
    /// Stacks with no ticks (zero or invalid duration) are not stored.
    pub fn apply_dot(
        &mut self,
        enemy: EnemyUid,
        element: Element,
        per_tick_damage: f64,
        duration: f64,
        source: Option<UnitId>,
    ) {
        let stack = DotStack::new(element, per_tick_damage, duration, self.tick_interval, source);
        if stack.is_expired() || !per_tick_damage.is_finite() {
            return;
        }
        debug!(
            %enemy,
            %element,
            per_tick = stack.per_tick_damage,
            ticks = stack.ticks_remaining,
            "DOT applied"
        );
        self.dots.entry(enemy).or_default().push(stack);
    }

    /// Active stacks on an enemy.
    #[must_use]
    pub fn dots(&self, enemy: EnemyUid) -> &[DotStack] {
        self.dots.get(&enemy).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of active stacks on an enemy.
    #[must_use]
    pub fn dot_count(&self, enemy: EnemyUid) -> usize {
        self.dots(enemy).len()
    }

    /// Ticks every stack by `dt` seconds against `target`.
    ///
    /// Enemies processed in uid order. Once an enemy dies (or is found missing)
    /// none of its remaining stacks tick and all of its state is dropped.
    pub fn advance<T: DotTarget>(&mut self, dt: f64, target: &mut T) -> Vec<DotTick> {
        let mut enemies: Vec<EnemyUid> = self.dots.keys().copied().collect();
        enemies.sort_unstable();

        let mut report = Vec::new();
        let mut gone = Vec::new();

        for enemy in enemies {
            if !target.is_present(enemy) {
                gone.push(enemy);
                continue;
            }
            let Some(stacks) = self.dots.get_mut(&enemy) else {
                continue;
            };

            let mut dead = false;
            'stacks: for stack in stacks.iter_mut() {
                let due = stack.tick(dt);
                for _ in 0..due {
                    stack.ticks_remaining -= 1;
                    match target.apply_dot_damage(enemy, stack.per_tick_damage) {
                        DotHit::Survived => report.push(DotTick {
                            enemy,
                            element: stack.element,
                            damage: stack.per_tick_damage,
                            source: stack.source,
                            defeated: false,
                        }),
                        DotHit::Defeated => {
                            report.push(DotTick {
                                enemy,
                                element: stack.element,
                                damage: stack.per_tick_damage,
                                source: stack.source,
                                defeated: true,
                            });
                            dead = true;
                            break 'stacks;
                        },
                        DotHit::Missing => {
                            dead = true;
                            break 'stacks;
                        },
                    }
                }
            }

            if dead {
                gone.push(enemy);
            } else {
                stacks.retain(|s| !s.is_expired());
                if stacks.is_empty() {
                    self.dots.remove(&enemy);
                }
            }
        }

        for enemy in gone {
            self.forget(enemy);
        }
        report
    }

    // === Lifecycle ===

    /// Drops every counter and stack of an enemy.
    pub fn forget(&mut self, enemy: EnemyUid) {
        self.counters.remove(&enemy);
        self.dots.remove(&enemy);
    }

    /// Drops state for enemies `keep` rejects.
    pub fn retain_enemies(&mut self, mut keep: impl FnMut(EnemyUid) -> bool) {
        self.counters.retain(|&uid, _| keep(uid));
        self.dots.retain(|&uid, _| keep(uid));
    }

    /// Drops everything. Used when a wave resets.
    pub fn clear_all(&mut self) {
        self.counters.clear();
        self.dots.clear();
    }

    /// Whether the tracker holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.dots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal health table for driving DOTs.
    #[derive(Default)]
    struct Dummies {
        health: AHashMap<EnemyUid, f64>,
        hits: Vec<(EnemyUid, f64)>,
    }

    impl Dummies {
        fn with(mut self, uid: u64, health: f64) -> Self {
            self.health.insert(EnemyUid::new(uid), health);
            self
        }
    }

    impl DotTarget for Dummies {
        fn apply_dot_damage(&mut self, enemy: EnemyUid, damage: f64) -> DotHit {
            let Some(hp) = self.health.get_mut(&enemy) else {
                return DotHit::Missing;
            };
            self.hits.push((enemy, damage));
            *hp -= damage;
            if *hp <= 0.0 {
                self.health.remove(&enemy);
                DotHit::Defeated
            } else {
                DotHit::Survived
            }
        }

        fn is_present(&self, enemy: EnemyUid) -> bool {
            self.health.contains_key(&enemy)
        }
    }

    fn uid(n: u64) -> EnemyUid {
        EnemyUid::new(n)
    }

    #[test]
    fn test_counter_lifecycle() {
        let mut tracker = StatusEffectTracker::default();
        assert_eq!(tracker.increment(uid(1), Element::Fire, 3), 3);
        assert_eq!(tracker.increment(uid(1), Element::Fire, 1), 4);
        assert_eq!(tracker.consume(uid(1), Element::Fire, 10), 4);
        assert_eq!(tracker.counter(uid(1), Element::Fire), 0);
        assert!(tracker.is_empty());
        assert_eq!(tracker.consume(uid(1), Element::Fire, 1), 0);
    }

    #[test]
    fn test_transfer_and_drain() {
        let mut tracker = StatusEffectTracker::default();
        tracker.increment(uid(1), Element::Water, 5);
        tracker.increment(uid(1), Element::Air, 2);

        assert_eq!(tracker.transfer(uid(1), uid(2), Element::Water, 3), 3);
        assert_eq!(tracker.counter(uid(1), Element::Water), 2);
        assert_eq!(tracker.counter(uid(2), Element::Water), 3);
        assert_eq!(tracker.transfer(uid(1), uid(1), Element::Water, 3), 0);

        let drained = tracker.drain(uid(1));
        assert_eq!(drained, vec![(Element::Water, 2), (Element::Air, 2)]);
        assert_eq!(tracker.total_counters(uid(1)), 0);
        assert_eq!(tracker.total_counters(uid(2)), 3);
    }

    #[test]
    fn test_clear_single_element() {
        let mut tracker = StatusEffectTracker::default();
        tracker.increment(uid(1), Element::Dark, 4);
        tracker.increment(uid(1), Element::Light, 1);
        assert_eq!(tracker.clear(uid(1), Element::Dark), 4);
        assert_eq!(tracker.counters_of(uid(1)), vec![(Element::Light, 1)]);
    }

    #[test]
    fn test_dot_tick_count() {
        let stack = DotStack::new(Element::Poison, 5.0, 2.5, 1.0, None);
        assert_eq!(stack.ticks_remaining, 3);
        let stack = DotStack::new(Element::Poison, 5.0, 0.0, 1.0, None);
        assert!(stack.is_expired());
    }

    #[test]
    fn test_dots_tick_and_expire() {
        let mut tracker = StatusEffectTracker::default();
        let mut field = Dummies::default().with(1, 100.0);
        tracker.apply_dot(uid(1), Element::Poison, 10.0, 2.0, None);
        tracker.apply_dot(uid(1), Element::Poison, 1.0, 1.0, None);
        assert_eq!(tracker.dot_count(uid(1)), 2);

        let ticks = tracker.advance(0.5, &mut field);
        assert!(ticks.is_empty());

        let ticks = tracker.advance(0.5, &mut field);
        assert_eq!(ticks.len(), 2);
        assert_eq!(tracker.dot_count(uid(1)), 1);

        tracker.advance(1.0, &mut field);
        assert_eq!(tracker.dot_count(uid(1)), 0);
        assert!((field.health[&uid(1)] - 79.0).abs() < 1e-9);
    }

    #[test]
    fn test_large_step_catches_up() {
        let mut tracker = StatusEffectTracker::default();
        let mut field = Dummies::default().with(1, 100.0);
        tracker.apply_dot(uid(1), Element::Fire, 10.0, 3.0, None);

        let ticks = tracker.advance(10.0, &mut field);
        assert_eq!(ticks.len(), 3);
        assert!((field.health[&uid(1)] - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_death_suppresses_remaining_ticks() {
        let mut tracker = StatusEffectTracker::default();
        let mut field = Dummies::default().with(1, 15.0);
        tracker.apply_dot(uid(1), Element::Fire, 10.0, 5.0, None);
        tracker.apply_dot(uid(1), Element::Water, 10.0, 5.0, None);
        tracker.increment(uid(1), Element::Fire, 2);

        let ticks = tracker.advance(1.0, &mut field);
        assert_eq!(ticks.len(), 2);
        assert!(ticks[1].defeated);

        let more = tracker.advance(5.0, &mut field);
        assert!(more.is_empty());
        assert_eq!(field.hits.len(), 2);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_stacks_on_missing_enemies_dropped() {
        let mut tracker = StatusEffectTracker::default();
        let mut field = Dummies::default();
        tracker.apply_dot(uid(9), Element::Fire, 10.0, 5.0, None);
        let ticks = tracker.advance(1.0, &mut field);
        assert!(ticks.is_empty());
        assert_eq!(tracker.dot_count(uid(9)), 0);
    }
}
