//! The party roster and party-wide damage modifiers.

use crate::element::Element;
use crate::unit::Unit;
use ahash::AHashMap;
use resonance_common::UnitId;
use serde::{Deserialize, Serialize};

// ============================================================================
// Roster
// ============================================================================

/// Ordered owner of every unit in the fight.
///
/// Order is insertion order and decides who acts first within a tick.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    units: Vec<Unit>,
    next_member: u32,
    next_summon: u32,
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a fresh party-member id.
    pub fn next_member_id(&mut self) -> UnitId {
        loop {
            self.next_member += 1;
            let id = UnitId::new(self.next_member);
            if !self.contains(id) {
                return id;
            }
        }
    }

    /// Reserves a fresh summon id.
    pub fn next_summon_id(&mut self) -> UnitId {
        self.next_summon += 1;
        UnitId::new(UnitId::SUMMON_BASE.raw().saturating_add(self.next_summon))
    }

    /// Adds a unit, replacing any unit with the same id.
    pub fn insert(&mut self, unit: Unit) {
        if let Some(slot) = self.units.iter_mut().find(|u| u.id == unit.id) {
            *slot = unit;
        } else {
            self.units.push(unit);
        }
    }

    /// Removes a unit.
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        let index = self.units.iter().position(|u| u.id == id)?;
        Some(self.units.remove(index))
    }

    /// Unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Mutable unit by id.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Whether a unit is on the roster.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.get(id).is_some()
    }

    /// All units in acting order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    /// Mutable units in acting order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    /// Ids in acting order.
    #[must_use]
    pub fn ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|u| u.id).collect()
    }

    /// Non-summon members.
    pub fn members(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| !u.is_summon())
    }

    /// Summons currently fielded.
    pub fn summons(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_summon())
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Sum of current health over every unit.
    #[must_use]
    pub fn total_health(&self) -> f64 {
        self.units.iter().map(|u| u.stats.health.max(0.0)).sum()
    }

    /// Heals every unit. Returns the total restored.
    pub fn heal_all(&mut self, amount: f64) -> f64 {
        self.units.iter_mut().map(|u| u.heal(amount)).sum()
    }
}

// ============================================================================
// Synergy
// ============================================================================

/// Per-element damage percentages granted by members sharing a resonance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynergyConfig {
    /// Percentage every element starts at.
    pub base_percent: f64,
    /// Bonus with two members of an element.
    pub pair_bonus: f64,
    /// Bonus with three.
    pub trio_bonus: f64,
    /// Bonus with four or more.
    pub quad_bonus: f64,
}

impl Default for SynergyConfig {
    fn default() -> Self {
        Self {
            base_percent: 100.0,
            pair_bonus: 25.0,
            trio_bonus: 50.0,
            quad_bonus: 100.0,
        }
    }
}

impl SynergyConfig {
    /// Bonus for `count` members sharing an element.
    #[must_use]
    pub fn bonus_for(&self, count: usize) -> f64 {
        match count {
            0 | 1 => 0.0,
            2 => self.pair_bonus,
            3 => self.trio_bonus,
            _ => self.quad_bonus,
        }
    }

    /// Clamps ranges.
    pub fn validate(&mut self) {
        self.base_percent = self.base_percent.max(0.0);
        self.pair_bonus = self.pair_bonus.max(0.0);
        self.trio_bonus = self.trio_bonus.max(0.0);
        self.quad_bonus = self.quad_bonus.max(0.0);
    }
}

/// Party-wide inputs to damage resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PartyModifiers {
    global_attack_bonus: f64,
    base_percent: f64,
    element_percent: AHashMap<Element, f64>,
}

impl Default for PartyModifiers {
    fn default() -> Self {
        Self::new(0.0, &SynergyConfig::default())
    }
}

impl PartyModifiers {
    /// Creates modifiers with no synergy applied yet.
    #[must_use]
    pub fn new(global_attack_bonus: f64, synergy: &SynergyConfig) -> Self {
        Self {
            global_attack_bonus: global_attack_bonus.max(0.0),
            base_percent: synergy.base_percent,
            element_percent: AHashMap::new(),
        }
    }

    /// Flat attack added to every party attack; also the base of hero spells.
    #[must_use]
    pub fn global_attack_bonus(&self) -> f64 {
        self.global_attack_bonus
    }

    /// Replaces the flat attack bonus.
    pub fn set_global_attack_bonus(&mut self, bonus: f64) {
        self.global_attack_bonus = bonus.max(0.0);
    }

    /// Damage percentage for an element.
    #[must_use]
    pub fn element_percent(&self, element: Element) -> f64 {
        self.element_percent
            .get(&element)
            .copied()
            .unwrap_or(self.base_percent)
    }

    /// Recomputes synergy from the roster. Summons do not count.
    pub fn recompute(&mut self, roster: &Roster, synergy: &SynergyConfig) {
        let mut counts: AHashMap<Element, usize> = AHashMap::new();
        for member in roster.members() {
            *counts.entry(member.resonance).or_default() += 1;
        }

        self.base_percent = synergy.base_percent;
        self.element_percent = Element::ALL
            .into_iter()
            .map(|element| {
                let count = counts.get(&element).copied().unwrap_or(0);
                (element, synergy.base_percent + synergy.bonus_for(count))
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitStats;

    fn member(roster: &mut Roster, element: Element) -> UnitId {
        let id = roster.next_member_id();
        roster.insert(Unit::new(id, "m", UnitStats::default(), element));
        id
    }

    #[test]
    fn test_roster_insert_remove() {
        let mut roster = Roster::new();
        let a = member(&mut roster, Element::Fire);
        let b = member(&mut roster, Element::Water);
        assert_ne!(a, b);
        assert_eq!(roster.ids(), vec![a, b]);

        assert!(roster.remove(a).is_some());
        assert!(roster.remove(a).is_none());
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_summon_ids_are_separate() {
        let mut roster = Roster::new();
        let summon = roster.next_summon_id();
        assert!(summon.is_summon_range());
        assert!(!roster.next_member_id().is_summon_range());
    }

    #[test]
    fn test_synergy_thresholds() {
        let config = SynergyConfig::default();
        let mut roster = Roster::new();
        member(&mut roster, Element::Fire);
        member(&mut roster, Element::Fire);
        member(&mut roster, Element::Water);
        for _ in 0..4 {
            member(&mut roster, Element::Dark);
        }

        let mut modifiers = PartyModifiers::default();
        modifiers.recompute(&roster, &config);
        assert!((modifiers.element_percent(Element::Fire) - 125.0).abs() < 1e-9);
        assert!((modifiers.element_percent(Element::Water) - 100.0).abs() < 1e-9);
        assert!((modifiers.element_percent(Element::Dark) - 200.0).abs() < 1e-9);
        assert!((modifiers.element_percent(Element::Air) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_summons_excluded_from_synergy() {
        let mut roster = Roster::new();
        member(&mut roster, Element::Undead);
        let id = roster.next_summon_id();
        let mut summon = Unit::new(id, "s", UnitStats::default(), Element::Undead);
        summon.summoned_by = Some(UnitId::new(1));
        roster.insert(summon);

        let mut modifiers = PartyModifiers::default();
        modifiers.recompute(&roster, &SynergyConfig::default());
        assert!((modifiers.element_percent(Element::Undead) - 100.0).abs() < 1e-9);
    }
}
