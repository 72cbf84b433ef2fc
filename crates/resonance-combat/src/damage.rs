//! Damage resolution pipeline.
//!
//! Order matters and is fixed:
//! 1. attack power plus the party's flat bonus
//! 2. critical roll
//! 3. element conversion by the party's percentage (skills add their magnitude)
//! 4. elemental matchup multiplier
//! 5. passive hooks (basic attacks only)
//! 6. floor, minimum 1

use crate::element::{Element, Matchup, MatchupStats, MatchupTable, MatchupTier};
use crate::enemy::Enemy;
use crate::party::PartyModifiers;
use crate::skills::PassiveHook;
use crate::unit::Unit;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Damage state handed to passive hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageContext {
    /// Damage so far; passives rewrite it.
    pub damage: f64,
    /// Consecutive hits on this target after the first.
    pub same_target_streak: u32,
    /// Element of the hit.
    pub element: Element,
    /// Matchup already applied to `damage`.
    pub matchup: Matchup,
    /// Counters of `element` on the target before this hit.
    pub counters_on_target: u32,
    /// Whether the hit is critical.
    pub is_critical: bool,
}

/// Final result of one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageOutcome {
    /// Whole damage, at least 1.
    pub damage: f64,
    /// Whether the crit roll hit.
    pub is_critical: bool,
    /// Elemental multiplier applied.
    pub multiplier: f64,
    /// Elemental tier.
    pub matchup_tier: MatchupTier,
    /// Element of the hit.
    pub element: Element,
}

/// Kind of hit being resolved.
#[derive(Clone)]
pub enum StrikeKind<'a> {
    /// Basic attack: passives run with the given streak.
    Basic {
        /// Streak from the attacker's targeting memory.
        streak: u32,
        /// Attacker's passive hooks.
        passives: &'a [Arc<dyn PassiveHook>],
    },
    /// Skill cast: magnitude is added to the element percentage.
    Skill {
        /// Percentage points added in the conversion step.
        magnitude: f64,
    },
}

/// One unit hitting one enemy.
pub struct Strike<'a> {
    /// Who attacks.
    pub attacker: &'a Unit,
    /// Who is hit.
    pub target: &'a Enemy,
    /// Element of the hit.
    pub element: Element,
    /// Basic attack or skill.
    pub kind: StrikeKind<'a>,
    /// Counters of `element` already on the target.
    pub counters_on_target: u32,
}

/// Floors a damage value and clamps it to at least 1.
///
/// Non-finite values clamp to 1 as well.
#[must_use]
pub fn finalize_damage(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.floor().max(1.0)
    } else {
        1.0
    }
}

/// Resolves hits against the matchup table.
#[derive(Debug, Clone)]
pub struct DamageResolver {
    table: MatchupTable,
    crit_multiplier: f64,
}

impl Default for DamageResolver {
    fn default() -> Self {
        Self::new(MatchupTable::standard(), 2.0)
    }
}

impl DamageResolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new(table: MatchupTable, crit_multiplier: f64) -> Self {
        Self {
            table,
            crit_multiplier,
        }
    }

    /// The matchup table.
    #[must_use]
    pub fn table(&self) -> &MatchupTable {
        &self.table
    }

    /// Resolves a unit's basic attack or skill cast.
    pub fn resolve_attack(
        &self,
        strike: &Strike<'_>,
        party: &PartyModifiers,
        wave: u32,
        rng: &mut fastrand::Rng,
    ) -> DamageOutcome {
        let stats = &strike.attacker.stats;

        let mut damage = stats.attack_power + party.global_attack_bonus();

        let is_critical = rng.f64() < stats.critical_chance;
        if is_critical {
            damage *= self.crit_multiplier;
        }

        let mut percent = party.element_percent(strike.element);
        if let StrikeKind::Skill { magnitude } = strike.kind {
            percent += magnitude;
        }
        damage = damage * percent / 100.0;

        let matchup = self.table.resolve(
            Some(strike.element),
            strike.target.element,
            MatchupStats {
                penetration: stats.elemental_penetration,
                weakness_bonus: stats.weakness_bonus,
            },
            wave,
        );
        damage *= matchup.multiplier;

        if let StrikeKind::Basic { streak, passives } = &strike.kind {
            let mut ctx = DamageContext {
                damage,
                same_target_streak: *streak,
                element: strike.element,
                matchup,
                counters_on_target: strike.counters_on_target,
                is_critical,
            };
            for passive in passives.iter() {
                passive.apply(strike.attacker, strike.target, &mut ctx);
            }
            damage = ctx.damage;
        }

        DamageOutcome {
            damage: finalize_damage(damage),
            is_critical,
            multiplier: matchup.multiplier,
            matchup_tier: matchup.tier,
            element: strike.element,
        }
    }

    /// Resolves a hero spell: the party's flat bonus as base, no crit, no
    /// penetration, no passives.
    #[must_use]
    pub fn resolve_spell(
        &self,
        element: Element,
        magnitude: f64,
        target: &Enemy,
        party: &PartyModifiers,
        wave: u32,
    ) -> DamageOutcome {
        let percent = party.element_percent(element) + magnitude;
        let matchup = self
            .table
            .resolve(Some(element), target.element, MatchupStats::default(), wave);
        let damage = party.global_attack_bonus() * percent / 100.0 * matchup.multiplier;

        DamageOutcome {
            damage: finalize_damage(damage),
            is_critical: false,
            multiplier: matchup.multiplier,
            matchup_tier: matchup.tier,
            element,
        }
    }
}
