//! Party units: members and summons.

use crate::config::AttackConfig;
use crate::element::Element;
use resonance_common::{EnemyUid, SkillId, SummonTemplateId, UnitId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Combat stat block of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStats {
    /// Current health.
    pub health: f64,
    /// Maximum health.
    pub max_health: f64,
    /// Flat attack power.
    pub attack_power: f64,
    /// Defense.
    pub defense: f64,
    /// Critical hit chance (0.0-1.0).
    pub critical_chance: f64,
    /// Attack speed; higher attacks more often.
    pub speed: f64,
    /// Fraction of elemental resistance ignored (0.0-1.0).
    pub elemental_penetration: f64,
    /// Added to the weakness multiplier.
    pub weakness_bonus: f64,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            health: 10.0,
            max_health: 10.0,
            attack_power: 10.0,
            defense: 0.0,
            critical_chance: 0.0,
            speed: 1.0,
            elemental_penetration: 0.0,
            weakness_bonus: 0.0,
        }
    }
}

impl UnitStats {
    /// Multiplies the additive stats (health, attack, defense) by `factor`.
    ///
    /// Rates (crit, speed, penetration, weakness bonus) are left alone.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            health: self.health * factor,
            max_health: self.max_health * factor,
            attack_power: self.attack_power * factor,
            defense: self.defense * factor,
            ..*self
        }
    }

    /// Clamps every field into its valid range.
    pub fn validate(&mut self) {
        self.max_health = self.max_health.max(0.0);
        self.health = self.health.clamp(0.0, self.max_health);
        self.attack_power = self.attack_power.max(0.0);
        self.defense = self.defense.max(0.0);
        self.critical_chance = self.critical_chance.clamp(0.0, 1.0);
        self.speed = self.speed.max(0.0);
        self.elemental_penetration = self.elemental_penetration.clamp(0.0, 1.0);
        self.weakness_bonus = self.weakness_bonus.max(0.0);
    }
}

/// Per-unit state of one skill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillState {
    /// Milliseconds until the skill is ready.
    pub cooldown_remaining: f64,
    /// Whether the scheduler considers this skill.
    pub active: bool,
}

impl Default for SkillState {
    fn default() -> Self {
        Self {
            cooldown_remaining: 0.0,
            active: true,
        }
    }
}

/// Who the unit last hit and how many times in a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetMemory {
    /// Enemy struck by the last basic attack.
    pub last_target: Option<EnemyUid>,
    /// Consecutive hits on `last_target` after the first.
    pub same_target_streak: u32,
}

impl TargetMemory {
    /// Records a hit and returns the streak to use for it.
    ///
    /// A new target restarts the streak at 0.
    pub fn record_hit(&mut self, target: EnemyUid) -> u32 {
        if self.last_target == Some(target) {
            self.same_target_streak = self.same_target_streak.saturating_add(1);
        } else {
            self.last_target = Some(target);
            self.same_target_streak = 0;
        }
        self.same_target_streak
    }

    /// Forgets the last target.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A party member or summon.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// Roster identifier.
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Level.
    pub level: u32,
    /// Stat block.
    pub stats: UnitStats,
    /// Damage element.
    pub resonance: Element,
    /// Owned skills, ordered by id.
    pub skills: BTreeMap<SkillId, SkillState>,
    /// Streak bookkeeping for passives.
    pub targeting: TargetMemory,
    /// Whether the unit swings on its own.
    pub has_auto_attack: bool,
    /// Seconds until the next basic attack.
    pub attack_timer: f64,
    /// Flat gold credited per basic attack.
    pub gold_per_hit: f64,
    /// Whether enemy defeats let this unit summon.
    pub can_summon: bool,
    /// Summoner, for summons.
    pub summoned_by: Option<UnitId>,
    /// Summon template, for summons.
    pub summon_template: Option<SummonTemplateId>,
}

impl Unit {
    /// Creates a unit with default flags and no skills.
    #[must_use]
    pub fn new(id: UnitId, name: impl Into<String>, stats: UnitStats, resonance: Element) -> Self {
        Self {
            id,
            name: name.into(),
            level: 1,
            stats,
            resonance,
            skills: BTreeMap::new(),
            targeting: TargetMemory::default(),
            has_auto_attack: true,
            attack_timer: 0.0,
            gold_per_hit: 0.0,
            can_summon: false,
            summoned_by: None,
            summon_template: None,
        }
    }

    /// Adds a skill with the given state.
    #[must_use]
    pub fn with_skill(mut self, skill: impl Into<SkillId>, state: SkillState) -> Self {
        self.skills.insert(skill.into(), state);
        self
    }

    /// Sets the level.
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.max(1);
        self
    }

    /// Sets whether the unit auto-attacks.
    #[must_use]
    pub fn with_auto_attack(mut self, enabled: bool) -> Self {
        self.has_auto_attack = enabled;
        self
    }

    /// Marks the unit as a summoner.
    #[must_use]
    pub fn with_summoning(mut self) -> Self {
        self.can_summon = true;
        self
    }

    /// Sets per-hit gold.
    #[must_use]
    pub fn with_gold_per_hit(mut self, gold: f64) -> Self {
        self.gold_per_hit = gold.max(0.0);
        self
    }

    /// Whether this unit is a summon.
    #[must_use]
    pub fn is_summon(&self) -> bool {
        self.summoned_by.is_some()
    }

    /// Whether the unit can still act.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.stats.health > 0.0
    }

    /// Seconds between basic attacks for this unit.
    #[must_use]
    pub fn attack_interval(&self, config: &AttackConfig) -> f64 {
        (config.base_interval - self.stats.speed * config.speed_factor).max(config.min_interval)
    }

    /// Restores health up to the maximum. Returns the amount restored.
    pub fn heal(&mut self, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.stats.health;
        self.stats.health = (before + amount).min(self.stats.max_health);
        self.stats.health - before
    }

    /// Skill ids this unit owns.
    pub fn skill_ids(&self) -> impl Iterator<Item = &SkillId> {
        self.skills.keys()
    }
}
