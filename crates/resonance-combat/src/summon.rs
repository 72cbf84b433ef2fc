//! Temporary summoned allies.
//!
//! Instances live in two places: the [`SummonLifecycle`] tracks their
//! duration and stacks, while the [`Roster`] holds the unit that fights.
//! Everything that adds or removes a summon goes through this module so the
//! two never disagree.

use crate::content::SummonTemplate;
use crate::element::Element;
use crate::party::Roster;
use crate::unit::{Unit, UnitStats};
use resonance_common::{SkillId, SummonTemplateId, UnitId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a defeat picks the template to summon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummonPolicy {
    /// The first template, by order, the summoner does not already have out.
    ProgressionChain,
    /// One roll; templates claim intervals of their chance. Repeats stack.
    #[default]
    WeightedStacking,
}

/// Summon tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummonConfig {
    /// Template selection rule.
    pub policy: SummonPolicy,
    /// Seconds added to every template's base duration.
    pub duration_bonus: f64,
    /// Attack added to a single stack before stacking.
    pub attack_bonus: f64,
}

impl Default for SummonConfig {
    fn default() -> Self {
        Self {
            policy: SummonPolicy::default(),
            duration_bonus: 0.0,
            attack_bonus: 0.0,
        }
    }
}

impl SummonConfig {
    /// Clamps ranges.
    pub fn validate(&mut self) {
        self.duration_bonus = self.duration_bonus.max(0.0);
        self.attack_bonus = self.attack_bonus.max(0.0);
    }
}

/// A fielded summon.
#[derive(Debug, Clone, PartialEq)]
pub struct SummonInstance {
    /// Roster id of the summon's unit.
    pub unit: UnitId,
    /// Template it came from.
    pub template: SummonTemplateId,
    /// Unit that summoned it.
    pub summoner: UnitId,
    /// Element of the summon.
    pub element: Element,
    /// Stack count, at least 1.
    pub stacks: u32,
    /// Seconds left.
    pub duration: f64,
    /// Seconds a refresh restores.
    pub max_duration: f64,
    /// Stats for the current stack count.
    pub stats: UnitStats,
    /// Skill fired on expiry.
    pub on_expire: Option<SkillId>,
}

/// Result of a summon attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummonOutcome {
    /// A new instance joined the roster.
    Created(UnitId),
    /// An existing instance gained a stack.
    Stacked {
        /// Instance
        unit: UnitId,
        /// New stack count
        stacks: u32,
    },
    /// Nothing was summoned.
    NoSummon,
}

/// Owner of every summon instance.
#[derive(Debug, Clone, Default)]
pub struct SummonLifecycle {
    config: SummonConfig,
    instances: Vec<SummonInstance>,
}

impl SummonLifecycle {
    /// Creates an empty lifecycle.
    #[must_use]
    pub fn new(config: SummonConfig) -> Self {
        Self {
            config,
            instances: Vec::new(),
        }
    }

    /// The tunables in use.
    #[must_use]
    pub fn config(&self) -> &SummonConfig {
        &self.config
    }

    /// Instances in creation order.
    #[must_use]
    pub fn instances(&self) -> &[SummonInstance] {
        &self.instances
    }

    /// Instance backing a roster unit.
    #[must_use]
    pub fn instance(&self, unit: UnitId) -> Option<&SummonInstance> {
        self.instances.iter().find(|i| i.unit == unit)
    }

    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether nothing is fielded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    fn stats_for(&self, template: &SummonTemplate, stacks: u32) -> UnitStats {
        let mut single = template.base_stats;
        single.attack_power += self.config.attack_bonus;
        single.health = single.max_health;
        single.scaled(f64::from(stacks.max(1)))
    }

    fn duration_for(&self, template: &SummonTemplate) -> f64 {
        (template.base_duration + self.config.duration_bonus).max(0.0)
    }

    fn select<'t>(
        &self,
        summoner: UnitId,
        templates: &'t [SummonTemplate],
        rng: &mut fastrand::Rng,
    ) -> Option<&'t SummonTemplate> {
        match self.config.policy {
            SummonPolicy::ProgressionChain => templates.iter().find(|t| {
                !self
                    .instances
                    .iter()
                    .any(|i| i.summoner == summoner && i.template == t.id)
            }),
            SummonPolicy::WeightedStacking => {
                let total: f64 = templates.iter().map(|t| t.chance.max(0.0)).sum();
                if total <= 0.0 || !total.is_finite() {
                    return None;
                }
                let mut roll = rng.f64();
                if total > 1.0 {
                    roll *= total;
                }
                let mut upper = 0.0;
                for template in templates {
                    upper += template.chance.max(0.0);
                    if roll < upper {
                        return Some(template);
                    }
                }
                None
            },
        }
    }

    /// Attempts a summon for `summoner`. `templates` must be sorted by order.
    pub fn trigger(
        &mut self,
        summoner: UnitId,
        roster: &mut Roster,
        templates: &[SummonTemplate],
        rng: &mut fastrand::Rng,
    ) -> SummonOutcome {
        if !roster.contains(summoner) {
            return SummonOutcome::NoSummon;
        }
        let Some(template) = self.select(summoner, templates, rng) else {
            return SummonOutcome::NoSummon;
        };

        let existing = self
            .instances
            .iter()
            .position(|i| i.summoner == summoner && i.template == template.id);

        if let Some(index) = existing {
            let stacks = self.instances[index].stacks.saturating_add(1);
            let stats = self.stats_for(template, stacks);
            let instance = &mut self.instances[index];
            instance.stacks = stacks;
            instance.duration = instance.max_duration;
            instance.stats = stats;
            if let Some(unit) = roster.get_mut(instance.unit) {
                unit.stats = stats;
            }
            debug!(summon = %instance.unit, template = %template.id, stacks, "Summon stacked");
            return SummonOutcome::Stacked {
                unit: instance.unit,
                stacks,
            };
        }

        let id = roster.next_summon_id();
        let stats = self.stats_for(template, 1);
        let duration = self.duration_for(template);

        let mut unit = Unit::new(id, template.name.clone(), stats, template.element)
            .with_auto_attack(template.has_auto_attack);
        unit.summoned_by = Some(summoner);
        unit.summon_template = Some(template.id.clone());
        for slot in &template.skills {
            unit = unit.with_skill(slot.skill.clone(), slot.state());
        }
        roster.insert(unit);

        self.instances.push(SummonInstance {
            unit: id,
            template: template.id.clone(),
            summoner,
            element: template.element,
            stacks: 1,
            duration,
            max_duration: duration,
            stats,
            on_expire: template.on_expire.clone(),
        });
        debug!(summon = %id, template = %template.id, %summoner, duration, "Summon created");
        SummonOutcome::Created(id)
    }

    /// Decays every instance by `dt` seconds and removes the expired ones from
    /// the roster. Returns them in creation order.
    pub fn advance(&mut self, dt: f64, roster: &mut Roster) -> Vec<SummonInstance> {
        for instance in &mut self.instances {
            instance.duration -= dt.max(0.0);
        }
        self.remove_where(roster, |i| i.duration <= 0.0)
    }

    /// Removes every summon owned by `summoner`.
    pub fn expire_owned_by(
        &mut self,
        summoner: UnitId,
        roster: &mut Roster,
    ) -> Vec<SummonInstance> {
        self.remove_where(roster, |i| i.summoner == summoner)
    }

    fn remove_where(
        &mut self,
        roster: &mut Roster,
        mut pred: impl FnMut(&SummonInstance) -> bool,
    ) -> Vec<SummonInstance> {
        let mut removed = Vec::new();
        self.instances.retain(|instance| {
            if pred(instance) {
                removed.push(instance.clone());
                false
            } else {
                true
            }
        });
        for instance in &removed {
            roster.remove(instance.unit);
            debug!(summon = %instance.unit, template = %instance.template, "Summon expired");
        }
        removed
    }
}
