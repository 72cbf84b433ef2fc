//! Per-unit, per-skill cooldown timers.

use crate::party::Roster;
use crate::skills::{SkillDefinition, SkillRegistry};
use crate::unit::SkillState;
use resonance_common::{SkillId, UnitId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A skill that became ready this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillReady {
    /// Owner.
    pub unit: UnitId,
    /// Skill.
    pub skill: SkillId,
}

/// Stateless driver over the cooldown state stored on each unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CooldownScheduler;

impl CooldownScheduler {
    /// Creates a scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Counts every scheduled skill down by `elapsed_ms`.
    ///
    /// A skill is reported when it crosses zero this tick, or when it was
    /// already at zero. Reported skills stay at zero: the caller runs the
    /// hook and then calls [`rearm`](Self::rearm), after which a further
    /// `advance(0)` reports nothing.
    ///
    /// Results are in roster order, then skill-id order.
    pub fn advance(
        &self,
        roster: &mut Roster,
        skills: &SkillRegistry,
        elapsed_ms: f64,
    ) -> Vec<SkillReady> {
        let elapsed_ms = if elapsed_ms.is_finite() {
            elapsed_ms.max(0.0)
        } else {
            0.0
        };

        let mut ready = Vec::new();
        for unit in roster.iter_mut() {
            for (id, state) in &mut unit.skills {
                let Some(def) = skills.get(id) else {
                    continue;
                };
                if !state.active || !def.is_scheduled() {
                    continue;
                }

                let previous = state.cooldown_remaining;
                state.cooldown_remaining = (previous - elapsed_ms).max(0.0);

                let crossed = previous > 0.0 && state.cooldown_remaining <= 0.0;
                if crossed || previous <= 0.0 {
                    debug!(unit = %unit.id, skill = %id, "Skill ready");
                    ready.push(SkillReady {
                        unit: unit.id,
                        skill: id.clone(),
                    });
                }
            }
        }
        ready
    }

    /// Resets a skill to its declared cooldown.
    pub fn rearm(state: &mut SkillState, def: &SkillDefinition) {
        state.cooldown_remaining = def.cooldown_ms;
    }
}
