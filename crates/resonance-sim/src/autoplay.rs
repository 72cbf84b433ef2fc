//! Built-in player: buys spell hands, casts spells, and fires utility skills.

use crate::config::AutoplayConfig;
use resonance_combat::{CombatLoop, Currency, SkillKind};
use resonance_common::{SkillId, UnitId};
use tracing::debug;

/// Issues commands the way an attentive player would.
#[derive(Debug, Clone)]
pub struct Autoplayer {
    config: AutoplayConfig,
    since_utility: f64,
}

impl Autoplayer {
    /// Create a player with the given habits.
    #[must_use]
    pub fn new(config: AutoplayConfig) -> Self {
        Self {
            config,
            since_utility: 0.0,
        }
    }

    /// Act after a combat step of `dt` seconds. Returns the commands accepted.
    ///
    /// Only commands that would succeed are issued.
    pub fn act(&mut self, combat: &mut CombatLoop, dt: f64) -> usize {
        if !self.config.enabled {
            return 0;
        }
        let mut accepted = 0;

        if self.config.draw_hands && Self::can_draw(combat) && combat.draw_hand().is_ok() {
            accepted += 1;
        }

        if self.config.cast_spells {
            if let Some(index) = Self::affordable_slot(combat) {
                if combat.cast_from_hand(index).is_ok() {
                    accepted += 1;
                }
            }
        }

        if self.config.utility_interval > 0.0 {
            self.since_utility += dt.max(0.0);
            if self.since_utility >= self.config.utility_interval && has_enemies(combat) {
                self.since_utility = 0.0;
                for (unit, skill) in utility_skills(combat) {
                    if combat.cast_skill(unit, &skill).is_ok() {
                        debug!(%unit, %skill, "Autoplay cast utility");
                        accepted += 1;
                    }
                }
            }
        }

        accepted
    }

    fn can_draw(combat: &CombatLoop) -> bool {
        let hand = &combat.config().hand;
        combat.hand().is_empty()
            && combat.balance(Currency::Gems).floor() >= hand.draw_cost as f64
            && !combat
                .content()
                .spells()
                .unlocked(hand.library_level)
                .is_empty()
    }

    fn affordable_slot(combat: &CombatLoop) -> Option<usize> {
        if !has_enemies(combat) {
            return None;
        }
        let gems = combat.balance(Currency::Gems).floor();
        let spells = combat.content().spells();
        combat.hand().slots().iter().position(|id| {
            spells
                .get(id)
                .is_some_and(|spell| spell.gem_cost as f64 <= gems)
        })
    }
}

fn has_enemies(combat: &CombatLoop) -> bool {
    combat.waves().is_active() && !combat.waves().grid().is_empty()
}

fn utility_skills(combat: &CombatLoop) -> Vec<(UnitId, SkillId)> {
    let skills = combat.content().skills();
    combat
        .roster()
        .members()
        .flat_map(|unit| {
            unit.skill_ids()
                .filter(|id| skills.get(id).map(|s| s.kind()) == Some(SkillKind::Utility))
                .map(move |id| (unit.id, id.clone()))
        })
        .collect()
}
