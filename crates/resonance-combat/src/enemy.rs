//! Spawned enemy instances.

use crate::element::Element;
use resonance_common::{EnemyTemplateId, EnemyUid};
use serde::{Deserialize, Serialize};

/// Presentation-only effect tag with a countdown.
///
/// Nothing in the combat core reads it; hosts use it to drive flashes and tints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualEffect {
    /// Effect tag.
    pub tag: String,
    /// Seconds left.
    pub remaining: f64,
}

/// An enemy on the battle grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Template it was spawned from.
    pub template: EnemyTemplateId,
    /// Per-spawn unique id.
    pub uid: EnemyUid,
    /// Display name.
    pub name: String,
    /// Level (the global wave it spawned on).
    pub level: u32,
    /// Current health.
    pub health: f64,
    /// Health at spawn.
    pub max_health: f64,
    /// Attack power.
    pub attack_power: f64,
    /// Category tag (pest, humanoid, undead, ...).
    pub category: String,
    /// Damage element, if the template declared a known one.
    pub element: Option<Element>,
    /// Whether this is the area boss.
    pub is_boss: bool,
    /// Optional presentation hint.
    pub visual: Option<VisualEffect>,
}

impl Enemy {
    /// Whether the enemy still has health.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Fraction of health remaining (0.0-1.0).
    #[must_use]
    pub fn health_fraction(&self) -> f64 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    /// Sets a visual effect for `seconds`.
    pub fn set_visual(&mut self, tag: impl Into<String>, seconds: f64) {
        self.visual = Some(VisualEffect {
            tag: tag.into(),
            remaining: seconds.max(0.0),
        });
    }

    /// Counts the visual effect down, clearing it when it runs out.
    pub fn tick_visual(&mut self, dt: f64) {
        if let Some(effect) = &mut self.visual {
            effect.remaining -= dt;
            if effect.remaining <= 0.0 {
                self.visual = None;
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn test_enemy(uid: u64, element: Option<Element>, health: f64) -> Enemy {
    Enemy {
        template: EnemyTemplateId::new("rat"),
        uid: EnemyUid::new(uid),
        name: "Rat".into(),
        level: 1,
        health,
        max_health: health,
        attack_power: 5.0,
        category: "pest".into(),
        element,
        is_boss: false,
        visual: None,
    }
}
