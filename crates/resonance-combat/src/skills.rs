//! Skill definitions, hook traits, and the skill registry.
//!
//! Skill content is supplied by the host. The core only knows the four kinds
//! and the signature each kind is invoked with:
//!
//! | Kind      | Invoked by                         | Hook           |
//! |-----------|------------------------------------|----------------|
//! | Passive   | damage resolution, basic attacks   | [`PassiveHook`] |
//! | Active    | cooldown scheduler or manual cast  | [`ActiveHook`]  |
//! | Utility   | manual cast                        | [`ActiveHook`]  |
//! | OnExpire  | summon expiry                      | [`ExpireHook`]  |

use crate::context::CastContext;
use crate::damage::DamageContext;
use crate::element::Element;
use crate::enemy::Enemy;
use crate::summon::SummonInstance;
use crate::unit::Unit;
use ahash::AHashMap;
use resonance_common::{ContentError, SkillId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Category of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    /// Fires when its cooldown elapses.
    Active,
    /// Rewrites damage on every basic attack.
    Passive,
    /// Fires on demand.
    Utility,
    /// Fires when the owning summon expires.
    OnExpire,
}

impl SkillKind {
    /// Name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Passive => "passive",
            Self::Utility => "utility",
            Self::OnExpire => "on_expire",
        }
    }
}

// ============================================================================
// Hooks
// ============================================================================

/// Damage modifier run on basic attacks.
pub trait PassiveHook: Send + Sync {
    /// Rewrites `ctx.damage`.
    fn apply(&self, attacker: &Unit, target: &Enemy, ctx: &mut DamageContext);
}

impl<F> PassiveHook for F
where
    F: Fn(&Unit, &Enemy, &mut DamageContext) + Send + Sync,
{
    fn apply(&self, attacker: &Unit, target: &Enemy, ctx: &mut DamageContext) {
        self(attacker, target, ctx);
    }
}

/// Activation of an active or utility skill.
pub trait ActiveHook: Send + Sync {
    /// Performs the skill's effect.
    fn activate(&self, ctx: &mut CastContext<'_>);
}

impl<F> ActiveHook for F
where
    F: Fn(&mut CastContext<'_>) + Send + Sync,
{
    fn activate(&self, ctx: &mut CastContext<'_>) {
        self(ctx);
    }
}

/// Effect fired when a summon expires.
pub trait ExpireHook: Send + Sync {
    /// Performs the expiry effect for `summon`.
    fn on_expire(&self, summon: &SummonInstance, ctx: &mut CastContext<'_>);
}

impl<F> ExpireHook for F
where
    F: Fn(&SummonInstance, &mut CastContext<'_>) + Send + Sync,
{
    fn on_expire(&self, summon: &SummonInstance, ctx: &mut CastContext<'_>) {
        self(summon, ctx);
    }
}

/// A skill's behavior, tagged by kind.
#[derive(Clone)]
pub enum SkillBehavior {
    /// Damage modifier.
    Passive(Arc<dyn PassiveHook>),
    /// Cooldown-driven activation.
    Active(Arc<dyn ActiveHook>),
    /// On-demand activation.
    Utility(Arc<dyn ActiveHook>),
    /// Summon expiry effect.
    OnExpire(Arc<dyn ExpireHook>),
}

impl SkillBehavior {
    /// Wraps a passive hook.
    pub fn passive(hook: impl PassiveHook + 'static) -> Self {
        Self::Passive(Arc::new(hook))
    }

    /// Wraps an active hook.
    pub fn active(hook: impl ActiveHook + 'static) -> Self {
        Self::Active(Arc::new(hook))
    }

    /// Wraps a utility hook.
    pub fn utility(hook: impl ActiveHook + 'static) -> Self {
        Self::Utility(Arc::new(hook))
    }

    /// Wraps an expiry hook.
    pub fn on_expire(hook: impl ExpireHook + 'static) -> Self {
        Self::OnExpire(Arc::new(hook))
    }

    /// Kind of this behavior.
    #[must_use]
    pub fn kind(&self) -> SkillKind {
        match self {
            Self::Passive(_) => SkillKind::Passive,
            Self::Active(_) => SkillKind::Active,
            Self::Utility(_) => SkillKind::Utility,
            Self::OnExpire(_) => SkillKind::OnExpire,
        }
    }
}

impl fmt::Debug for SkillBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SkillBehavior::{}", self.kind().as_str())
    }
}

// ============================================================================
// Definitions
// ============================================================================

/// A registered skill.
#[derive(Debug, Clone)]
pub struct SkillDefinition {
    /// Registry key.
    pub id: SkillId,
    /// Display name.
    pub name: String,
    /// Declared element.
    pub element: Element,
    /// Cooldown in milliseconds (active skills only).
    pub cooldown_ms: f64,
    /// Hook.
    pub behavior: SkillBehavior,
}

impl SkillDefinition {
    /// Creates a definition named after its id, with no cooldown.
    pub fn new(id: impl Into<SkillId>, element: Element, behavior: SkillBehavior) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            element,
            cooldown_ms: 0.0,
            behavior,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the cooldown in milliseconds.
    #[must_use]
    pub fn with_cooldown_ms(mut self, cooldown_ms: f64) -> Self {
        self.cooldown_ms = cooldown_ms.max(0.0);
        self
    }

    /// Kind of the skill.
    #[must_use]
    pub fn kind(&self) -> SkillKind {
        self.behavior.kind()
    }

    /// Whether the cooldown scheduler drives this skill.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.kind() == SkillKind::Active && self.cooldown_ms > 0.0
    }
}

/// Read-only lookup of skills by id.
#[derive(Debug, Clone, Default)]
pub struct SkillRegistry {
    skills: AHashMap<SkillId, SkillDefinition>,
}

impl SkillRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a skill; ids must be unique.
    pub fn register(&mut self, skill: SkillDefinition) -> Result<(), ContentError> {
        if self.skills.contains_key(&skill.id) {
            return Err(ContentError::DuplicateId {
                table: "skill",
                id: skill.id.to_string(),
            });
        }
        self.skills.insert(skill.id.clone(), skill);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, skill: SkillDefinition) -> Result<Self, ContentError> {
        self.register(skill)?;
        Ok(self)
    }

    /// Skill by id.
    #[must_use]
    pub fn get(&self, id: &SkillId) -> Option<&SkillDefinition> {
        self.skills.get(id)
    }

    /// Skill by id, or the content error naming `owner`.
    pub fn require(&self, owner: &str, id: &SkillId) -> Result<&SkillDefinition, ContentError> {
        self.get(id).ok_or_else(|| ContentError::UnknownSkill {
            owner: owner.to_string(),
            skill: id.clone(),
        })
    }

    /// Skill by id that must be of `kind`.
    pub fn require_kind(
        &self,
        owner: &str,
        id: &SkillId,
        kind: SkillKind,
    ) -> Result<&SkillDefinition, ContentError> {
        let skill = self.require(owner, id)?;
        if skill.kind() != kind {
            return Err(ContentError::SkillKindMismatch {
                skill: id.clone(),
                expected: kind.as_str(),
                actual: skill.kind().as_str(),
            });
        }
        Ok(skill)
    }

    /// Passive hooks of every skill a unit owns, in skill-id order.
    #[must_use]
    pub fn passives_for(&self, unit: &Unit) -> Vec<Arc<dyn PassiveHook>> {
        unit.skill_ids()
            .filter_map(|id| match self.get(id).map(|s| &s.behavior) {
                Some(SkillBehavior::Passive(hook)) => Some(Arc::clone(hook)),
                _ => None,
            })
            .collect()
    }

    /// Number of skills.
    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Whether no skills are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{SkillState, UnitStats};
    use resonance_common::UnitId;

    fn plus_one(_: &Unit, _: &Enemy, ctx: &mut DamageContext) {
        ctx.damage += 1.0;
    }

    fn noop(_: &mut CastContext<'_>) {}

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = SkillRegistry::new();
        let skill = SkillDefinition::new("pummel", Element::Physical, SkillBehavior::active(noop));
        assert!(registry.register(skill.clone()).is_ok());
        assert!(matches!(
            registry.register(skill),
            Err(ContentError::DuplicateId { table: "skill", .. })
        ));
    }

    #[test]
    fn test_require_kind() {
        let registry = SkillRegistry::new()
            .with(SkillDefinition::new("focus", Element::Physical, SkillBehavior::passive(plus_one)))
            .expect("register");

        assert!(registry
            .require_kind("unit", &SkillId::new("focus"), SkillKind::Passive)
            .is_ok());
        assert!(matches!(
            registry.require_kind("unit", &SkillId::new("focus"), SkillKind::Active),
            Err(ContentError::SkillKindMismatch { .. })
        ));
        assert!(matches!(
            registry.require("unit", &SkillId::new("missing")),
            Err(ContentError::UnknownSkill { .. })
        ));
    }

    #[test]
    fn test_passives_for_unit() {
        let registry = SkillRegistry::new()
            .with(SkillDefinition::new("focus", Element::Physical, SkillBehavior::passive(plus_one)))
            .and_then(|r| {
                r.with(
                    SkillDefinition::new("pummel", Element::Physical, SkillBehavior::active(noop))
                        .with_cooldown_ms(1000.0),
                )
            })
            .expect("register");

        let unit = Unit::new(UnitId::new(1), "u", UnitStats::default(), Element::Physical)
            .with_skill("focus", SkillState::default())
            .with_skill("pummel", SkillState::default());

        assert_eq!(registry.passives_for(&unit).len(), 1);
        assert!(registry
            .get(&SkillId::new("pummel"))
            .is_some_and(SkillDefinition::is_scheduled));
    }
}
