//! Hero spells and the consumable spell hand.

use crate::context::CastContext;
use crate::element::Element;
use ahash::AHashMap;
use resonance_common::{CommandError, ContentError, SpellId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Effect of a hero spell.
pub trait SpellHook: Send + Sync {
    /// Performs the spell. `ctx` has no caster and targets the focused enemy.
    fn cast(&self, spell: &SpellDefinition, ctx: &mut CastContext<'_>);
}

impl<F> SpellHook for F
where
    F: Fn(&SpellDefinition, &mut CastContext<'_>) + Send + Sync,
{
    fn cast(&self, spell: &SpellDefinition, ctx: &mut CastContext<'_>) {
        self(spell, ctx);
    }
}

/// A registered hero spell.
#[derive(Clone)]
pub struct SpellDefinition {
    /// Registry key.
    pub id: SpellId,
    /// Display name.
    pub name: String,
    /// Damage element.
    pub element: Element,
    /// Percentage points added to the element percentage when resolved.
    pub magnitude: f64,
    /// Gems spent to cast.
    pub gem_cost: u64,
    /// Library level needed to draw it.
    pub tier: u32,
    /// Effect.
    pub hook: Arc<dyn SpellHook>,
}

impl fmt::Debug for SpellDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpellDefinition")
            .field("id", &self.id)
            .field("element", &self.element)
            .field("magnitude", &self.magnitude)
            .field("gem_cost", &self.gem_cost)
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

impl SpellDefinition {
    /// Creates a tier 1, free spell.
    pub fn new(
        id: impl Into<SpellId>,
        element: Element,
        magnitude: f64,
        hook: impl SpellHook + 'static,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            element,
            magnitude,
            gem_cost: 0,
            tier: 1,
            hook: Arc::new(hook),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the gem cost.
    #[must_use]
    pub fn with_cost(mut self, gems: u64) -> Self {
        self.gem_cost = gems;
        self
    }

    /// Sets the unlock tier.
    #[must_use]
    pub fn with_tier(mut self, tier: u32) -> Self {
        self.tier = tier;
        self
    }
}

/// Lookup of spells by id.
#[derive(Debug, Clone, Default)]
pub struct SpellRegistry {
    spells: AHashMap<SpellId, SpellDefinition>,
}

impl SpellRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a spell; ids must be unique.
    pub fn register(&mut self, spell: SpellDefinition) -> Result<(), ContentError> {
        if self.spells.contains_key(&spell.id) {
            return Err(ContentError::DuplicateId {
                table: "spell",
                id: spell.id.to_string(),
            });
        }
        self.spells.insert(spell.id.clone(), spell);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, spell: SpellDefinition) -> Result<Self, ContentError> {
        self.register(spell)?;
        Ok(self)
    }

    /// Spell by id.
    #[must_use]
    pub fn get(&self, id: &SpellId) -> Option<&SpellDefinition> {
        self.spells.get(id)
    }

    /// Ids of spells with `tier <= level`, sorted.
    #[must_use]
    pub fn unlocked(&self, level: u32) -> Vec<SpellId> {
        let mut ids: Vec<SpellId> = self
            .spells
            .values()
            .filter(|s| s.tier <= level)
            .map(|s| s.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of spells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spells.len()
    }

    /// Whether no spells are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }
}

/// Spell hand tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    /// Gems per draw.
    pub draw_cost: u64,
    /// Slots in a full hand.
    pub hand_size: usize,
    /// Library level; spells above it cannot be drawn.
    pub library_level: u32,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            draw_cost: 5,
            hand_size: 4,
            library_level: 1,
        }
    }
}

impl HandConfig {
    /// Clamps ranges.
    pub fn validate(&mut self) {
        self.hand_size = self.hand_size.clamp(1, 16);
    }
}

/// The spells currently in hand, in slot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpellHand {
    slots: Vec<SpellId>,
}

impl SpellHand {
    /// Creates an empty hand.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the hand with `min(size, unlocked)` spells drawn with
    /// replacement from the unlocked pool.
    ///
    /// Leaves the hand untouched when nothing is unlocked.
    pub fn draw(
        &mut self,
        registry: &SpellRegistry,
        config: &HandConfig,
        rng: &mut fastrand::Rng,
    ) -> Result<&[SpellId], CommandError> {
        let pool = registry.unlocked(config.library_level);
        if pool.is_empty() {
            return Err(CommandError::NoSpellsUnlocked);
        }
        let count = config.hand_size.min(pool.len());
        self.slots = (0..count)
            .map(|_| pool[rng.usize(..pool.len())].clone())
            .collect();
        Ok(&self.slots)
    }

    /// Spell in a slot.
    pub fn peek(&self, index: usize) -> Result<&SpellId, CommandError> {
        self.slots.get(index).ok_or(CommandError::EmptyHandSlot(index))
    }

    /// Removes a slot; later slots shift down.
    pub fn take(&mut self, index: usize) -> Result<SpellId, CommandError> {
        if index >= self.slots.len() {
            return Err(CommandError::EmptyHandSlot(index));
        }
        Ok(self.slots.remove(index))
    }

    /// Slots in order.
    #[must_use]
    pub fn slots(&self) -> &[SpellId] {
        &self.slots
    }

    /// Number of filled slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the hand is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &SpellDefinition, _: &mut CastContext<'_>) {}

    fn registry() -> SpellRegistry {
        SpellRegistry::new()
            .with(SpellDefinition::new("moonbeam", Element::Dark, 80.0, noop).with_cost(20))
            .and_then(|r| r.with(SpellDefinition::new("decay", Element::Undead, 180.0, noop).with_tier(2)))
            .expect("register")
    }

    #[test]
    fn test_unlocked_by_tier() {
        let spells = registry();
        assert_eq!(spells.unlocked(0), Vec::<SpellId>::new());
        assert_eq!(spells.unlocked(1), vec![SpellId::new("moonbeam")]);
        assert_eq!(spells.unlocked(2).len(), 2);
    }

    #[test]
    fn test_draw_limited_by_pool() {
        let spells = registry();
        let mut hand = SpellHand::new();
        let mut rng = fastrand::Rng::with_seed(3);
        let drawn = hand
            .draw(&spells, &HandConfig::default(), &mut rng)
            .expect("draw")
            .to_vec();
        assert_eq!(drawn, vec![SpellId::new("moonbeam")]);

        let config = HandConfig {
            library_level: 2,
            ..HandConfig::default()
        };
        assert_eq!(hand.draw(&spells, &config, &mut rng).map(<[SpellId]>::len), Ok(2));
    }

    #[test]
    fn test_draw_with_nothing_unlocked_keeps_hand() {
        let spells = registry();
        let mut hand = SpellHand::new();
        let mut rng = fastrand::Rng::with_seed(3);
        assert!(hand.draw(&spells, &HandConfig::default(), &mut rng).is_ok());

        let locked = HandConfig {
            library_level: 0,
            ..HandConfig::default()
        };
        assert_eq!(
            hand.draw(&spells, &locked, &mut rng).map(<[SpellId]>::len),
            Err(CommandError::NoSpellsUnlocked)
        );
        assert_eq!(hand.len(), 1);
    }

    #[test]
    fn test_take_shifts_slots() {
        let spells = registry();
        let mut hand = SpellHand::new();
        let mut rng = fastrand::Rng::with_seed(9);
        let config = HandConfig {
            library_level: 2,
            ..HandConfig::default()
        };
        let before = hand.draw(&spells, &config, &mut rng).expect("draw").to_vec();
        assert_eq!(hand.take(0), Ok(before[0].clone()));
        assert_eq!(hand.slots(), &before[1..]);
        assert_eq!(hand.take(5), Err(CommandError::EmptyHandSlot(5)));
    }
}
