//! Content tables and their validation.
//!
//! A [`ContentPack`] is plain data (usually RON). Together with the skills and
//! spells registered in code it is validated once into a read-only
//! [`ContentRegistry`]; every cross-reference is checked there so the combat
//! loop never meets a dangling id at runtime.

use crate::element::{deserialize_lenient, Element, MatchupTable};
use crate::skills::{SkillKind, SkillRegistry};
use crate::spells::SpellRegistry;
use crate::unit::{SkillState, Unit, UnitStats};
use ahash::{AHashMap, AHashSet};
use resonance_common::{AreaId, ContentError, EnemyTemplateId, SkillId, SummonTemplateId, UnitId};
use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};
use tracing::info;

fn default_true() -> bool {
    true
}

fn default_category() -> String {
    "humanoid".to_string()
}

fn default_level() -> u32 {
    1
}

// ============================================================================
// Tables
// ============================================================================

/// Enemy archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    /// Key.
    pub id: EnemyTemplateId,
    /// Display name.
    pub name: String,
    /// Category tag, drives the scaling exponent.
    #[serde(default = "default_category")]
    pub category: String,
    /// Element tag; unknown tags load as `None`.
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub element: Option<Element>,
    /// Wave 1 attack; falls back to the scaling default.
    #[serde(default)]
    pub base_attack: Option<f64>,
}

/// An area: a pool of enemies, a wave count, and a boss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaDefinition {
    /// Key.
    pub id: AreaId,
    /// Display name.
    pub name: String,
    /// Waves before the area is complete; the last one is the boss wave.
    pub max_waves: u32,
    /// Spawn pool.
    #[serde(default)]
    pub enemies: Vec<EnemyTemplateId>,
    /// Boss of the final wave.
    #[serde(default)]
    pub boss: Option<EnemyTemplateId>,
    /// Area played after this one; the first area when absent.
    #[serde(default)]
    pub next_area: Option<AreaId>,
}

/// A skill owned by a unit or summon template, with its starting state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSlot {
    /// Skill key.
    pub skill: SkillId,
    /// Starting cooldown in milliseconds.
    #[serde(default)]
    pub cooldown_remaining: f64,
    /// Whether the scheduler drives it.
    #[serde(default = "default_true")]
    pub active: bool,
}

impl SkillSlot {
    /// A ready, active slot.
    pub fn new(skill: impl Into<SkillId>) -> Self {
        Self {
            skill: skill.into(),
            cooldown_remaining: 0.0,
            active: true,
        }
    }

    pub(crate) fn state(&self) -> SkillState {
        SkillState {
            cooldown_remaining: self.cooldown_remaining.max(0.0),
            active: self.active,
        }
    }
}

/// A summonable ally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummonTemplate {
    /// Key.
    pub id: SummonTemplateId,
    /// Display name.
    pub name: String,
    /// Damage element.
    pub element: Element,
    /// Lifetime in seconds before upgrades.
    pub base_duration: f64,
    /// Stats of a single stack.
    #[serde(default)]
    pub base_stats: UnitStats,
    /// Whether it swings on its own.
    #[serde(default = "default_true")]
    pub has_auto_attack: bool,
    /// Skills it fields with.
    #[serde(default)]
    pub skills: Vec<SkillSlot>,
    /// Position in the progression chain and in the weighted roll.
    #[serde(default)]
    pub order: u32,
    /// Probability share in the weighted roll.
    #[serde(default)]
    pub chance: f64,
    /// Skill fired when an instance expires.
    #[serde(default)]
    pub on_expire: Option<SkillId>,
}

/// A party member blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefinition {
    /// Display name.
    pub name: String,
    /// Level.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Stats.
    #[serde(default)]
    pub stats: UnitStats,
    /// Damage element.
    pub resonance: Element,
    /// Owned skills.
    #[serde(default)]
    pub skills: Vec<SkillSlot>,
    /// Whether it swings on its own.
    #[serde(default = "default_true")]
    pub has_auto_attack: bool,
    /// Flat gold per basic attack.
    #[serde(default)]
    pub gold_per_hit: f64,
    /// Whether enemy defeats let it summon.
    #[serde(default)]
    pub can_summon: bool,
}

impl UnitDefinition {
    /// Creates a definition with default stats and no skills.
    pub fn new(name: impl Into<String>, resonance: Element) -> Self {
        Self {
            name: name.into(),
            level: 1,
            stats: UnitStats::default(),
            resonance,
            skills: Vec::new(),
            has_auto_attack: true,
            gold_per_hit: 0.0,
            can_summon: false,
        }
    }

    /// Builds the roster unit under `id`.
    #[must_use]
    pub fn instantiate(&self, id: UnitId) -> Unit {
        let mut stats = self.stats;
        stats.validate();

        let mut unit = Unit::new(id, self.name.clone(), stats, self.resonance)
            .with_level(self.level)
            .with_auto_attack(self.has_auto_attack)
            .with_gold_per_hit(self.gold_per_hit.max(0.0));
        if self.can_summon {
            unit = unit.with_summoning();
        }
        for slot in &self.skills {
            unit = unit.with_skill(slot.skill.clone(), slot.state());
        }
        unit
    }
}

/// Everything the data files declare.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPack {
    /// Enemy archetypes.
    pub enemies: Vec<EnemyTemplate>,
    /// Areas in play order.
    pub areas: Vec<AreaDefinition>,
    /// Summonable allies.
    pub summons: Vec<SummonTemplate>,
    /// Starting party.
    pub party: Vec<UnitDefinition>,
    /// Custom weakness relation; the standard one when absent.
    pub weaknesses: Option<Vec<(Element, Element)>>,
    /// Area to start in; the first area when absent.
    pub starting_area: Option<AreaId>,
}

impl ContentPack {
    /// Parses a RON document. `Option` fields may omit `Some(..)`.
    pub fn from_ron(src: &str) -> Result<Self, ContentError> {
        ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(src)
            .map_err(|e| ContentError::Parse(e.to_string()))
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Validated, read-only content.
#[derive(Debug, Clone)]
pub struct ContentRegistry {
    enemies: AHashMap<EnemyTemplateId, EnemyTemplate>,
    areas: Vec<AreaDefinition>,
    summons: Vec<SummonTemplate>,
    party: Vec<UnitDefinition>,
    matchups: MatchupTable,
    starting_area: AreaId,
    skills: SkillRegistry,
    spells: SpellRegistry,
}

impl ContentRegistry {
    /// Validates a pack against the registered skills and spells.
    pub fn new(
        pack: ContentPack,
        skills: SkillRegistry,
        spells: SpellRegistry,
    ) -> Result<Self, ContentError> {
        let ContentPack {
            enemies,
            areas,
            mut summons,
            party,
            weaknesses,
            starting_area,
        } = pack;

        let mut enemy_table = AHashMap::with_capacity(enemies.len());
        for enemy in enemies {
            if enemy_table.contains_key(&enemy.id) {
                return Err(ContentError::DuplicateId {
                    table: "enemy",
                    id: enemy.id.to_string(),
                });
            }
            enemy_table.insert(enemy.id.clone(), enemy);
        }

        let first_area = areas.first().map(|a| a.id.clone()).ok_or(ContentError::NoAreas)?;
        let mut area_ids = AHashSet::with_capacity(areas.len());
        for area in &areas {
            if !area_ids.insert(area.id.clone()) {
                return Err(ContentError::DuplicateId {
                    table: "area",
                    id: area.id.to_string(),
                });
            }
        }
        for area in &areas {
            if area.max_waves == 0 {
                return Err(ContentError::NoWaves {
                    area: area.id.clone(),
                });
            }
            for enemy in area.enemies.iter().chain(area.boss.iter()) {
                if !enemy_table.contains_key(enemy) {
                    return Err(ContentError::UnknownEnemy {
                        area: area.id.clone(),
                        enemy: enemy.clone(),
                    });
                }
            }
            if let Some(next) = &area.next_area {
                if !area_ids.contains(next) {
                    return Err(ContentError::UnknownArea {
                        area: area.id.clone(),
                        next: next.clone(),
                    });
                }
            }
        }
        let starting_area = match starting_area {
            Some(area) if area_ids.contains(&area) => area,
            Some(area) => return Err(ContentError::UnknownStartingArea(area)),
            None => first_area,
        };

        let mut summon_ids = AHashSet::with_capacity(summons.len());
        for summon in &summons {
            if !summon_ids.insert(summon.id.clone()) {
                return Err(ContentError::DuplicateId {
                    table: "summon",
                    id: summon.id.to_string(),
                });
            }
            for slot in &summon.skills {
                skills.require(summon.id.as_str(), &slot.skill)?;
            }
            if let Some(hook) = &summon.on_expire {
                if skills.get(hook).is_none() {
                    return Err(ContentError::UnknownExpiryHook {
                        summon: summon.id.clone(),
                        skill: hook.clone(),
                    });
                }
                skills.require_kind(summon.id.as_str(), hook, SkillKind::OnExpire)?;
            }
        }
        summons.sort_by_key(|s| s.order);

        for unit in &party {
            Self::check_unit(&skills, unit)?;
        }

        let matchups = match weaknesses {
            Some(pairs) => MatchupTable::from_weaknesses(pairs)?,
            None => MatchupTable::standard(),
        };

        info!(
            enemies = enemy_table.len(),
            areas = areas.len(),
            summons = summons.len(),
            skills = skills.len(),
            spells = spells.len(),
            "Content validated"
        );

        Ok(Self {
            enemies: enemy_table,
            areas,
            summons,
            party,
            matchups,
            starting_area,
            skills,
            spells,
        })
    }

    /// Parses RON and validates it.
    pub fn from_ron(
        src: &str,
        skills: SkillRegistry,
        spells: SpellRegistry,
    ) -> Result<Self, ContentError> {
        Self::new(ContentPack::from_ron(src)?, skills, spells)
    }

    fn check_unit(skills: &SkillRegistry, unit: &UnitDefinition) -> Result<(), ContentError> {
        for slot in &unit.skills {
            skills.require(&unit.name, &slot.skill)?;
        }
        Ok(())
    }

    /// Checks a unit added after start-up.
    pub fn validate_unit(&self, unit: &UnitDefinition) -> Result<(), ContentError> {
        Self::check_unit(&self.skills, unit)
    }

    /// Enemy template by id.
    #[must_use]
    pub fn enemy(&self, id: &EnemyTemplateId) -> Option<&EnemyTemplate> {
        self.enemies.get(id)
    }

    /// Area by id.
    #[must_use]
    pub fn area(&self, id: &AreaId) -> Option<&AreaDefinition> {
        self.areas.iter().find(|a| &a.id == id)
    }

    /// Areas in declaration order.
    #[must_use]
    pub fn areas(&self) -> &[AreaDefinition] {
        &self.areas
    }

    /// Area the run starts in.
    #[must_use]
    pub fn starting_area(&self) -> &AreaId {
        &self.starting_area
    }

    /// Area played after `id`: its declared successor, else the first area.
    #[must_use]
    pub fn successor(&self, id: &AreaId) -> AreaId {
        self.area(id)
            .and_then(|a| a.next_area.clone())
            .or_else(|| self.areas.first().map(|a| a.id.clone()))
            .unwrap_or_else(|| id.clone())
    }

    /// Summon templates sorted by `order`.
    #[must_use]
    pub fn summons(&self) -> &[SummonTemplate] {
        &self.summons
    }

    /// Summon template by id.
    #[must_use]
    pub fn summon(&self, id: &SummonTemplateId) -> Option<&SummonTemplate> {
        self.summons.iter().find(|s| &s.id == id)
    }

    /// Starting party.
    #[must_use]
    pub fn party(&self) -> &[UnitDefinition] {
        &self.party
    }

    /// Weakness relation.
    #[must_use]
    pub fn matchups(&self) -> &MatchupTable {
        &self.matchups
    }

    /// Registered skills.
    #[must_use]
    pub fn skills(&self) -> &SkillRegistry {
        &self.skills
    }

    /// Registered spells.
    #[must_use]
    pub fn spells(&self) -> &SpellRegistry {
        &self.spells
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small content set shared by the combat tests.

    use super::*;

    pub(crate) fn enemy(id: &str, element: Option<Element>) -> EnemyTemplate {
        EnemyTemplate {
            id: EnemyTemplateId::new(id),
            name: id.to_string(),
            category: "humanoid".to_string(),
            element,
            base_attack: None,
        }
    }

    pub(crate) fn area(id: &str, max_waves: u32, enemies: &[&str], boss: Option<&str>) -> AreaDefinition {
        AreaDefinition {
            id: AreaId::new(id),
            name: id.to_string(),
            max_waves,
            enemies: enemies.iter().map(|e| EnemyTemplateId::new(*e)).collect(),
            boss: boss.map(EnemyTemplateId::new),
            next_area: None,
        }
    }

    /// Two areas: `meadow` (10 waves, boss `ogre`) and `crypt` (3 waves).
    pub(crate) fn pack() -> ContentPack {
        ContentPack {
            enemies: vec![
                enemy("rat", Some(Element::Pest)),
                enemy("bandit", Some(Element::Physical)),
                enemy("ogre", Some(Element::Earth)),
                enemy("ghoul", Some(Element::Undead)),
            ],
            areas: vec![
                area("meadow", 10, &["rat", "bandit"], Some("ogre")),
                area("crypt", 3, &["ghoul"], None),
            ],
            summons: Vec::new(),
            party: vec![UnitDefinition::new("Knight", Element::Physical)],
            weaknesses: None,
            starting_area: None,
        }
    }
}
