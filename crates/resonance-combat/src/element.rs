//! Elemental damage typing.
//!
//! This module provides:
//! - The closed element vocabulary shared by units, enemies and skills
//! - The directed "is weak to" relation
//! - Matchup resolution into weakness / resistance / neutral tiers
//! - The wave-keyed neutral sturdiness ramp

use ahash::AHashMap;
use resonance_common::ContentError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Element Vocabulary
// ============================================================================

/// A damage-type tag.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    /// Plain weapon damage.
    #[default]
    Physical,
    /// Fire.
    Fire,
    /// Water.
    Water,
    /// Air.
    Air,
    /// Earth.
    Earth,
    /// Poison.
    Poison,
    /// Light.
    Light,
    /// Dark.
    Dark,
    /// Undead.
    Undead,
    /// Pest (vermin swarms).
    Pest,
}

impl Element {
    /// Every element, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Physical,
        Self::Fire,
        Self::Water,
        Self::Air,
        Self::Earth,
        Self::Poison,
        Self::Light,
        Self::Dark,
        Self::Undead,
        Self::Pest,
    ];

    /// Lowercase tag used in content files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Fire => "fire",
            Self::Water => "water",
            Self::Air => "air",
            Self::Earth => "earth",
            Self::Poison => "poison",
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Undead => "undead",
            Self::Pest => "pest",
        }
    }

    /// Parses a tag, ignoring case and surrounding whitespace.
    ///
    /// Unknown tags yield `None` rather than an error.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deserializes an element tag, mapping unknown tags to `None`.
///
/// Used with `#[serde(default, deserialize_with = "...")]` on content fields so
/// a typo in a data table degrades to a neutral matchup instead of a load failure.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Element>, D::Error>
where
    D: Deserializer<'de>,
{
    let tag = String::deserialize(deserializer)?;
    Ok(Element::from_tag(&tag))
}

// ============================================================================
// Matchup Results
// ============================================================================

/// Outcome category of an elemental matchup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchupTier {
    /// Defender is weak to the attack element.
    Weakness,
    /// Defender resists the attack element.
    Resistance,
    /// No relation between the two elements.
    Neutral,
}

impl MatchupTier {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weakness => "weakness",
            Self::Resistance => "resistance",
            Self::Neutral => "neutral",
        }
    }
}

/// A resolved matchup: its tier and the damage multiplier it implies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    /// Tier of the matchup.
    pub tier: MatchupTier,
    /// Damage multiplier.
    pub multiplier: f64,
}

impl Matchup {
    /// Neutral 1.0, used whenever a tag is missing.
    pub const NEUTRAL: Self = Self {
        tier: MatchupTier::Neutral,
        multiplier: 1.0,
    };
}

/// Attacker stats that shape weakness and resistance multipliers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchupStats {
    /// Fraction of resistance ignored (0.0-1.0).
    pub penetration: f64,
    /// Added to the weakness multiplier.
    pub weakness_bonus: f64,
}

// ============================================================================
// Neutral Ramp
// ============================================================================

/// One step of the neutral ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampStep {
    /// Last wave (inclusive) this step covers.
    pub up_to_wave: u32,
    /// Neutral multiplier for waves in this step.
    pub multiplier: f64,
}

/// Global enemy sturdiness ramp applied to neutral matchups.
///
/// Keyed only by the current wave, not by defender type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeutralRamp {
    /// Ordered steps; the first step whose `up_to_wave` covers the wave wins.
    pub steps: Vec<RampStep>,
    /// Multiplier past the last step.
    pub beyond: f64,
}

impl Default for NeutralRamp {
    fn default() -> Self {
        Self {
            steps: vec![
                RampStep {
                    up_to_wave: 30,
                    multiplier: 1.0,
                },
                RampStep {
                    up_to_wave: 50,
                    multiplier: 0.8,
                },
                RampStep {
                    up_to_wave: 70,
                    multiplier: 0.6,
                },
            ],
            beyond: 0.5,
        }
    }
}

impl NeutralRamp {
    /// A ramp that never reduces neutral damage.
    #[must_use]
    pub fn flat() -> Self {
        Self {
            steps: Vec::new(),
            beyond: 1.0,
        }
    }

    /// Neutral multiplier at the given wave.
    #[must_use]
    pub fn multiplier(&self, wave: u32) -> f64 {
        self.steps
            .iter()
            .find(|step| wave <= step.up_to_wave)
            .map_or(self.beyond, |step| step.multiplier)
    }

    /// Sorts steps and clamps multipliers to non-negative values.
    pub fn validate(&mut self) {
        self.steps.sort_by_key(|step| step.up_to_wave);
        for step in &mut self.steps {
            step.multiplier = step.multiplier.max(0.0);
        }
        self.beyond = self.beyond.max(0.0);
    }
}

// ============================================================================
// Matchup Table
// ============================================================================

/// The directed weakness relation plus the neutral ramp.
#[derive(Debug, Clone)]
pub struct MatchupTable {
    weaknesses: AHashMap<Element, Element>,
    ramp: NeutralRamp,
}

impl Default for MatchupTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl MatchupTable {
    /// Default relation: `(element, what it is weak to)`.
    ///
    /// Light, dark and undead form a cycle so the relation has no mutual pair.
    pub const DEFAULT_WEAKNESSES: [(Element, Element); 10] = [
        (Element::Fire, Element::Water),
        (Element::Water, Element::Air),
        (Element::Air, Element::Earth),
        (Element::Earth, Element::Fire),
        (Element::Poison, Element::Water),
        (Element::Physical, Element::Poison),
        (Element::Pest, Element::Physical),
        (Element::Undead, Element::Light),
        (Element::Light, Element::Dark),
        (Element::Dark, Element::Undead),
    ];

    /// Table with the default relation and default ramp.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            weaknesses: Self::DEFAULT_WEAKNESSES.into_iter().collect(),
            ramp: NeutralRamp::default(),
        }
    }

    /// Builds a table from `(element, weak_to)` pairs.
    ///
    /// Rejects an element weak to itself, an element listed twice, and mutual
    /// pairs (which would make one ordered pair both weakness and resistance).
    pub fn from_weaknesses<I>(pairs: I) -> Result<Self, ContentError>
    where
        I: IntoIterator<Item = (Element, Element)>,
    {
        let mut weaknesses = AHashMap::new();
        for (element, weak_to) in pairs {
            if element == weak_to {
                return Err(ContentError::InvalidMatchup(format!(
                    "{element} cannot be weak to itself"
                )));
            }
            if weaknesses.insert(element, weak_to).is_some() {
                return Err(ContentError::DuplicateId {
                    table: "weakness",
                    id: element.to_string(),
                });
            }
        }

        for (&element, &weak_to) in &weaknesses {
            if weaknesses.get(&weak_to) == Some(&element) {
                return Err(ContentError::InvalidMatchup(format!(
                    "{element} and {weak_to} are weak to each other"
                )));
            }
        }

        Ok(Self {
            weaknesses,
            ramp: NeutralRamp::default(),
        })
    }

    /// Replaces the neutral ramp.
    #[must_use]
    pub fn with_ramp(mut self, ramp: NeutralRamp) -> Self {
        self.ramp = ramp;
        self
    }

    /// The neutral ramp in use.
    #[must_use]
    pub fn ramp(&self) -> &NeutralRamp {
        &self.ramp
    }

    /// What the element is weak to, if anything.
    #[must_use]
    pub fn weakness_of(&self, element: Element) -> Option<Element> {
        self.weaknesses.get(&element).copied()
    }

    /// Iterates over `(element, weak_to)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (Element, Element)> + '_ {
        self.weaknesses.iter().map(|(&e, &w)| (e, w))
    }

    /// Classifies an attack against a defender. First match wins.
    #[must_use]
    pub fn tier(&self, attack: Element, defender: Element) -> MatchupTier {
        if self.weakness_of(defender) == Some(attack) {
            MatchupTier::Weakness
        } else if self.weakness_of(attack) == Some(defender) {
            MatchupTier::Resistance
        } else {
            MatchupTier::Neutral
        }
    }

    /// Resolves the multiplier for an attack.
    ///
    /// A missing tag on either side is neutral 1.0 with no wave ramp.
    #[must_use]
    pub fn resolve(
        &self,
        attack: Option<Element>,
        defender: Option<Element>,
        stats: MatchupStats,
        wave: u32,
    ) -> Matchup {
        let (Some(attack), Some(defender)) = (attack, defender) else {
            return Matchup::NEUTRAL;
        };

        let tier = self.tier(attack, defender);
        let multiplier = match tier {
            MatchupTier::Weakness => 2.0 + stats.weakness_bonus.max(0.0),
            MatchupTier::Resistance => 0.2 + stats.penetration.clamp(0.0, 1.0) * 0.8,
            MatchupTier::Neutral => self.ramp.multiplier(wave),
        };
        Matchup { tier, multiplier }
    }
}
