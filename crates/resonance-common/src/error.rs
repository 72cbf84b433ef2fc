//! Error types for the Resonance combat core.

use crate::ids::{AreaId, EnemyTemplateId, SkillId, SpellId, SummonTemplateId, UnitId};
use thiserror::Error;

/// Top-level error type for Resonance operations.
#[derive(Debug, Error)]
pub enum ResonanceError {
    /// Content tables failed validation
    #[error("content error: {0}")]
    Content(#[from] ContentError),

    /// A host command was rejected
    #[error("command rejected: {0}")]
    Command(#[from] CommandError),

    /// Configuration could not be read or parsed
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Fatal content/configuration errors found while building the registry.
///
/// These indicate a data bug, never a runtime condition, so initialization
/// aborts instead of degrading to a no-op.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContentError {
    /// A unit, summon, or template references a skill that was never registered
    #[error("{owner} references unknown skill '{skill}'")]
    UnknownSkill {
        /// Who holds the reference
        owner: String,
        /// Missing skill key
        skill: SkillId,
    },

    /// A skill is registered but with the wrong kind for its use site
    #[error("skill '{skill}' is {actual}, expected {expected}")]
    SkillKindMismatch {
        /// Skill key
        skill: SkillId,
        /// Kind required by the reference
        expected: &'static str,
        /// Kind the registry holds
        actual: &'static str,
    },

    /// An area references an enemy template that does not exist
    #[error("area '{area}' references unknown enemy '{enemy}'")]
    UnknownEnemy {
        /// Area key
        area: AreaId,
        /// Missing enemy template
        enemy: EnemyTemplateId,
    },

    /// An area names a successor that does not exist
    #[error("area '{area}' names unknown successor '{next}'")]
    UnknownArea {
        /// Area key
        area: AreaId,
        /// Missing successor key
        next: AreaId,
    },

    /// The configured starting area does not exist
    #[error("unknown starting area '{0}'")]
    UnknownStartingArea(AreaId),

    /// A summon template's expiry hook does not exist
    #[error("summon '{summon}' references unknown expiry skill '{skill}'")]
    UnknownExpiryHook {
        /// Summon template key
        summon: SummonTemplateId,
        /// Missing skill key
        skill: SkillId,
    },

    /// The same key appears twice in one table
    #[error("duplicate {table} id '{id}'")]
    DuplicateId {
        /// Table name
        table: &'static str,
        /// Repeated key
        id: String,
    },

    /// No areas were supplied
    #[error("content pack declares no areas")]
    NoAreas,

    /// An area has an invalid wave count
    #[error("area '{area}' must have at least one wave")]
    NoWaves {
        /// Area key
        area: AreaId,
    },

    /// A weakness relation contains a self-loop or a mutual pair
    #[error("invalid weakness relation: {0}")]
    InvalidMatchup(String),

    /// The content source could not be parsed
    #[error("failed to parse content: {0}")]
    Parse(String),
}

/// Rejected host commands. None of these mutate state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// Grid coordinates outside the 3×3 board
    #[error("target ({row}, {col}) is outside the grid")]
    OutOfRange {
        /// Requested row
        row: usize,
        /// Requested column
        col: usize,
    },

    /// Targeted cell holds no living enemy
    #[error("no enemy at ({row}, {col})")]
    EmptyCell {
        /// Requested row
        row: usize,
        /// Requested column
        col: usize,
    },

    /// Unit is not on the roster
    #[error("unit {0} is not on the roster")]
    UnknownUnit(UnitId),

    /// Unit does not own the skill
    #[error("unit {unit} has no skill '{skill}'")]
    SkillNotOwned {
        /// Unit key
        unit: UnitId,
        /// Skill key
        skill: SkillId,
    },

    /// Skill is still cooling down
    #[error("skill '{skill}' on cooldown: {remaining_ms}ms remaining")]
    SkillOnCooldown {
        /// Skill key
        skill: SkillId,
        /// Time remaining in milliseconds
        remaining_ms: f64,
    },

    /// Skill is switched off on this unit
    #[error("skill '{0}' is inactive")]
    SkillInactive(SkillId),

    /// Skill kind cannot be cast by hand
    #[error("skill '{0}' cannot be cast directly")]
    NotCastable(SkillId),

    /// Spell key not in the registry
    #[error("unknown spell '{0}'")]
    UnknownSpell(SpellId),

    /// Hand slot index is empty
    #[error("hand slot {0} is empty")]
    EmptyHandSlot(usize),

    /// No spells are unlocked at the current tier
    #[error("no spells unlocked")]
    NoSpellsUnlocked,

    /// Nothing alive on the grid to act on
    #[error("no active enemies")]
    NoActiveEnemies,

    /// Unknown area key
    #[error("unknown area '{0}'")]
    UnknownArea(AreaId),

    /// Not enough currency to pay
    #[error("insufficient {currency}: need {needed}, have {have}")]
    InsufficientFunds {
        /// Currency name
        currency: &'static str,
        /// Amount needed
        needed: u64,
        /// Amount available
        have: u64,
    },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// File contents could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Result type alias for Resonance operations.
pub type ResonanceResult<T> = Result<T, ResonanceError>;

/// Result type for host commands.
pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_error_message() {
        let err = ContentError::UnknownSkill {
            owner: "unit fighter".into(),
            skill: SkillId::new("pummel"),
        };
        assert_eq!(err.to_string(), "unit fighter references unknown skill 'pummel'");
    }

    #[test]
    fn test_command_error_converts() {
        let err: ResonanceError = CommandError::NoActiveEnemies.into();
        assert!(matches!(err, ResonanceError::Command(CommandError::NoActiveEnemies)));
    }
}
