//! Combat tunables, loadable from TOML.

use crate::economy::IncomeConfig;
use crate::element::NeutralRamp;
use crate::party::SynergyConfig;
use crate::scaling::ScalingConfig;
use crate::spells::HandConfig;
use crate::status::StatusConfig;
use crate::summon::SummonConfig;
use crate::timer::TimerConfig;
use crate::wave::PacingConfig;
use resonance_common::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Basic attack cadence and crit strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    /// Interval at zero speed, in seconds.
    pub base_interval: f64,
    /// Seconds removed per point of speed.
    pub speed_factor: f64,
    /// Fastest allowed interval, in seconds.
    pub min_interval: f64,
    /// Damage multiplier of a critical hit.
    pub crit_multiplier: f64,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            base_interval: 3.5,
            speed_factor: 1.0,
            min_interval: 0.5,
            crit_multiplier: 2.0,
        }
    }
}

impl AttackConfig {
    /// Clamps ranges.
    pub fn validate(&mut self) {
        self.min_interval = self.min_interval.max(0.05);
        self.base_interval = self.base_interval.max(self.min_interval);
        self.speed_factor = self.speed_factor.max(0.0);
        self.crit_multiplier = self.crit_multiplier.max(1.0);
    }
}

/// Every tunable of the combat core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === Run ===
    /// Seed of the combat RNG.
    pub seed: u64,
    /// Flat attack added to every party hit; base of hero spells.
    pub global_attack_bonus: f64,
    /// Undrained notifications kept before new ones drop.
    pub event_capacity: usize,
    /// Attacks kept in the combat log.
    pub combat_log_capacity: usize,

    // === Sections ===
    /// Wave timer.
    pub timer: TimerConfig,
    /// Delays and wave composition.
    pub pacing: PacingConfig,
    /// Attack cadence.
    pub attack: AttackConfig,
    /// Enemy scaling.
    pub scaling: ScalingConfig,
    /// Income rates.
    pub income: IncomeConfig,
    /// Status effects.
    pub status: StatusConfig,
    /// Summons.
    pub summons: SummonConfig,
    /// Spell hand.
    pub hand: HandConfig,
    /// Elemental synergy.
    pub synergy: SynergyConfig,
    /// Neutral matchup ramp.
    pub matchup: NeutralRamp,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            global_attack_bonus: 30.0,
            event_capacity: 1024,
            combat_log_capacity: 50,
            timer: TimerConfig::default(),
            pacing: PacingConfig::default(),
            attack: AttackConfig::default(),
            scaling: ScalingConfig::default(),
            income: IncomeConfig::default(),
            status: StatusConfig::default(),
            summons: SummonConfig::default(),
            hand: HandConfig::default(),
            synergy: SynergyConfig::default(),
            matchup: NeutralRamp::default(),
        }
    }
}

impl CombatConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(src).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate();
        Ok(config)
    }

    /// Loads a TOML file, falling back to defaults when it is missing or bad.
    #[must_use]
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Combat config not found at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded combat config from {}", path.display());
                    config
                },
                Err(e) => {
                    warn!("Failed to parse combat config: {e}");
                    Self::default()
                },
            },
            Err(e) => {
                warn!("Failed to read combat config: {e}");
                Self::default()
            },
        }
    }

    /// Serializes to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Clamps every section into its valid range.
    pub fn validate(&mut self) {
        self.global_attack_bonus = self.global_attack_bonus.max(0.0);
        self.event_capacity = self.event_capacity.clamp(16, 1 << 16);

        self.timer.validate();
        self.pacing.validate();
        self.attack.validate();
        self.scaling.validate();
        self.income.validate();
        self.status.validate();
        self.summons.validate();
        self.hand.validate();
        self.synergy.validate();
        self.matchup.validate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CombatConfig::default();
        assert!((config.global_attack_bonus - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.combat_log_capacity, 50);
        assert!((config.attack.base_interval - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CombatConfig::from_toml_str(
            r"
            seed = 42

            [timer]
            shield_cap = 5.0

            [attack]
            crit_multiplier = 3.0
            ",
        )
        .expect("parse");

        assert_eq!(config.seed, 42);
        assert!((config.timer.shield_cap - 5.0).abs() < f64::EPSILON);
        assert!((config.timer.min_time - 20.0).abs() < f64::EPSILON);
        assert!((config.attack.crit_multiplier - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.scaling, ScalingConfig::default());
    }

    #[test]
    fn test_validate_clamps() {
        let config = CombatConfig::from_toml_str(
            r"
            global_attack_bonus = -10.0

            [attack]
            min_interval = 0.0
            crit_multiplier = 0.5
            ",
        )
        .expect("parse");

        assert!(config.global_attack_bonus.abs() < f64::EPSILON);
        assert!(config.attack.min_interval > 0.0);
        assert!((config.attack.crit_multiplier - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bad_toml_is_error() {
        assert!(matches!(
            CombatConfig::from_toml_str("seed = \"nope\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CombatConfig::default();
        let text = config.to_toml_string().expect("serialize");
        assert_eq!(CombatConfig::from_toml_str(&text).expect("parse"), config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = CombatConfig::load_from("/nonexistent/resonance/combat.toml");
        assert_eq!(config, CombatConfig::default());
    }
}
