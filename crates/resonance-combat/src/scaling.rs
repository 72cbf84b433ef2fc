//! Enemy hit point and attack scaling by wave.
//!
//! ```text
//! hp = base_hp * growth^(w-1) * zone_multiplier^floor((w-1)/zone_length)
//!      * (1 + (w-1)/quantum_span)^(quantum_exponent + type_adjustment)
//! hp *= boss_hp_multiplier  if boss
//! hp *= spike_factor        if w is a spike wave
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scaling constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    /// Wave 1 hit points.
    pub base_hp: f64,
    /// Per-wave exponential growth.
    pub growth: f64,
    /// Multiplier applied once per completed zone.
    pub zone_multiplier: f64,
    /// Waves per zone.
    pub zone_length: u32,
    /// Span of the polynomial term.
    pub quantum_span: f64,
    /// Exponent of the polynomial term before type adjustment.
    pub quantum_exponent: f64,
    /// Boss hit point multiplier.
    pub boss_hp_multiplier: f64,
    /// Boss attack multiplier.
    pub boss_attack_multiplier: f64,
    /// Waves with a hit point spike.
    pub spike_waves: Vec<u32>,
    /// Spike multiplier.
    pub spike_factor: f64,
    /// Exponent shift per enemy category; unknown categories use 0.
    pub type_adjustments: BTreeMap<String, f64>,
    /// Attack used when a template declares none.
    pub default_base_attack: f64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        let type_adjustments = [
            ("pest", -0.2),
            ("humanoid", 0.0),
            ("beast", 0.1),
            ("undead", 0.2),
            ("dragon", 0.5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            base_hp: 1000.0,
            growth: 1.035,
            zone_multiplier: 1.5,
            zone_length: 10,
            quantum_span: 25.0,
            quantum_exponent: 2.0,
            boss_hp_multiplier: 12.0,
            boss_attack_multiplier: 2.0,
            spike_waves: vec![50, 100, 200],
            spike_factor: 3.0,
            type_adjustments,
            default_base_attack: 5.0,
        }
    }
}

impl ScalingConfig {
    /// Clamps ranges so every formula stays finite and non-decreasing.
    pub fn validate(&mut self) {
        self.base_hp = self.base_hp.max(1.0);
        self.growth = self.growth.max(1.0);
        self.zone_multiplier = self.zone_multiplier.max(1.0);
        self.zone_length = self.zone_length.max(1);
        self.quantum_span = self.quantum_span.max(1.0);
        self.boss_hp_multiplier = self.boss_hp_multiplier.max(1.0);
        self.boss_attack_multiplier = self.boss_attack_multiplier.max(1.0);
        self.spike_factor = self.spike_factor.max(1.0);
        self.default_base_attack = self.default_base_attack.max(0.0);
    }
}

/// Pure scaling functions over a [`ScalingConfig`].
#[derive(Debug, Clone, Default)]
pub struct EnemyScaling {
    config: ScalingConfig,
}

impl EnemyScaling {
    /// Creates a scaler.
    #[must_use]
    pub fn new(config: ScalingConfig) -> Self {
        Self { config }
    }

    /// The constants in use.
    #[must_use]
    pub fn config(&self) -> &ScalingConfig {
        &self.config
    }

    /// Exponent shift for a category.
    #[must_use]
    pub fn type_adjustment(&self, category: &str) -> f64 {
        self.config
            .type_adjustments
            .get(category)
            .copied()
            .unwrap_or(0.0)
    }

    /// Whether a wave carries the hit point spike.
    #[must_use]
    pub fn is_spike_wave(&self, wave: u32) -> bool {
        self.config.spike_waves.contains(&wave)
    }

    /// Exponential and zone growth shared by hit points and attack.
    fn growth_factor(&self, wave: u32) -> f64 {
        let steps = wave.max(1) - 1;
        let zones = steps / self.config.zone_length.max(1);
        self.config.growth.powi(steps as i32) * self.config.zone_multiplier.powi(zones as i32)
    }

    /// Hit points before flooring and before the spike.
    #[must_use]
    pub fn raw_hit_points(&self, wave: u32, category: &str, is_boss: bool) -> f64 {
        let steps = f64::from(wave.max(1) - 1);
        let exponent = self.config.quantum_exponent + self.type_adjustment(category);
        let quantum = (1.0 + steps / self.config.quantum_span).powf(exponent);

        let mut hp = self.config.base_hp * self.growth_factor(wave) * quantum;
        if is_boss {
            hp *= self.config.boss_hp_multiplier;
        }
        hp
    }

    /// Hit points ignoring the spike, floored.
    #[must_use]
    pub fn hit_points_unspiked(&self, wave: u32, category: &str, is_boss: bool) -> f64 {
        self.raw_hit_points(wave, category, is_boss).floor()
    }

    /// Hit points of an enemy spawned on `wave`.
    #[must_use]
    pub fn hit_points(&self, wave: u32, category: &str, is_boss: bool) -> f64 {
        let mut hp = self.raw_hit_points(wave, category, is_boss);
        if self.is_spike_wave(wave) {
            hp *= self.config.spike_factor;
        }
        hp.floor()
    }

    /// Attack power of an enemy spawned on `wave`.
    ///
    /// No polynomial term and no spike.
    #[must_use]
    pub fn attack_power(&self, base_attack: Option<f64>, wave: u32, is_boss: bool) -> f64 {
        let base = base_attack.unwrap_or(self.config.default_base_attack);
        let boss = if is_boss {
            self.config.boss_attack_multiplier
        } else {
            1.0
        };
        (base * self.growth_factor(wave) * boss).floor()
    }
}
