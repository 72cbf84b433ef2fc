//! Simulator configuration.
//!
//! Run length, stepping, autoplay behavior, and the combat tunables, loaded
//! from and saved to a TOML file.

use resonance_combat::CombatConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "resonance.toml";

/// What the built-in player does between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoplayConfig {
    /// Master switch.
    pub enabled: bool,
    /// Buy a spell hand whenever the hand is empty and gems allow.
    pub draw_hands: bool,
    /// Cast the first affordable spell in the hand.
    pub cast_spells: bool,
    /// Seconds between utility skill casts (0 = never).
    pub utility_interval: f64,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            draw_hands: true,
            cast_spells: true,
            utility_interval: 12.0,
        }
    }
}

/// Simulator configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Run Settings ===
    /// Simulated seconds to run
    pub duration: f64,
    /// Host frame length in seconds
    pub frame_dt: f64,
    /// Fixed combat step in seconds
    pub fixed_dt: f64,
    /// Most combat steps per frame before the backlog is dropped
    pub max_steps_per_frame: u32,
    /// Seconds between progress reports (0 = none)
    pub report_interval: f64,

    // === Content Settings ===
    /// RON content pack (None = built-in demo)
    pub content_path: Option<PathBuf>,

    // === Autoplay ===
    /// Built-in player
    pub autoplay: AutoplayConfig,

    // === Combat ===
    /// Combat tunables
    pub combat: CombatConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // Run
            duration: 600.0,
            frame_dt: 0.125,
            fixed_dt: 0.0625,
            max_steps_per_frame: 10,
            report_interval: 60.0,

            // Content
            content_path: None,

            autoplay: AutoplayConfig::default(),
            combat: CombatConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str::<Self>(&contents) {
                    Ok(mut config) => {
                        config.validate();
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    fn config_path() -> PathBuf {
        if let Some(config_dir) = dirs_config_path() {
            config_dir.join("resonance").join(CONFIG_FILE)
        } else {
            PathBuf::from(CONFIG_FILE)
        }
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.duration = finite_or(self.duration, 600.0).clamp(0.0, 86_400.0);
        self.fixed_dt = finite_or(self.fixed_dt, 0.0625).clamp(0.001, 1.0);
        self.frame_dt = finite_or(self.frame_dt, 0.125).clamp(self.fixed_dt, 1.0);
        self.max_steps_per_frame = self.max_steps_per_frame.clamp(1, 100);
        self.report_interval = finite_or(self.report_interval, 0.0).max(0.0);
        self.autoplay.utility_interval = finite_or(self.autoplay.utility_interval, 0.0).max(0.0);

        self.combat.validate();
    }

    /// Number of host frames in the run.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        (self.duration / self.frame_dt).ceil() as u64
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Get platform-specific config directory.
fn dirs_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Application Support"))
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert!(config.content_path.is_none());
        assert!(config.autoplay.enabled);
        assert_eq!(config.frame_count(), 4800);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig::default();

        config.fixed_dt = 0.0;
        config.frame_dt = f64::NAN;
        config.max_steps_per_frame = 0;
        config.duration = -5.0;

        config.validate();

        assert!((config.fixed_dt - 0.001).abs() < f64::EPSILON);
        assert!((config.frame_dt - 0.125).abs() < f64::EPSILON);
        assert_eq!(config.max_steps_per_frame, 1);
        assert_eq!(config.frame_count(), 0);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");

        let mut config = SimConfig::default();
        config.duration = 120.0;
        config.content_path = Some(PathBuf::from("content/demo.ron"));
        config.autoplay.cast_spells = false;
        config.combat.seed = 42;

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = SimConfig::load_from(&config_path);
        assert!((loaded.duration - 120.0).abs() < f64::EPSILON);
        assert_eq!(loaded.content_path, Some(PathBuf::from("content/demo.ron")));
        assert!(!loaded.autoplay.cast_spells);
        assert_eq!(loaded.combat.seed, 42);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = SimConfig::load_from("/nonexistent/path/resonance.toml");
        assert!((config.duration - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_load_invalid_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "duration = \"long\"").expect("write");

        let config = SimConfig::load_from(&config_path);
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: SimConfig =
            toml::from_str("duration = 30.0\n[combat]\nseed = 7\n").expect("parse");
        assert!((config.duration - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.combat.seed, 7);
        assert!((config.fixed_dt - 0.0625).abs() < f64::EPSILON);
    }
}
