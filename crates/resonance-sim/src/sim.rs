//! Headless run driver.
//!
//! Feeds host frames through the fixed-step clock, lets the autoplayer act
//! after every combat step, and folds the notification stream into run stats.

use crate::abilities;
use crate::autoplay::Autoplayer;
use crate::config::SimConfig;
use crate::timing::FixedStep;
use anyhow::{Context, Result};
use resonance_combat::{CombatEvent, CombatLoop, ContentRegistry, Currency, HitKind};
use serde::Serialize;
use std::fs;
use tracing::{debug, info};

/// Content used when no pack is configured.
pub const DEMO_CONTENT: &str = include_str!("../content/demo.ron");

/// Loads and validates the configured content pack against the built-in
/// abilities.
pub fn load_content(config: &SimConfig) -> Result<ContentRegistry> {
    let source = match &config.content_path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read content pack {}", path.display()))?,
        None => DEMO_CONTENT.to_string(),
    };
    let content = ContentRegistry::from_ron(&source, abilities::skills()?, abilities::spells()?)
        .context("content pack failed validation")?;
    Ok(content)
}

/// Builds an unstarted fight from the configuration.
pub fn build_combat(config: &SimConfig) -> Result<CombatLoop> {
    let content = load_content(config)?;
    Ok(CombatLoop::new(content, config.combat.clone()))
}

/// Totals gathered from the notification stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    /// Simulated seconds
    pub elapsed: f64,
    /// Combat steps taken
    pub steps: u64,
    /// Damage dealt on every channel
    pub damage_dealt: f64,
    /// Damage dealt by damage-over-time
    pub dot_damage: f64,
    /// Critical hits landed
    pub critical_hits: u64,
    /// Enemies defeated
    pub enemies_defeated: u64,
    /// Waves cleared
    pub waves_cleared: u64,
    /// Waves lost to the timer
    pub waves_timed_out: u64,
    /// Areas completed
    pub areas_completed: u64,
    /// Highest global wave reached
    pub highest_wave: u32,
    /// Summons created
    pub summons_created: u64,
    /// Stacks added to existing summons
    pub summon_stacks: u64,
    /// Summons expired
    pub summons_expired: u64,
    /// Cooldown skills fired
    pub skills_fired: u64,
    /// Spell hands bought
    pub hands_drawn: u64,
    /// Spells cast
    pub spells_cast: u64,
    /// Gold at the end
    pub gold: f64,
    /// Gems at the end
    pub gems: f64,
}

impl RunStats {
    /// Folds one notification into the totals.
    pub fn record(&mut self, event: &CombatEvent) {
        match event {
            CombatEvent::WaveStarted { wave, .. } => {
                self.highest_wave = self.highest_wave.max(*wave);
            },
            CombatEvent::EnemyDamaged {
                damage,
                kind,
                is_critical,
                ..
            } => {
                self.damage_dealt += damage;
                if *kind == HitKind::Dot {
                    self.dot_damage += damage;
                }
                if *is_critical {
                    self.critical_hits += 1;
                }
            },
            CombatEvent::EnemyDefeated { .. } => self.enemies_defeated += 1,
            CombatEvent::WaveCleared { .. } => self.waves_cleared += 1,
            CombatEvent::WaveTimedOut { .. } => self.waves_timed_out += 1,
            CombatEvent::AreaCompleted { .. } => self.areas_completed += 1,
            CombatEvent::SummonCreated { .. } => self.summons_created += 1,
            CombatEvent::SummonStacked { .. } => self.summon_stacks += 1,
            CombatEvent::SummonExpired { .. } => self.summons_expired += 1,
            CombatEvent::SkillReady { .. } => self.skills_fired += 1,
            CombatEvent::HandDrawn { .. } => self.hands_drawn += 1,
            CombatEvent::SpellCast { .. } => self.spells_cast += 1,
            CombatEvent::HealTriggered { .. }
            | CombatEvent::TargetChanged { .. }
            | CombatEvent::AutoAttackStarted
            | CombatEvent::AutoAttackStopped
            | CombatEvent::CurrencyChanged { .. } => {},
        }
    }
}

/// A configured run.
#[derive(Debug)]
pub struct Simulation {
    combat: CombatLoop,
    clock: FixedStep,
    autoplay: Autoplayer,
    stats: RunStats,
    frame_dt: f64,
    frames: u64,
    report_interval: f64,
    next_report: f64,
}

impl Simulation {
    /// Loads content and prepares a started fight.
    pub fn new(config: &SimConfig) -> Result<Self> {
        let mut config = config.clone();
        config.validate();

        let mut combat = build_combat(&config)?;
        combat.start();

        Ok(Self {
            combat,
            clock: FixedStep::new(config.fixed_dt, config.max_steps_per_frame),
            autoplay: Autoplayer::new(config.autoplay.clone()),
            stats: RunStats::default(),
            frame_dt: config.frame_dt,
            frames: config.frame_count(),
            report_interval: config.report_interval,
            next_report: config.report_interval,
        })
    }

    /// Runs every configured frame and returns the totals.
    pub fn run(&mut self) -> &RunStats {
        info!(
            frames = self.frames,
            fixed_dt = self.clock.fixed_dt(),
            "Simulation starting"
        );
        for _ in 0..self.frames {
            self.frame(self.frame_dt);
        }
        if self.clock.dropped() > 0.0 {
            info!(dropped = self.clock.dropped(), "Frame time dropped");
        }
        &self.stats
    }

    /// Processes one host frame of `dt` seconds.
    pub fn frame(&mut self, dt: f64) {
        let fixed_dt = self.clock.fixed_dt();
        for _ in 0..self.clock.accumulate(dt) {
            self.combat.advance(fixed_dt);
            self.collect_events();
            self.autoplay.act(&mut self.combat, fixed_dt);
            self.collect_events();
        }

        self.stats.elapsed = self.clock.elapsed();
        self.stats.steps = self.clock.steps();
        self.stats.gold = self.combat.balance(Currency::Gold);
        self.stats.gems = self.combat.balance(Currency::Gems);

        if self.report_interval > 0.0 && self.stats.elapsed >= self.next_report {
            self.next_report += self.report_interval;
            self.report();
        }
    }

    fn collect_events(&mut self) {
        for event in self.combat.drain_events() {
            debug!(?event, "Combat event");
            self.stats.record(&event);
        }
    }

    fn report(&self) {
        let waves = self.combat.waves();
        info!(
            elapsed = self.stats.elapsed,
            area = %waves.current_area(),
            wave = waves.current_wave(),
            area_wave = waves.area_wave(),
            gold = self.stats.gold.floor(),
            gems = self.stats.gems.floor(),
            defeated = self.stats.enemies_defeated,
            summons = self.combat.summons().len(),
            "Progress"
        );
    }

    /// The fight being driven.
    #[must_use]
    pub fn combat(&self) -> &CombatLoop {
        &self.combat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn short_run(seconds: f64) -> SimConfig {
        SimConfig {
            duration: seconds,
            report_interval: 0.0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_demo_run_makes_progress() {
        let mut sim = Simulation::new(&short_run(120.0)).expect("demo content");
        let stats = sim.run().clone();

        assert_eq!(stats.steps, 1920);
        assert!((stats.elapsed - 120.0).abs() < 1e-9);
        assert!(stats.damage_dealt > 0.0);
        assert!(stats.enemies_defeated > 0);
        assert!(stats.gold > 0.0);
        assert!(stats.highest_wave >= 1);
    }

    #[test]
    fn test_same_seed_same_run() {
        let first = Simulation::new(&short_run(60.0))
            .expect("demo content")
            .run()
            .clone();
        let second = Simulation::new(&short_run(60.0))
            .expect("demo content")
            .run()
            .clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_record_counts_events() {
        let mut stats = RunStats::default();
        stats.record(&CombatEvent::WaveTimedOut {
            wave: 3,
            area_wave: 3,
        });
        stats.record(&CombatEvent::AutoAttackStopped);
        assert_eq!(stats.waves_timed_out, 1);
        assert_eq!(stats.waves_cleared, 0);
    }

    #[test]
    fn test_missing_content_file_fails() {
        let config = SimConfig {
            content_path: Some(PathBuf::from("/nonexistent/pack.ron")),
            ..SimConfig::default()
        };
        assert!(build_combat(&config).is_err());
    }

    #[test]
    fn test_invalid_content_file_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("pack.ron");
        fs::write(&path, "(areas: [])").expect("write");

        let config = SimConfig {
            content_path: Some(path),
            ..SimConfig::default()
        };
        assert!(build_combat(&config).is_err());
    }
}
