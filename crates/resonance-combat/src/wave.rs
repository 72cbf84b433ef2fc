//! Wave and area progression.
//!
//! ```text
//!            spawn                      grid empty
//!   Idle ──────────► Active ───────────────────────► Cleared ──(delay)──► Active
//!                      │                                │ final wave
//!                      │ timer hits zero                ▼
//!                      └──────────► TimedOut      AreaComplete ──(delay)──► Active
//!                                      │
//!                                      └──(delay)──► Active (area wave 1)
//! ```

use crate::config::CombatConfig;
use crate::content::{AreaDefinition, ContentRegistry};
use crate::economy::IncomeConfig;
use crate::enemy::Enemy;
use crate::grid::{BattleGrid, GridPos, GRID_SIZE};
use crate::scaling::EnemyScaling;
use crate::status::{DotHit, DotTarget};
use crate::timer::{TimerConfig, WaveTimer};
use resonance_common::{AreaId, CommandError, EnemyTemplateId, EnemyUid};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Delays between waves and wave composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Seconds after a clear before the next wave.
    pub clear_delay: f64,
    /// Seconds after a timeout before the retry.
    pub timeout_delay: f64,
    /// Seconds after an area completes before the next area starts.
    pub area_complete_delay: f64,
    /// Enemies in a normal wave.
    pub wave_size: usize,
    /// Most minions fielded next to a boss.
    pub boss_minions: usize,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            clear_delay: 2.0,
            timeout_delay: 1.5,
            area_complete_delay: 3.0,
            wave_size: 9,
            boss_minions: 3,
        }
    }
}

impl PacingConfig {
    /// Clamps ranges.
    pub fn validate(&mut self) {
        self.clear_delay = self.clear_delay.max(0.0);
        self.timeout_delay = self.timeout_delay.max(0.0);
        self.area_complete_delay = self.area_complete_delay.max(0.0);
        self.wave_size = self.wave_size.min(GRID_SIZE * GRID_SIZE);
        self.boss_minions = self.boss_minions.min(GRID_SIZE * GRID_SIZE - 1);
    }
}

/// Where the director is in the wave cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    /// Not started.
    Idle,
    /// Enemies on the field and the timer running.
    Active,
    /// Waiting to spawn the next wave after a clear.
    Cleared,
    /// Waiting to retry after a timeout.
    TimedOut,
    /// Waiting to start the next area.
    AreaComplete,
}

/// A state change reported by [`WaveDirector::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum WaveTransition {
    /// A wave spawned.
    Started {
        /// Area
        area: AreaId,
        /// Global wave
        wave: u32,
        /// Wave within the area
        area_wave: u32,
        /// Enemies placed
        enemies: usize,
        /// Timer length
        max_time: f64,
    },
    /// The grid emptied in time.
    Cleared {
        /// Global wave
        wave: u32,
        /// Wave within the area
        area_wave: u32,
        /// Gold bonus
        bonus: u64,
    },
    /// The timer ran out.
    TimedOut {
        /// Global wave
        wave: u32,
        /// Wave within the area that failed
        area_wave: u32,
    },
    /// The final wave of an area was cleared.
    AreaCompleted {
        /// Completed area
        area: AreaId,
        /// Area played next
        next: AreaId,
    },
}

/// Result of damaging one enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageApplied {
    /// Enemy hit.
    pub enemy: EnemyUid,
    /// Its cell.
    pub pos: GridPos,
    /// Damage subtracted.
    pub damage: f64,
    /// Health left (0 when defeated).
    pub remaining: f64,
    /// Whether the hit defeated it.
    pub defeated: bool,
}

/// An enemy taken off the grid by damage.
#[derive(Debug, Clone, PartialEq)]
pub struct DefeatedEnemy {
    /// The enemy as it was when it fell.
    pub enemy: Enemy,
    /// The cell it held.
    pub pos: GridPos,
}

/// Owner of the grid, the wave timer, and area progression.
#[derive(Debug, Clone)]
pub struct WaveDirector {
    content: Arc<ContentRegistry>,
    pacing: PacingConfig,
    timer_config: TimerConfig,
    income: IncomeConfig,
    scaling: EnemyScaling,

    // === Field ===
    grid: BattleGrid,
    timer: WaveTimer,
    target: Option<GridPos>,
    defeated: Vec<DefeatedEnemy>,
    next_uid: u64,

    // === Progression ===
    phase: WavePhase,
    delay: f64,
    current_area: AreaId,
    current_wave: u32,
    area_wave: u32,
}

impl WaveDirector {
    /// Creates an idle director positioned at the starting area.
    #[must_use]
    pub fn new(content: Arc<ContentRegistry>, config: &CombatConfig) -> Self {
        let current_area = content.starting_area().clone();
        Self {
            content,
            pacing: config.pacing.clone(),
            timer_config: config.timer.clone(),
            income: config.income.clone(),
            scaling: EnemyScaling::new(config.scaling.clone()),
            grid: BattleGrid::new(),
            timer: WaveTimer::new(config.timer.shield_cap),
            target: None,
            defeated: Vec::new(),
            next_uid: 0,
            phase: WavePhase::Idle,
            delay: 0.0,
            current_area,
            current_wave: 1,
            area_wave: 1,
        }
    }

    // === Queries ===

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Whether a wave is being fought.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == WavePhase::Active
    }

    /// Area being played.
    #[must_use]
    pub fn current_area(&self) -> &AreaId {
        &self.current_area
    }

    /// Global wave number, also the level of spawned enemies.
    #[must_use]
    pub fn current_wave(&self) -> u32 {
        self.current_wave
    }

    /// Wave within the current area, 1-based.
    #[must_use]
    pub fn area_wave(&self) -> u32 {
        self.area_wave
    }

    /// The battle grid.
    #[must_use]
    pub fn grid(&self) -> &BattleGrid {
        &self.grid
    }

    /// The wave timer.
    #[must_use]
    pub fn timer(&self) -> &WaveTimer {
        &self.timer
    }

    /// Focused cell.
    #[must_use]
    pub fn target(&self) -> Option<GridPos> {
        self.target
    }

    /// Enemy on the focused cell.
    #[must_use]
    pub fn target_enemy(&self) -> Option<&Enemy> {
        self.target.and_then(|pos| self.grid.get(pos))
    }

    /// Enemy by uid.
    #[must_use]
    pub fn enemy(&self, uid: EnemyUid) -> Option<&Enemy> {
        self.grid.enemy(uid)
    }

    /// Uids of every enemy on the field, row-major.
    #[must_use]
    pub fn enemy_uids(&self) -> Vec<EnemyUid> {
        self.grid.iter().map(|(_, e)| e.uid).collect()
    }

    /// Cell of an enemy on the field or defeated this tick.
    #[must_use]
    pub fn last_position(&self, uid: EnemyUid) -> Option<GridPos> {
        self.grid.find(uid).or_else(|| {
            self.defeated
                .iter()
                .find(|d| d.enemy.uid == uid)
                .map(|d| d.pos)
        })
    }

    fn area(&self) -> Option<&AreaDefinition> {
        self.content.area(&self.current_area)
    }

    // === Lifecycle ===

    /// Starts the run at wave 1 of the starting area.
    pub fn start(&mut self, party_health: f64, rng: &mut fastrand::Rng) -> Option<WaveTransition> {
        self.current_area = self.content.starting_area().clone();
        self.current_wave = 1;
        self.area_wave = 1;
        self.spawn_wave(party_health, rng)
    }

    /// Restarts at wave 1 of another area, spawning immediately.
    pub fn select_area(
        &mut self,
        area: &AreaId,
        party_health: f64,
        rng: &mut fastrand::Rng,
    ) -> Result<Option<WaveTransition>, CommandError> {
        if self.content.area(area).is_none() {
            return Err(CommandError::UnknownArea(area.clone()));
        }
        info!(%area, "Area selected");
        self.current_area = area.clone();
        self.area_wave = 1;
        Ok(self.spawn_wave(party_health, rng))
    }

    fn make_enemy(&mut self, template: &EnemyTemplateId, is_boss: bool) -> Option<Enemy> {
        let Some(def) = self.content.enemy(template) else {
            warn!(%template, "Unknown enemy template at spawn");
            return None;
        };
        self.next_uid += 1;
        let health = self.scaling.hit_points(self.current_wave, &def.category, is_boss);
        Some(Enemy {
            template: def.id.clone(),
            uid: EnemyUid::new(self.next_uid),
            name: def.name.clone(),
            level: self.current_wave,
            health,
            max_health: health,
            attack_power: self
                .scaling
                .attack_power(def.base_attack, self.current_wave, is_boss),
            category: def.category.clone(),
            element: def.element,
            is_boss,
            visual: None,
        })
    }

    /// Clears the field and spawns the current wave.
    ///
    /// The final wave of an area with a boss puts the boss in the center and
    /// up to `boss_minions` minions around it. Every other wave fills
    /// `wave_size` random cells from the area pool.
    pub fn spawn_wave(
        &mut self,
        party_health: f64,
        rng: &mut fastrand::Rng,
    ) -> Option<WaveTransition> {
        self.grid.clear();
        self.defeated.clear();
        self.target = None;

        let Some(area) = self.area().cloned() else {
            warn!(area = %self.current_area, "Cannot spawn: unknown area");
            self.phase = WavePhase::Idle;
            return None;
        };
        self.area_wave = self.area_wave.clamp(1, area.max_waves);
        let pool = &area.enemies;

        let boss = area.boss.as_ref().filter(|_| self.area_wave >= area.max_waves);
        let placements: Vec<(GridPos, EnemyTemplateId, bool)> = if let Some(boss) = boss {
            let mut cells: Vec<GridPos> =
                GridPos::all().filter(|&p| p != GridPos::CENTER).collect();
            rng.shuffle(&mut cells);
            let minions = if pool.is_empty() {
                0
            } else {
                self.pacing.boss_minions.min(pool.len())
            };
            std::iter::once((GridPos::CENTER, boss.clone(), true))
                .chain(
                    cells
                        .into_iter()
                        .take(minions)
                        .map(|pos| (pos, pool[rng.usize(..pool.len())].clone(), false)),
                )
                .collect()
        } else {
            let mut cells: Vec<GridPos> = GridPos::all().collect();
            rng.shuffle(&mut cells);
            let count = if pool.is_empty() { 0 } else { self.pacing.wave_size };
            cells
                .into_iter()
                .take(count)
                .map(|pos| (pos, pool[rng.usize(..pool.len())].clone(), false))
                .collect()
        };

        for (pos, template, is_boss) in placements {
            if let Some(enemy) = self.make_enemy(&template, is_boss) {
                if self.grid.place(pos, enemy).is_err() {
                    warn!(?pos, "Spawn cell already taken");
                }
            }
        }

        let max_time = self.timer_config.max_time_for(party_health);
        self.timer.start(max_time);
        self.target = self.grid.front_most();
        self.phase = WavePhase::Active;
        self.delay = 0.0;

        let enemies = self.grid.occupied();
        info!(
            area = %self.current_area,
            wave = self.current_wave,
            area_wave = self.area_wave,
            enemies,
            max_time,
            "Wave started"
        );
        Some(WaveTransition::Started {
            area: self.current_area.clone(),
            wave: self.current_wave,
            area_wave: self.area_wave,
            enemies,
            max_time,
        })
    }

    /// Advances the timer and the progression state machine by `dt` seconds.
    pub fn advance(
        &mut self,
        dt: f64,
        party_health: f64,
        rng: &mut fastrand::Rng,
    ) -> Vec<WaveTransition> {
        let mut transitions = Vec::new();
        match self.phase {
            WavePhase::Idle => {},
            WavePhase::Active => {
                if self.grid.is_empty() {
                    self.on_cleared(&mut transitions);
                } else if self.timer.advance(dt) {
                    self.on_timed_out(&mut transitions);
                }
            },
            WavePhase::Cleared | WavePhase::TimedOut | WavePhase::AreaComplete => {
                self.delay -= dt;
                if self.delay <= 0.0 {
                    transitions.extend(self.spawn_wave(party_health, rng));
                }
            },
        }
        transitions
    }

    fn on_cleared(&mut self, transitions: &mut Vec<WaveTransition>) {
        let multiplier = self.timer.bonus_multiplier(self.income.clear_time_weight);
        let bonus = self.income.clear_bonus(multiplier, self.area_wave);
        self.timer.stop();
        self.target = None;

        info!(wave = self.current_wave, area_wave = self.area_wave, bonus, "Wave cleared");
        transitions.push(WaveTransition::Cleared {
            wave: self.current_wave,
            area_wave: self.area_wave,
            bonus,
        });

        let max_waves = self.area().map_or(1, |a| a.max_waves);
        if self.area_wave >= max_waves {
            let next = self.content.successor(&self.current_area);
            info!(area = %self.current_area, %next, "Area complete");
            transitions.push(WaveTransition::AreaCompleted {
                area: self.current_area.clone(),
                next: next.clone(),
            });
            self.current_area = next;
            self.area_wave = 1;
            self.phase = WavePhase::AreaComplete;
            self.delay = self.pacing.area_complete_delay;
        } else {
            self.current_wave = self.current_wave.saturating_add(1);
            self.area_wave += 1;
            self.phase = WavePhase::Cleared;
            self.delay = self.pacing.clear_delay;
        }
    }

    fn on_timed_out(&mut self, transitions: &mut Vec<WaveTransition>) {
        info!(wave = self.current_wave, area_wave = self.area_wave, "Wave timed out");
        transitions.push(WaveTransition::TimedOut {
            wave: self.current_wave,
            area_wave: self.area_wave,
        });
        self.grid.clear();
        self.target = None;
        self.area_wave = 1;
        self.phase = WavePhase::TimedOut;
        self.delay = self.pacing.timeout_delay;
    }

    // === Field operations ===

    /// Subtracts damage from an enemy, taking it off the grid when it falls.
    ///
    /// Non-finite or negative damage counts as zero.
    pub fn damage_enemy(&mut self, uid: EnemyUid, damage: f64) -> Option<DamageApplied> {
        let damage = if damage.is_finite() { damage.max(0.0) } else { 0.0 };
        let pos = self.grid.find(uid)?;
        let enemy = self.grid.get_mut(pos)?;
        enemy.health = (enemy.health - damage).max(0.0);
        let remaining = enemy.health;
        let defeated = remaining <= 0.0;

        if defeated {
            if let Some(enemy) = self.grid.take(pos) {
                debug!(%uid, ?pos, "Enemy defeated");
                self.defeated.push(DefeatedEnemy { enemy, pos });
            }
            if self.target == Some(pos) {
                self.target = self.grid.front_most();
            }
        }

        Some(DamageApplied {
            enemy: uid,
            pos,
            damage,
            remaining,
            defeated,
        })
    }

    /// Enemies defeated since the last call, in defeat order.
    pub fn take_defeated(&mut self) -> Vec<DefeatedEnemy> {
        std::mem::take(&mut self.defeated)
    }

    /// Focuses an occupied cell.
    pub fn set_target(&mut self, row: usize, col: usize) -> Result<GridPos, CommandError> {
        let pos = GridPos::checked(row, col)?;
        if self.grid.get(pos).is_none() {
            return Err(CommandError::EmptyCell { row, col });
        }
        self.target = Some(pos);
        Ok(pos)
    }

    /// Keeps the focus on an occupied cell, moving it front-most if needed.
    pub fn resolve_target(&mut self) -> Option<GridPos> {
        let valid = self.target.is_some_and(|pos| self.grid.get(pos).is_some());
        if !valid {
            self.target = self.grid.front_most();
        }
        self.target
    }

    /// Banks shield time. Returns the amount added.
    pub fn add_time_shield(&mut self, seconds: f64) -> f64 {
        self.timer.add_shield(seconds)
    }

    /// Extends the running wave. Returns the amount added.
    pub fn add_wave_time(&mut self, seconds: f64) -> f64 {
        self.timer.add_time(seconds)
    }

    /// Freezes the wave timer.
    pub fn pause(&mut self) {
        self.timer.pause();
    }

    /// Unfreezes the wave timer.
    pub fn resume(&mut self) {
        self.timer.resume();
    }

    /// Counts visual effects down.
    pub fn tick_visuals(&mut self, dt: f64) {
        for enemy in self.grid.iter_mut() {
            enemy.tick_visual(dt);
        }
    }

    /// Mutable enemy by uid, for presentation hints.
    pub fn enemy_mut(&mut self, uid: EnemyUid) -> Option<&mut Enemy> {
        self.grid.enemy_mut(uid)
    }

    #[cfg(test)]
    pub(crate) fn jump_to(&mut self, area_wave: u32) {
        self.area_wave = area_wave;
        self.current_wave = area_wave;
    }

    #[cfg(test)]
    pub(crate) fn timer_mut(&mut self) -> &mut WaveTimer {
        &mut self.timer
    }
}

impl DotTarget for WaveDirector {
    fn apply_dot_damage(&mut self, enemy: EnemyUid, damage: f64) -> DotHit {
        match self.damage_enemy(enemy, damage) {
            Some(applied) if applied.defeated => DotHit::Defeated,
            Some(_) => DotHit::Survived,
            None => DotHit::Missing,
        }
    }

    fn is_present(&self, enemy: EnemyUid) -> bool {
        self.grid.find(enemy).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures;
    use crate::skills::SkillRegistry;
    use crate::spells::SpellRegistry;
    use ahash::AHashSet;

    const PARTY_HEALTH: f64 = 100.0;

    fn director_with(pack: crate::content::ContentPack) -> (WaveDirector, fastrand::Rng) {
        let content = ContentRegistry::new(pack, SkillRegistry::new(), SpellRegistry::new())
            .expect("valid content");
        (
            WaveDirector::new(Arc::new(content), &CombatConfig::default()),
            fastrand::Rng::with_seed(42),
        )
    }

    fn director() -> (WaveDirector, fastrand::Rng) {
        director_with(fixtures::pack())
    }

    fn kill_all(director: &mut WaveDirector) {
        for uid in director.enemy_uids() {
            let _ = director.damage_enemy(uid, f64::MAX);
        }
    }

    #[test]
    fn test_normal_wave_fills_grid() {
        let (mut director, mut rng) = director();
        let started = director.start(PARTY_HEALTH, &mut rng);
        assert!(matches!(
            started,
            Some(WaveTransition::Started { enemies: 9, wave: 1, area_wave: 1, .. })
        ));

        let uids: AHashSet<_> = director.enemy_uids().into_iter().collect();
        assert_eq!(uids.len(), 9);
        for (_, enemy) in director.grid().iter() {
            assert!(!enemy.is_boss);
            assert!((enemy.health - 1000.0).abs() < f64::EPSILON);
            assert_eq!(enemy.level, 1);
        }
        assert_eq!(director.target(), GridPos::new(2, 0));
        assert!((director.timer().max_time() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_boss_wave_layout() {
        let (mut director, mut rng) = director();
        director.jump_to(10);
        director.spawn_wave(PARTY_HEALTH, &mut rng);

        let boss = director.grid().get(GridPos::CENTER).expect("boss in center");
        assert!(boss.is_boss);
        assert_eq!(boss.template, EnemyTemplateId::new("ogre"));
        // Pool has two templates, so two minions.
        assert_eq!(director.grid().occupied(), 3);
        assert_eq!(director.grid().iter().filter(|(_, e)| e.is_boss).count(), 1);
    }

    #[test]
    fn test_clear_bonus_and_advance() {
        let (mut director, mut rng) = director();
        director.jump_to(3);
        director.spawn_wave(PARTY_HEALTH, &mut rng);
        director.timer_mut().set_remaining(10.0);
        kill_all(&mut director);

        let transitions = director.advance(0.0, PARTY_HEALTH, &mut rng);
        // floor(50 * (1 + 10/40 * 0.5) * 3) = floor(168.75)
        assert_eq!(
            transitions,
            vec![WaveTransition::Cleared {
                wave: 3,
                area_wave: 3,
                bonus: 168
            }]
        );
        assert_eq!(director.phase(), WavePhase::Cleared);
        assert_eq!((director.current_wave(), director.area_wave()), (4, 4));

        assert!(director.advance(1.0, PARTY_HEALTH, &mut rng).is_empty());
        let next = director.advance(1.0, PARTY_HEALTH, &mut rng);
        assert!(matches!(next[..], [WaveTransition::Started { wave: 4, area_wave: 4, .. }]));
    }

    #[test]
    fn test_timeout_resets_area_wave() {
        let (mut director, mut rng) = director();
        director.jump_to(7);
        director.spawn_wave(PARTY_HEALTH, &mut rng);

        let transitions = director.advance(40.0, PARTY_HEALTH, &mut rng);
        assert_eq!(
            transitions,
            vec![WaveTransition::TimedOut {
                wave: 7,
                area_wave: 7
            }]
        );
        assert!(director.grid().is_empty());
        assert_eq!(director.area_wave(), 1);
        assert_eq!(director.current_wave(), 7);

        let respawn = director.advance(1.5, PARTY_HEALTH, &mut rng);
        assert!(matches!(respawn[..], [WaveTransition::Started { area_wave: 1, wave: 7, .. }]));
        assert!(director.is_active());
    }

    #[test]
    fn test_shield_delays_timeout() {
        let (mut director, mut rng) = director();
        director.start(PARTY_HEALTH, &mut rng);
        assert!((director.add_time_shield(3.0) - 3.0).abs() < f64::EPSILON);
        assert!(director.advance(41.0, PARTY_HEALTH, &mut rng).is_empty());
        assert!(director.timer().time_shield().abs() < f64::EPSILON);
        assert!((director.timer().time_remaining() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_area_complete_wraps() {
        let (mut director, mut rng) = director();
        director.jump_to(10);
        director.spawn_wave(PARTY_HEALTH, &mut rng);
        kill_all(&mut director);

        let transitions = director.advance(0.0, PARTY_HEALTH, &mut rng);
        assert!(matches!(transitions[0], WaveTransition::Cleared { area_wave: 10, .. }));
        assert_eq!(
            transitions[1],
            WaveTransition::AreaCompleted {
                area: AreaId::new("meadow"),
                next: AreaId::new("meadow"),
            }
        );
        assert_eq!(director.phase(), WavePhase::AreaComplete);
        assert_eq!(director.area_wave(), 1);
        assert!(director.advance(3.0, PARTY_HEALTH, &mut rng).len() == 1);
    }

    #[test]
    fn test_empty_pool_clears_immediately() {
        let mut pack = fixtures::pack();
        pack.areas[0].enemies.clear();
        pack.areas[0].boss = None;
        let (mut director, mut rng) = director_with(pack);

        assert!(matches!(
            director.start(PARTY_HEALTH, &mut rng),
            Some(WaveTransition::Started { enemies: 0, .. })
        ));
        assert!(matches!(
            director.advance(0.0, PARTY_HEALTH, &mut rng)[..],
            [WaveTransition::Cleared { .. }]
        ));
    }

    #[test]
    fn test_zero_length_wave_times_out() {
        let content = ContentRegistry::new(fixtures::pack(), SkillRegistry::new(), SpellRegistry::new())
            .expect("valid content");
        let mut config = CombatConfig::default();
        config.timer.min_time = 0.0;
        config.timer.base_max_time = 0.0;
        let mut director = WaveDirector::new(Arc::new(content), &config);
        let mut rng = fastrand::Rng::with_seed(1);

        director.start(PARTY_HEALTH, &mut rng);
        assert!(matches!(
            director.advance(0.0, PARTY_HEALTH, &mut rng)[..],
            [WaveTransition::TimedOut { .. }]
        ));
    }

    #[test]
    fn test_targeting() {
        let (mut director, mut rng) = director();
        director.start(PARTY_HEALTH, &mut rng);

        assert_eq!(director.set_target(0, 0), Ok(GridPos { row: 0, col: 0 }));
        assert_eq!(
            director.set_target(3, 0),
            Err(CommandError::OutOfRange { row: 3, col: 0 })
        );

        let uid = director.target_enemy().map(|e| e.uid).expect("target");
        let applied = director.damage_enemy(uid, 5_000.0).expect("hit");
        assert!(applied.defeated);
        assert_eq!(director.target(), GridPos::new(2, 0));
        assert_eq!(
            director.set_target(0, 0),
            Err(CommandError::EmptyCell { row: 0, col: 0 })
        );
        assert_eq!(director.take_defeated().len(), 1);
        assert!(director.take_defeated().is_empty());
    }

    #[test]
    fn test_select_area() {
        let (mut director, mut rng) = director();
        director.start(PARTY_HEALTH, &mut rng);
        director.jump_to(5);

        let started = director
            .select_area(&AreaId::new("crypt"), PARTY_HEALTH, &mut rng)
            .expect("known area");
        assert!(matches!(started, Some(WaveTransition::Started { area_wave: 1, .. })));
        assert_eq!(director.current_area(), &AreaId::new("crypt"));
        assert_eq!(
            director.select_area(&AreaId::new("void"), PARTY_HEALTH, &mut rng),
            Err(CommandError::UnknownArea(AreaId::new("void")))
        );
    }
}
