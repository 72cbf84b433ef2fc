//! Depleting wave timer with an absorbing time shield.

use serde::{Deserialize, Serialize};

/// Wave timer tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Shortest wave, in seconds.
    pub min_time: f64,
    /// Longest wave before upgrades, in seconds.
    pub base_max_time: f64,
    /// Upgrade bonus added to `base_max_time`.
    pub max_time_bonus: f64,
    /// Seconds granted per point of party health.
    pub health_ratio: f64,
    /// Upper bound of the time shield, in seconds.
    pub shield_cap: f64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            min_time: 20.0,
            base_max_time: 40.0,
            max_time_bonus: 0.0,
            health_ratio: 2.0,
            shield_cap: 10.0,
        }
    }
}

impl TimerConfig {
    /// Wave length for a party with `party_health` total health.
    ///
    /// `min(max(min_time, health × ratio), base_max_time + bonus)`; NaN health
    /// counts as zero.
    #[must_use]
    pub fn max_time_for(&self, party_health: f64) -> f64 {
        let health = if party_health.is_finite() {
            party_health.max(0.0)
        } else {
            0.0
        };
        (health * self.health_ratio)
            .max(self.min_time)
            .min(self.base_max_time + self.max_time_bonus)
    }

    /// Clamps ranges.
    pub fn validate(&mut self) {
        self.min_time = self.min_time.max(0.0);
        self.base_max_time = self.base_max_time.max(0.0);
        self.max_time_bonus = self.max_time_bonus.max(0.0);
        self.health_ratio = self.health_ratio.max(0.0);
        self.shield_cap = self.shield_cap.max(0.0);
    }
}

/// The timer of the running wave.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveTimer {
    time_remaining: f64,
    max_time: f64,
    time_shield: f64,
    shield_cap: f64,
    running: bool,
    paused: bool,
}

impl WaveTimer {
    /// Creates a stopped timer.
    #[must_use]
    pub fn new(shield_cap: f64) -> Self {
        Self {
            time_remaining: 0.0,
            max_time: 0.0,
            time_shield: 0.0,
            shield_cap: shield_cap.max(0.0),
            running: false,
            paused: false,
        }
    }

    /// Starts a wave of `max_time` seconds. The shield carries over.
    pub fn start(&mut self, max_time: f64) {
        self.max_time = max_time.max(0.0);
        self.time_remaining = self.max_time;
        self.running = true;
        self.paused = false;
    }

    /// Stops the timer. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.running = false;
        self.paused = false;
    }

    /// Freezes countdown without stopping.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes a paused, running timer.
    pub fn resume(&mut self) {
        if self.running {
            self.paused = false;
        }
    }

    /// Counts down by `dt` seconds, shield first.
    ///
    /// Returns `true` on the tick the timer reaches zero.
    pub fn advance(&mut self, dt: f64) -> bool {
        if !self.running || self.paused {
            return false;
        }

        let mut elapsed = dt.max(0.0);
        if self.time_shield > 0.0 {
            let absorbed = elapsed.min(self.time_shield);
            self.time_shield -= absorbed;
            elapsed -= absorbed;
        }
        self.time_remaining -= elapsed;

        if self.time_remaining <= 0.0 {
            self.time_remaining = 0.0;
            self.running = false;
            return true;
        }
        false
    }

    /// Adds shield time up to the cap. Returns the amount actually added.
    pub fn add_shield(&mut self, seconds: f64) -> f64 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0.0;
        }
        let before = self.time_shield;
        self.time_shield = (before + seconds).min(self.shield_cap);
        self.time_shield - before
    }

    /// Adds wave time up to `max_time`. Returns the amount actually added.
    pub fn add_time(&mut self, seconds: f64) -> f64 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0.0;
        }
        let before = self.time_remaining;
        self.time_remaining = (before + seconds).min(self.max_time);
        self.time_remaining - before
    }

    /// Sets the shield cap, trimming the current shield if needed.
    pub fn set_shield_cap(&mut self, cap: f64) {
        self.shield_cap = cap.max(0.0);
        self.time_shield = self.time_shield.min(self.shield_cap);
    }

    /// Fraction of wave time left (0.0-1.0). A zero-length wave reports 0.
    #[must_use]
    pub fn fraction_remaining(&self) -> f64 {
        if self.max_time <= 0.0 {
            0.0
        } else {
            (self.time_remaining / self.max_time).clamp(0.0, 1.0)
        }
    }

    /// Clear-bonus multiplier: `1 + fraction_remaining × weight`.
    #[must_use]
    pub fn bonus_multiplier(&self, weight: f64) -> f64 {
        1.0 + self.fraction_remaining() * weight
    }

    /// Seconds left.
    #[must_use]
    pub fn time_remaining(&self) -> f64 {
        self.time_remaining
    }

    /// Length of the current wave.
    #[must_use]
    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    /// Shield seconds banked.
    #[must_use]
    pub fn time_shield(&self) -> f64 {
        self.time_shield
    }

    /// Shield cap.
    #[must_use]
    pub fn shield_cap(&self) -> f64 {
        self.shield_cap
    }

    /// Whether the timer is counting.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the timer is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[cfg(test)]
    pub(crate) fn set_remaining(&mut self, seconds: f64) {
        self.time_remaining = seconds.clamp(0.0, self.max_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_max_time_bounds() {
        let config = TimerConfig::default();
        assert!((config.max_time_for(0.0) - 20.0).abs() < EPS);
        assert!((config.max_time_for(15.0) - 30.0).abs() < EPS);
        assert!((config.max_time_for(500.0) - 40.0).abs() < EPS);
        assert!((config.max_time_for(f64::NAN) - 20.0).abs() < EPS);

        let boosted = TimerConfig {
            max_time_bonus: 10.0,
            ..TimerConfig::default()
        };
        assert!((boosted.max_time_for(500.0) - 50.0).abs() < EPS);
    }

    #[test]
    fn test_shield_absorbs_first() {
        let mut timer = WaveTimer::new(10.0);
        timer.start(40.0);
        timer.add_shield(3.0);

        assert!(!timer.advance(5.0));
        assert!(timer.time_shield().abs() < EPS);
        assert!((timer.time_remaining() - 38.0).abs() < EPS);
    }

    #[test]
    fn test_shield_capped() {
        let mut timer = WaveTimer::new(10.0);
        assert!((timer.add_shield(7.0) - 7.0).abs() < EPS);
        assert!((timer.add_shield(7.0) - 3.0).abs() < EPS);
        assert!((timer.time_shield() - 10.0).abs() < EPS);
    }

    #[test]
    fn test_add_time_capped_at_max() {
        let mut timer = WaveTimer::new(10.0);
        timer.start(30.0);
        timer.advance(10.0);
        assert!((timer.add_time(25.0) - 10.0).abs() < EPS);
        assert!((timer.time_remaining() - 30.0).abs() < EPS);
    }

    #[test]
    fn test_expiry_fires_once() {
        let mut timer = WaveTimer::new(0.0);
        timer.start(1.0);
        assert!(timer.advance(2.0));
        assert!(timer.time_remaining().abs() < EPS);
        assert!(!timer.advance(1.0));
        assert!(!timer.is_running());
    }

    #[test]
    fn test_zero_length_wave_expires_on_next_advance() {
        let mut timer = WaveTimer::new(0.0);
        timer.start(0.0);
        assert!(timer.advance(0.0));
    }

    #[test]
    fn test_pause_freezes() {
        let mut timer = WaveTimer::new(0.0);
        timer.start(10.0);
        timer.pause();
        assert!(!timer.advance(5.0));
        assert!((timer.time_remaining() - 10.0).abs() < EPS);
        timer.resume();
        timer.advance(5.0);
        assert!((timer.time_remaining() - 5.0).abs() < EPS);
    }

    #[test]
    fn test_bonus_multiplier() {
        let mut timer = WaveTimer::new(0.0);
        timer.start(40.0);
        timer.advance(30.0);
        assert!((timer.bonus_multiplier(0.5) - 1.125).abs() < EPS);
    }
}
