//! Fixed-step simulation clock.
//!
//! Host frames arrive with whatever delta they have; combat always advances in
//! equal steps so runs are reproducible.

/// Splits frame deltas into fixed combat steps.
#[derive(Debug, Clone)]
pub struct FixedStep {
    /// Length of one step in seconds
    fixed_dt: f64,
    /// Unconsumed frame time
    accumulator: f64,
    /// Step cap per frame
    max_steps: u32,
    /// Simulated seconds consumed so far
    elapsed: f64,
    /// Steps handed out so far
    steps: u64,
    /// Frame time dropped after falling behind
    dropped: f64,
}

impl FixedStep {
    /// Create a clock with the given step and per-frame cap.
    #[must_use]
    pub fn new(fixed_dt: f64, max_steps: u32) -> Self {
        Self {
            fixed_dt: fixed_dt.max(0.001), // Minimum 1ms
            accumulator: 0.0,
            max_steps: max_steps.max(1),
            elapsed: 0.0,
            steps: 0,
            dropped: 0.0,
        }
    }

    /// Get the fixed step value.
    #[must_use]
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Accumulate frame time.
    /// Returns the number of fixed steps that should be performed.
    pub fn accumulate(&mut self, dt: f64) -> u32 {
        if dt.is_finite() && dt > 0.0 {
            self.accumulator += dt;
        }
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < self.max_steps {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind after the cap: drop the backlog
        if self.accumulator > self.fixed_dt * 2.0 {
            self.dropped += self.accumulator;
            self.accumulator = 0.0;
        }

        self.steps += u64::from(count);
        self.elapsed += f64::from(count) * self.fixed_dt;
        count
    }

    /// Simulated seconds handed out as steps.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Steps handed out.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Frame time discarded because the clock fell behind.
    #[must_use]
    pub fn dropped(&self) -> f64 {
        self.dropped
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(1.0 / 16.0, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_creation() {
        let clock = FixedStep::new(0.0625, 10);
        assert!((clock.fixed_dt() - 0.0625).abs() < f64::EPSILON);
        assert_eq!(clock.steps(), 0);
    }

    #[test]
    fn test_whole_frames() {
        let mut clock = FixedStep::new(0.0625, 10);
        assert_eq!(clock.accumulate(0.125), 2);
        assert_eq!(clock.accumulate(0.125), 2);
        assert_eq!(clock.steps(), 4);
        assert!((clock.elapsed() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_frames_carry_over() {
        let mut clock = FixedStep::new(0.0625, 10);
        assert_eq!(clock.accumulate(0.03125), 0);
        assert_eq!(clock.accumulate(0.03125), 1);
    }

    #[test]
    fn test_spiral_prevention() {
        let mut clock = FixedStep::new(0.0625, 10);

        // Simulate huge lag spike
        let steps = clock.accumulate(5.0);

        assert_eq!(steps, 10);
        assert!(clock.dropped() > 0.0);
        assert_eq!(clock.accumulate(0.0), 0);
    }

    #[test]
    fn test_bad_deltas_ignored() {
        let mut clock = FixedStep::default();
        assert_eq!(clock.accumulate(f64::NAN), 0);
        assert_eq!(clock.accumulate(-1.0), 0);
        assert_eq!(clock.accumulate(f64::INFINITY), 0);
    }
}
