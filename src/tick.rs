//! Fixed-Timestep Pacing
//!
//! Accumulator that converts variable wall-clock frame times into a stream
//! of fixed-duration simulation ticks. The solver itself never reads time;
//! callers feed real frame deltas in and step the world once per granted
//! tick.
//!
//! Supports pausing, single-stepping while paused, and time scaling. All
//! bookkeeping is [`Fix128`], so pacing decisions are as deterministic as
//! the simulation they gate.

use crate::math::Fix128;

/// Fixed-timestep accumulator.
#[derive(Clone, Debug)]
pub struct TickSystem {
    fixed_dt: Fix128,
    accumulator: Fix128,
    time_scale: Fix128,
    paused: bool,
    step_once: bool,
}

impl TickSystem {
    /// Create a pacer running at `tick_rate` ticks per second.
    ///
    /// A non-positive rate falls back to 60.
    #[must_use]
    pub fn new(tick_rate: Fix128) -> Self {
        let rate = if tick_rate > Fix128::ZERO {
            tick_rate
        } else {
            Fix128::from_int(60)
        };
        Self {
            fixed_dt: Fix128::ONE / rate,
            accumulator: Fix128::ZERO,
            time_scale: Fix128::ONE,
            paused: false,
            step_once: false,
        }
    }

    /// Feed a real frame delta into the accumulator. Ignored while paused.
    pub fn update(&mut self, real_dt: Fix128) {
        if !self.paused {
            self.accumulator = self.accumulator + real_dt;
        }
    }

    /// Returns `true` when enough time has accumulated for one tick (or a
    /// single-step was requested).
    #[must_use]
    pub fn should_step(&self) -> bool {
        self.accumulator >= self.fixed_dt || self.step_once
    }

    /// Consume one tick if available. Returns whether a tick was granted.
    pub fn step(&mut self) -> bool {
        if !self.should_step() {
            return false;
        }
        self.accumulator = self.accumulator - self.fixed_dt;
        if self.accumulator.is_negative() {
            self.accumulator = Fix128::ZERO;
        }
        self.step_once = false;
        true
    }

    /// Simulation timestep for one tick, including the time scale.
    #[must_use]
    pub fn fixed_dt(&self) -> Fix128 {
        self.fixed_dt * self.time_scale
    }

    /// Current tick rate in ticks per second.
    #[must_use]
    pub fn tick_rate(&self) -> Fix128 {
        Fix128::ONE / self.fixed_dt
    }

    /// Change the tick rate. Non-positive rates are ignored.
    pub fn set_tick_rate(&mut self, tick_rate: Fix128) {
        if tick_rate > Fix128::ZERO {
            self.fixed_dt = Fix128::ONE / tick_rate;
        }
    }

    /// Current time scale.
    #[must_use]
    pub fn time_scale(&self) -> Fix128 {
        self.time_scale
    }

    /// Set the time scale (1 = real time).
    pub fn set_time_scale(&mut self, time_scale: Fix128) {
        self.time_scale = time_scale;
    }

    /// Pause or resume accumulation.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Returns `true` while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Request exactly one tick while paused.
    pub fn request_single_step(&mut self) {
        self.step_once = true;
    }
}

impl Default for TickSystem {
    fn default() -> Self {
        Self::new(Fix128::from_int(60))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_and_grants_ticks() {
        let mut tick = TickSystem::new(Fix128::from_int(60));
        assert!(!tick.should_step());

        // Feed two ticks' worth of time
        tick.update(Fix128::from_ratio(2, 60));
        assert!(tick.should_step());
        assert!(tick.step());
        assert!(tick.step());
        assert!(!tick.step());
    }

    #[test]
    fn test_paused_ignores_time() {
        let mut tick = TickSystem::new(Fix128::from_int(60));
        tick.set_paused(true);
        tick.update(Fix128::ONE);
        assert!(!tick.should_step());
    }

    #[test]
    fn test_single_step_while_paused() {
        let mut tick = TickSystem::new(Fix128::from_int(60));
        tick.set_paused(true);
        tick.request_single_step();
        assert!(tick.should_step());
        assert!(tick.step());
        // Granted exactly once
        assert!(!tick.should_step());
    }

    #[test]
    fn test_time_scale_affects_dt_only() {
        let mut tick = TickSystem::new(Fix128::from_int(60));
        tick.set_time_scale(Fix128::from_ratio(1, 2));
        assert_eq!(tick.fixed_dt(), Fix128::from_ratio(1, 60) * Fix128::from_ratio(1, 2));
        // Accumulation cadence is unchanged
        tick.update(Fix128::from_ratio(1, 60));
        assert!(tick.should_step());
    }

    #[test]
    fn test_invalid_rate_falls_back() {
        let tick = TickSystem::new(Fix128::ZERO);
        assert_eq!(tick.tick_rate().hi, 60);
    }

    #[test]
    fn test_set_tick_rate() {
        let mut tick = TickSystem::new(Fix128::from_int(60));
        tick.set_tick_rate(Fix128::from_int(120));
        assert_eq!(tick.tick_rate().hi, 120);
        tick.set_tick_rate(Fix128::ZERO);
        assert_eq!(tick.tick_rate().hi, 120);
    }
}
