/// Fixed timestep accumulator.
/// Turns variable frame deltas into whole fixed steps. Time is kept in f64 so
/// long runs of tiny deltas do not drift.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// The fixed delta time per tick.
    dt: f64,
    /// Upper bound on a single frame delta; the excess is dropped.
    max_catch_up: f64,
    /// Accumulated, not yet simulated time.
    accumulator: f64,
}

impl FixedTimestep {
    /// Relative slack when comparing the accumulator against one step, so a
    /// delta that is an exact multiple of `dt` in decimal yields that many steps.
    const STEP_TOLERANCE: f64 = 1e-5;

    pub fn new(dt: f32, max_catch_up: f32) -> Self {
        Self {
            dt: dt as f64,
            max_catch_up: max_catch_up.max(0.0) as f64,
            accumulator: 0.0,
        }
    }

    /// Add frame time. Negative or non-finite deltas count as zero.
    pub fn accumulate(&mut self, frame_dt: f32) {
        let frame_dt = if frame_dt.is_finite() { frame_dt.max(0.0) as f64 } else { 0.0 };
        self.accumulator += frame_dt.min(self.max_catch_up);
    }

    /// Whether at least one whole step is pending.
    pub fn has_step(&self) -> bool {
        self.accumulator >= self.dt * (1.0 - Self::STEP_TOLERANCE)
    }

    /// Mark one step as simulated.
    pub fn consume(&mut self) {
        self.accumulator = (self.accumulator - self.dt).max(0.0);
    }

    /// Interpolation alpha for rendering between ticks, in `[0, 1)`.
    pub fn alpha(&self) -> f32 {
        ((self.accumulator / self.dt) as f32).clamp(0.0, 1.0 - f32::EPSILON)
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// The fixed delta time.
    pub fn dt(&self) -> f32 {
        self.dt as f32
    }

    pub fn max_catch_up(&self) -> f32 {
        self.max_catch_up as f32
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(ts: &mut FixedTimestep) -> u32 {
        let mut steps = 0;
        while ts.has_step() {
            ts.consume();
            steps += 1;
        }
        steps
    }

    #[test]
    fn one_step_exact() {
        let mut ts = FixedTimestep::new(1.0 / 60.0, 0.25);
        ts.accumulate(1.0 / 60.0);
        assert_eq!(drain(&mut ts), 1);
    }

    #[test]
    fn accumulates_partial() {
        let mut ts = FixedTimestep::new(1.0 / 60.0, 0.25);
        ts.accumulate(0.008); // half a frame
        assert_eq!(drain(&mut ts), 0);
        ts.accumulate(0.010); // over one frame total
        assert_eq!(drain(&mut ts), 1);
    }

    #[test]
    fn clamps_to_max_catch_up() {
        let mut ts = FixedTimestep::new(1.0 / 60.0, 0.25);
        ts.accumulate(10.0);
        assert_eq!(drain(&mut ts), 15);
    }

    #[test]
    fn bad_deltas_count_as_zero() {
        let mut ts = FixedTimestep::new(1.0 / 60.0, 0.25);
        ts.accumulate(-1.0);
        ts.accumulate(f32::NAN);
        ts.accumulate(f32::INFINITY);
        assert_eq!(ts.accumulator(), 0.0);
    }

    #[test]
    fn alpha_is_between_zero_and_one() {
        let mut ts = FixedTimestep::new(1.0 / 60.0, 0.25);
        ts.accumulate(0.008);
        let a = ts.alpha();
        assert!(a >= 0.0 && a < 1.0, "alpha was {}", a);
    }
}
