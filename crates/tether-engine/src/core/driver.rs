//! Converts variable frame time into fixed simulation steps.

use crate::api::config::{SandboxConfig, StepPolicy};
use crate::core::time::FixedTimestep;
use crate::error::SolverError;

/// Anything that can be advanced by one fixed step.
pub trait SimulationSpace {
    fn step(&mut self, dt: f32) -> Result<(), SolverError>;
}

/// Owns the space and the step accumulator.
pub struct SimulationDriver<S> {
    space: S,
    timestep: FixedTimestep,
    policy: StepPolicy,
    total_steps: u64,
}

impl<S: SimulationSpace> SimulationDriver<S> {
    pub fn new(space: S, fixed_dt: f32, max_catch_up: f32, policy: StepPolicy) -> Self {
        Self {
            space,
            timestep: FixedTimestep::new(fixed_dt, max_catch_up),
            policy,
            total_steps: 0,
        }
    }

    pub fn from_config(space: S, config: &SandboxConfig) -> Self {
        Self::new(space, config.fixed_dt, config.max_catch_up, config.step_policy)
    }

    /// Advance with no pre-tick hook.
    pub fn advance(&mut self, wall_dt: f32) -> Result<u32, SolverError> {
        self.advance_with(wall_dt, |_, _| {})
    }

    /// Run as many fixed steps as the policy allows, calling `pre_tick`
    /// before each one. Returns the number of steps run.
    ///
    /// A solver error stops the frame immediately; time not yet simulated
    /// stays in the accumulator.
    pub fn advance_with<F>(&mut self, wall_dt: f32, mut pre_tick: F) -> Result<u32, SolverError>
    where
        F: FnMut(&mut S, f32),
    {
        let dt = self.timestep.dt();
        let mut steps = 0;

        match self.policy {
            StepPolicy::Accumulate => {
                self.timestep.accumulate(wall_dt);
                while self.timestep.has_step() {
                    pre_tick(&mut self.space, dt);
                    self.step_once(dt)?;
                    self.timestep.consume();
                    steps += 1;
                }
            }
            StepPolicy::FixedCount(count) => {
                for _ in 0..count {
                    pre_tick(&mut self.space, dt);
                    self.step_once(dt)?;
                    steps += 1;
                }
            }
        }

        Ok(steps)
    }

    fn step_once(&mut self, dt: f32) -> Result<(), SolverError> {
        if let Err(err) = self.space.step(dt) {
            log::error!("physics step failed after {} steps: {}", self.total_steps, err);
            return Err(err);
        }
        self.total_steps += 1;
        Ok(())
    }

    /// Fraction of a step left in the accumulator, in `[0, 1)`.
    pub fn alpha(&self) -> f32 {
        self.timestep.alpha()
    }

    pub fn accumulator(&self) -> f64 {
        self.timestep.accumulator()
    }

    pub fn fixed_dt(&self) -> f32 {
        self.timestep.dt()
    }

    pub fn policy(&self) -> StepPolicy {
        self.policy
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn space(&self) -> &S {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut S {
        &mut self.space
    }
}
