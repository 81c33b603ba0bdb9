use glam::Vec2;

use crate::api::config::SandboxConfig;
use crate::api::stats::FrameStats;
use crate::api::types::PointerId;
use crate::core::driver::SimulationDriver;
use crate::core::physics::{BodyHandle, PhysicsSpace};
use crate::error::SolverError;
use crate::input::interaction::{DragSettings, InteractionController};
use crate::input::queue::{InputEvent, InputQueue};
use crate::renderer::mesh::MeshBatch;
use crate::renderer::traits::{DrawTiming, FrameData, Renderer};
use crate::systems::debug::DebugDraw;

/// The contract every sandbox scene fulfills.
pub trait Scenario {
    /// Return sandbox configuration. Called once before init.
    fn config(&self) -> SandboxConfig {
        SandboxConfig::default()
    }

    /// Build the initial world: walls, bodies, joints.
    fn init(&mut self, space: &mut PhysicsSpace);

    /// Runs before every fixed step. May add, remove or push bodies.
    fn pre_tick(&mut self, _space: &mut PhysicsSpace, _dt: f32) {}
}

/// One running scene: physics, pointer interaction and the frame mesh.
///
/// A frame is `advance_simulation` (input, interaction, fixed steps) then
/// `build_frame_mesh`.
pub struct Sandbox<G: Scenario> {
    scenario: G,
    config: SandboxConfig,
    driver: SimulationDriver<PhysicsSpace>,
    input: InputQueue,
    interaction: InteractionController,
    debug: DebugDraw,
    batch: MeshBatch,
    stats: FrameStats,
}

impl<G: Scenario> Sandbox<G> {
    pub fn new(mut scenario: G) -> Self {
        let config = scenario.config();

        let mut space = PhysicsSpace::new(config.gravity);
        space.set_iterations(config.iterations);
        space.set_sleep_time_threshold(config.sleep_time_threshold);
        scenario.init(&mut space);
        log::info!(
            "sandbox ready: {} bodies, {} shapes, {} joints",
            space.body_count(),
            space.shape_count(),
            space.joint_count()
        );

        Self {
            driver: SimulationDriver::from_config(space, &config),
            interaction: InteractionController::new(DragSettings::from_config(&config)),
            debug: DebugDraw::from_config(&config),
            input: InputQueue::new(),
            batch: MeshBatch::with_capacity(1024),
            stats: FrameStats::new(),
            scenario,
            config,
        }
    }

    /// Queue an event; it is applied at the start of the next
    /// `advance_simulation`.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Press now. Returns the grabbed body, if any.
    pub fn on_pointer_press(&mut self, id: PointerId, pos: Vec2) -> Option<BodyHandle> {
        self.interaction.on_press(self.driver.space_mut(), id, pos)
    }

    pub fn on_pointer_move(&mut self, id: PointerId, pos: Vec2) {
        self.interaction.on_move(id, pos);
    }

    /// Release now. Unknown ids are ignored.
    pub fn on_pointer_release(&mut self, id: PointerId) -> bool {
        self.interaction.on_release(self.driver.space_mut(), id)
    }

    /// Apply queued input, move the pointer proxies, then run the fixed
    /// steps owed for `dt` seconds of wall time.
    pub fn advance_simulation(&mut self, dt: f32) -> Result<u32, SolverError> {
        for event in self.input.drain() {
            self.interaction.handle(self.driver.space_mut(), event);
        }
        self.interaction.update(self.driver.space_mut());

        let scenario = &mut self.scenario;
        let steps = self
            .driver
            .advance_with(dt, |space, step| scenario.pre_tick(space, step))?;
        self.stats.record_frame(dt, steps);
        Ok(steps)
    }

    /// Rebuild the frame mesh from the current space.
    pub fn build_frame_mesh(&mut self) -> &MeshBatch {
        self.batch.reset();
        let drawn = self.debug.draw_space(self.driver.space(), &mut self.batch);
        self.stats.shapes_drawn = drawn.shapes;
        self.stats.shapes_skipped = drawn.skipped;
        &self.batch
    }

    /// Build the frame mesh and hand it to a native backend.
    pub fn render<R: Renderer>(&mut self, renderer: &mut R) -> DrawTiming {
        let alpha = self.driver.alpha();
        let mesh = self.build_frame_mesh();
        renderer.draw(&FrameData::new(mesh, alpha))
    }

    /// The most recently built mesh.
    pub fn mesh(&self) -> &MeshBatch {
        &self.batch
    }

    pub fn space(&self) -> &PhysicsSpace {
        self.driver.space()
    }

    pub fn space_mut(&mut self) -> &mut PhysicsSpace {
        self.driver.space_mut()
    }

    pub fn scenario(&self) -> &G {
        &self.scenario
    }

    pub fn scenario_mut(&mut self) -> &mut G {
        &mut self.scenario
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn debug_draw_mut(&mut self) -> &mut DebugDraw {
        &mut self.debug
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn alpha(&self) -> f32 {
        self.driver.alpha()
    }
}
