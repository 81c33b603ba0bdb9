use tether_engine::glam::Vec2;
use tether_engine::{
    DebugDrawFlags, InputEvent, MeshVertex, PointerId, Sandbox, Scenario, ANTIALIAS_WGSL,
};

/// Generic sandbox runner that wires a scenario to the browser frame loop.
///
/// Each concrete demo creates a `thread_local!` SandboxRunner and exports
/// free functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export
/// generic structs directly.
pub struct SandboxRunner<G: Scenario> {
    sandbox: Sandbox<G>,
    /// Set once a physics step fails; the runner stops stepping after that.
    failed: bool,
}

impl<G: Scenario> SandboxRunner<G> {
    pub fn new(scenario: G) -> Self {
        Self {
            sandbox: Sandbox::new(scenario),
            failed: false,
        }
    }

    /// Pointer events arrive with a raw host id: negative means the mouse.
    pub fn pointer_down(&mut self, raw_id: i32, x: f32, y: f32) {
        self.sandbox.push_input(InputEvent::PointerDown {
            id: PointerId::from_raw(raw_id),
            pos: Vec2::new(x, y),
        });
    }

    pub fn pointer_move(&mut self, raw_id: i32, x: f32, y: f32) {
        self.sandbox.push_input(InputEvent::PointerMove {
            id: PointerId::from_raw(raw_id),
            pos: Vec2::new(x, y),
        });
    }

    pub fn pointer_up(&mut self, raw_id: i32) {
        self.sandbox.push_input(InputEvent::PointerUp {
            id: PointerId::from_raw(raw_id),
        });
    }

    /// Run one displayed frame: input, physics, mesh. Returns the number of
    /// physics steps run.
    pub fn tick(&mut self, dt: f32) -> u32 {
        if self.failed {
            return 0;
        }
        let steps = match self.sandbox.advance_simulation(dt) {
            Ok(steps) => steps,
            Err(err) => {
                log::error!("simulation halted: {}", err);
                self.failed = true;
                0
            }
        };
        self.sandbox.build_frame_mesh();
        steps
    }

    pub fn set_debug_flags(&mut self, joints: bool, contacts: bool, bounding_boxes: bool) {
        self.sandbox.debug_draw_mut().set_flags(DebugDrawFlags {
            joints,
            contacts,
            bounding_boxes,
        });
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn sandbox(&self) -> &Sandbox<G> {
        &self.sandbox
    }

    // ---- Pointer accessors for zero-copy reads from wasm memory ----

    pub fn vertices_ptr(&self) -> *const f32 {
        self.sandbox.mesh().vertices_ptr()
    }

    pub fn vertex_count(&self) -> u32 {
        self.sandbox.mesh().vertex_count() as u32
    }

    pub fn vertex_stride_floats(&self) -> u32 {
        MeshVertex::FLOATS as u32
    }

    pub fn indices_ptr(&self) -> *const u32 {
        self.sandbox.mesh().indices_ptr()
    }

    pub fn index_count(&self) -> u32 {
        self.sandbox.mesh().index_count() as u32
    }

    // ---- Frame stats ----

    pub fn fps(&self) -> f32 {
        self.sandbox.stats().fps()
    }

    pub fn last_steps(&self) -> u32 {
        self.sandbox.stats().last_steps
    }

    pub fn alpha(&self) -> f32 {
        self.sandbox.alpha()
    }

    pub fn shader_source(&self) -> &'static str {
        ANTIALIAS_WGSL
    }
}
