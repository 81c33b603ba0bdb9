pub mod api;
pub mod core;
pub mod error;
pub mod input;
pub mod renderer;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::config::{DebugDrawFlags, SandboxConfig, StepPolicy};
pub use api::sandbox::{Sandbox, Scenario};
pub use api::stats::FrameStats;
pub use api::types::{PointerId, ShapeId};
pub use crate::core::breakable::break_overloaded_joints;
pub use crate::core::contacts::ContactSummary;
pub use crate::core::driver::{SimulationDriver, SimulationSpace};
pub use crate::core::geometry::ShapeGeometry;
pub use crate::core::physics::{
    BodyDesc, BodyHandle, BodyType, ColliderDesc, ColliderMaterial, Contact, JointDesc,
    JointHandle, PhysicsSpace, PointQueryInfo, ShapeDesc, ShapeFilter, ShapeHandle,
    GRABBABLE_MASK_BIT, INFINITE_MASS,
};
pub use crate::core::shapes::{add_box, add_capsule, add_circle, add_spinner, add_wall};
pub use crate::core::time::FixedTimestep;
pub use error::{GeometryError, SolverError};
pub use input::interaction::{DragSettings, InteractionController, PointerProxy};
pub use input::queue::{InputEvent, InputQueue};
pub use renderer::coverage::{shade, ANTIALIAS_WGSL};
pub use renderer::mesh::{Color, MeshBatch, MeshVertex};
pub use renderer::traits::{DrawTiming, FrameData, Renderer};
pub use systems::debug::{DebugDraw, DrawStats};
pub use systems::styler::{ShapeStyler, ShapeView};
pub use systems::vector::{MeshStyle, VectorMeshBuilder};

// Keep `glam` reachable for hosts that only depend on this crate.
pub use glam;
