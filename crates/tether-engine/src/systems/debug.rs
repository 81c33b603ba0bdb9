//! Debug rendering: every shape in the space as an antialiased mesh, plus
//! optional joint, contact and bounding-box overlays.

use glam::Vec2;

use crate::api::config::{DebugDrawFlags, SandboxConfig};
use crate::core::geometry::ShapeGeometry;
use crate::core::physics::{PhysicsSpace, ShapeHandle};
use crate::error::GeometryError;
use crate::renderer::mesh::{Color, MeshBatch};
use crate::systems::styler::{ShapeStyler, ShapeView};
use crate::systems::vector::{MeshStyle, VectorMeshBuilder};

const JOINT_DOT: f32 = 5.0;
const CONTACT_DOT: f32 = 4.0;

/// Shapes drawn and skipped in one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub shapes: usize,
    pub skipped: usize,
}

/// Walks a space and appends one mesh per shape.
#[derive(Debug, Clone)]
pub struct DebugDraw {
    builder: VectorMeshBuilder,
    styler: ShapeStyler,
    outline: Color,
    constraint: Color,
    collision_point: Color,
    bounds: Color,
    flags: DebugDrawFlags,
}

impl DebugDraw {
    pub fn from_config(config: &SandboxConfig) -> Self {
        Self {
            builder: VectorMeshBuilder::new(config.aa_margin),
            styler: ShapeStyler::new(config.sleep_time_threshold),
            outline: config.outline_color,
            constraint: config.constraint_color,
            collision_point: config.collision_point_color,
            bounds: config.bounds_color,
            flags: config.debug_draw,
        }
    }

    pub fn flags(&self) -> DebugDrawFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: DebugDrawFlags) {
        self.flags = flags;
    }

    pub fn styler(&self) -> &ShapeStyler {
        &self.styler
    }

    /// Append every shape (and enabled overlays) to `batch`. Degenerate
    /// shapes are logged and skipped; the rest of the frame still draws.
    pub fn draw_space(&self, space: &PhysicsSpace, batch: &mut MeshBatch) -> DrawStats {
        let mut stats = DrawStats::default();

        for shape in space.shapes() {
            let Some((view, world, angle)) = resolve(space, shape) else {
                continue;
            };
            match self.draw_shape(batch, &view, &world, angle) {
                Ok(()) => stats.shapes += 1,
                Err(err) => {
                    log::warn!("skipping shape {:?}: {}", view.id, err);
                    stats.skipped += 1;
                }
            }
            if self.flags.bounding_boxes {
                self.draw_bounds(batch, &view, &world);
            }
        }

        if self.flags.joints {
            self.draw_joints(space, batch);
        }
        if self.flags.contacts {
            for point in space.contact_points() {
                self.builder.draw_dot(batch, CONTACT_DOT, point, self.collision_point);
            }
        }
        stats
    }

    /// One shape in world space, colored by its state.
    pub fn draw_shape(
        &self,
        batch: &mut MeshBatch,
        view: &ShapeView,
        world: &ShapeGeometry,
        angle: f32,
    ) -> Result<(), GeometryError> {
        let style = MeshStyle::new(self.outline, self.styler.color_for(view));
        self.builder.draw_geometry(batch, world, angle, style)
    }

    /// Bounds padded by the AA margin so hairline walls along an axis
    /// still get a box with some area.
    fn draw_bounds(&self, batch: &mut MeshBatch, view: &ShapeView, world: &ShapeGeometry) {
        let (min, max) = world.bounds();
        let pad = Vec2::splat(self.builder.margin());
        if let Err(err) = self.builder.draw_bounds(batch, min - pad, max + pad, self.bounds) {
            log::warn!("skipping bounds of {:?}: {}", view.id, err);
        }
    }

    fn draw_joints(&self, space: &PhysicsSpace, batch: &mut MeshBatch) {
        for joint in space.joints() {
            let Some((a, b)) = space.joint_anchors(joint) else {
                continue;
            };
            self.builder.draw_dot(batch, JOINT_DOT, a, self.constraint);
            self.builder.draw_dot(batch, JOINT_DOT, b, self.constraint);
            // coincident anchors (pivots) only get the dots
            if a.distance(b) > JOINT_DOT * 0.5 {
                if let Err(err) = self.builder.draw_segment(batch, a, b, self.constraint) {
                    log::warn!("skipping joint {:?}: {}", joint, err);
                }
            }
        }
    }
}

impl Default for DebugDraw {
    fn default() -> Self {
        Self::from_config(&SandboxConfig::default())
    }
}

fn resolve(space: &PhysicsSpace, shape: ShapeHandle) -> Option<(ShapeView, ShapeGeometry, f32)> {
    let view = space.shape_view(shape)?;
    let local = space.shape_geometry(shape)?;
    let body = space.shape_body(shape)?;
    let (pos, angle): (Vec2, f32) = space.body_position(body);
    Some((view, local.to_world(pos, angle), angle))
}
