use std::collections::HashMap;
use std::num::NonZeroUsize;

use glam::Vec2;
use rapier2d::na;
use rapier2d::prelude::*;

use crate::api::types::ShapeId;
use crate::core::driver::SimulationSpace;
use crate::core::geometry::{box_vertices, ShapeGeometry};
use crate::error::SolverError;
use crate::systems::styler::ShapeView;

// ---------------------------------------------------------------------------
// glam <-> nalgebra conversions
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> na::Vector2<f32> {
    na::Vector2::new(v.x, v.y)
}

fn vec2_to_point(v: Vec2) -> na::Point2<f32> {
    na::Point2::new(v.x, v.y)
}

fn na_to_vec2(v: &na::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn point_to_vec2(p: &na::Point2<f32>) -> Vec2 {
    Vec2::new(p.x, p.y)
}

fn na_iso_to_pos_rot(iso: &na::Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    let rot = iso.rotation.angle();
    (pos, rot)
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Bodies at or above this mass cannot be dragged.
pub const INFINITE_MASS: f32 = f32::INFINITY;

/// Collision-group bit reserved for pointer grabbing.
pub const GRABBABLE_MASK_BIT: u32 = 1 << 31;

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
    KinematicPositionBased,
    KinematicVelocityBased,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
            BodyType::KinematicPositionBased => RigidBodyType::KinematicPositionBased,
            BodyType::KinematicVelocityBased => RigidBodyType::KinematicVelocityBased,
        }
    }

    fn from_rapier(kind: RigidBodyType) -> Self {
        match kind {
            RigidBodyType::Dynamic => BodyType::Dynamic,
            RigidBodyType::Fixed => BodyType::Fixed,
            RigidBodyType::KinematicPositionBased => BodyType::KinematicPositionBased,
            RigidBodyType::KinematicVelocityBased => BodyType::KinematicVelocityBased,
        }
    }
}

/// Shape description for a collider, in body-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
    /// Segment with thickness between two local endpoints.
    Capsule { a: Vec2, b: Vec2, radius: f32 },
    /// Zero-thickness segment.
    Segment { a: Vec2, b: Vec2 },
    /// Convex hull of the given points, optionally rounded.
    Polygon { points: Vec<Vec2>, radius: f32 },
}

impl ColliderDesc {
    fn build_collider(&self) -> Option<ColliderBuilder> {
        match self {
            ColliderDesc::Ball { radius } => Some(ColliderBuilder::ball(*radius)),
            ColliderDesc::Cuboid { half_width, half_height } => {
                Some(ColliderBuilder::cuboid(*half_width, *half_height))
            }
            ColliderDesc::Capsule { a, b, radius } => Some(ColliderBuilder::capsule_from_endpoints(
                vec2_to_point(*a),
                vec2_to_point(*b),
                *radius,
            )),
            ColliderDesc::Segment { a, b } => {
                Some(ColliderBuilder::segment(vec2_to_point(*a), vec2_to_point(*b)))
            }
            ColliderDesc::Polygon { points, radius } => {
                let pts: Vec<_> = points.iter().map(|p| vec2_to_point(*p)).collect();
                if *radius > 0.0 {
                    ColliderBuilder::round_convex_hull(&pts, *radius)
                } else {
                    ColliderBuilder::convex_hull(&pts)
                }
            }
        }
    }
}

/// Physical material properties for a collider.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.5,
            density: 1.0,
        }
    }
}

/// Category/mask pair deciding which shapes collide and which queries see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeFilter {
    pub categories: u32,
    pub mask: u32,
}

impl ShapeFilter {
    pub const ALL: Self = Self { categories: u32::MAX, mask: u32::MAX };
    /// Used by pointer queries: only sees shapes in the grabbable category.
    pub const GRABBABLE: Self = Self {
        categories: GRABBABLE_MASK_BIT,
        mask: GRABBABLE_MASK_BIT,
    };
    /// Terrain and walls: collide with everything except pointer queries.
    pub const NOT_GRABBABLE: Self = Self {
        categories: !GRABBABLE_MASK_BIT,
        mask: !GRABBABLE_MASK_BIT,
    };

    fn to_groups(self) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(self.categories),
            Group::from_bits_truncate(self.mask),
        )
    }
}

impl Default for ShapeFilter {
    fn default() -> Self {
        Self::ALL
    }
}

/// Everything needed to attach one collider to a body.
#[derive(Debug, Clone)]
pub struct ShapeDesc {
    pub collider: ColliderDesc,
    pub material: ColliderMaterial,
    /// Overrides `material.density` when set.
    pub mass: Option<f32>,
    pub sensor: bool,
    pub filter: ShapeFilter,
}

impl ShapeDesc {
    pub fn new(collider: ColliderDesc) -> Self {
        Self {
            collider,
            material: ColliderMaterial::default(),
            mass: None,
            sensor: false,
            filter: ShapeFilter::ALL,
        }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.material.friction = friction;
        self
    }

    pub fn with_elasticity(mut self, restitution: f32) -> Self {
        self.material.restitution = restitution;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn with_filter(mut self, filter: ShapeFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Builder for describing a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub gravity_scale: f32,
    pub fixed_rotation: bool,
    pub ccd: bool,
}

impl BodyDesc {
    fn with_type(body_type: BodyType) -> Self {
        Self {
            body_type,
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            gravity_scale: 1.0,
            fixed_rotation: false,
            ccd: false,
        }
    }

    pub fn dynamic() -> Self {
        Self::with_type(BodyType::Dynamic)
    }

    pub fn fixed() -> Self {
        Self {
            gravity_scale: 0.0,
            fixed_rotation: true,
            ..Self::with_type(BodyType::Fixed)
        }
    }

    /// Kinematic body moved by its velocity each step; used for pointer
    /// proxies and scripted platforms.
    pub fn kinematic() -> Self {
        Self {
            gravity_scale: 0.0,
            ..Self::with_type(BodyType::KinematicVelocityBased)
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.velocity = vel;
        self
    }

    pub fn with_angular_velocity(mut self, angvel: f32) -> Self {
        self.angular_velocity = angvel;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }
}

/// Non-owning handle to a body in the space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) RigidBodyHandle);

/// Non-owning handle to a shape in the space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub(crate) ColliderHandle);

/// Handle to a joint in the physics simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointHandle(pub(crate) ImpulseJointHandle);

/// Description of a joint between two bodies. Anchors are body-local.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointDesc {
    /// Pins the anchors together; free rotation.
    Pivot { anchor_a: Vec2, anchor_b: Vec2 },
    /// Soft pivot for pointer dragging: pulls the anchors together with a
    /// force capped at `max_force`. `error_bias` is the fraction of the
    /// separation left uncorrected after one second.
    Drag {
        anchor_a: Vec2,
        anchor_b: Vec2,
        max_force: f32,
        error_bias: f32,
    },
    /// Keeps the anchors at most `max_distance` apart. Connected bodies do
    /// not collide with each other.
    Slide {
        anchor_a: Vec2,
        anchor_b: Vec2,
        max_distance: f32,
    },
}

/// Result of a nearest-shape query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointQueryInfo {
    pub shape: ShapeHandle,
    pub body: BodyHandle,
    /// Closest point on the shape, or the query point itself when inside.
    pub point: Vec2,
    /// Distance to `point`; zero when the query point is inside the shape.
    pub distance: f32,
}

/// One active contact pair seen from a given body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub other: BodyHandle,
    /// Contact normal pointing from the given body towards `other`.
    pub normal: Vec2,
    /// Impulse applied over the last step, in the direction of `normal`.
    pub total_impulse: Vec2,
}

// ---------------------------------------------------------------------------
// PhysicsSpace
// ---------------------------------------------------------------------------

/// Owns the Rapier2D pipeline and all simulation state.
pub struct PhysicsSpace {
    gravity: na::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    static_body: BodyHandle,
    sleep_time_threshold: f32,
    next_shape_id: u32,
    breaking_forces: HashMap<ImpulseJointHandle, f32>,
    last_dt: f32,
}

impl PhysicsSpace {
    /// Matches Rapier's own default time-until-sleep.
    pub const DEFAULT_SLEEP_TIME_THRESHOLD: f32 = 2.0;

    /// Create a new space with the given gravity vector.
    /// For Y-down coordinate systems, use positive Y for downward gravity.
    pub fn new(gravity: Vec2) -> Self {
        let mut bodies = RigidBodySet::new();
        let static_body = BodyHandle(bodies.insert(RigidBodyBuilder::fixed().build()));
        Self {
            gravity: vec2_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            static_body,
            sleep_time_threshold: Self::DEFAULT_SLEEP_TIME_THRESHOLD,
            next_shape_id: 1,
            breaking_forces: HashMap::new(),
            last_dt: IntegrationParameters::default().dt,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        na_to_vec2(&self.gravity)
    }

    /// Solver iterations per step (at least 1).
    pub fn set_iterations(&mut self, iterations: usize) {
        self.integration_parameters.num_solver_iterations =
            NonZeroUsize::new(iterations.max(1)).unwrap_or(NonZeroUsize::MIN);
    }

    pub fn sleep_time_threshold(&self) -> f32 {
        self.sleep_time_threshold
    }

    /// Seconds a body must stay idle before the solver puts it to sleep.
    /// Applies to existing bodies and to every body created afterwards.
    pub fn set_sleep_time_threshold(&mut self, seconds: f32) {
        self.sleep_time_threshold = seconds.max(0.0);
        for (_, rb) in self.bodies.iter_mut() {
            rb.activation_mut().time_until_sleep = self.sleep_time_threshold;
        }
    }

    /// Step size of the most recent step.
    pub fn time_step(&self) -> f32 {
        self.last_dt
    }

    /// A fixed body at the origin, shared by walls and world anchors.
    pub fn static_body(&self) -> BodyHandle {
        self.static_body
    }

    // -- Bodies --

    pub fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let mut rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(vec2_to_na(desc.position))
            .rotation(desc.rotation)
            .linvel(vec2_to_na(desc.velocity))
            .angvel(desc.angular_velocity)
            .gravity_scale(desc.gravity_scale)
            .locked_axes(if desc.fixed_rotation {
                LockedAxes::ROTATION_LOCKED
            } else {
                LockedAxes::empty()
            })
            .ccd_enabled(desc.ccd)
            .build();
        rb.activation_mut().time_until_sleep = self.sleep_time_threshold;

        BodyHandle(self.bodies.insert(rb))
    }

    /// Remove a body together with its shapes and joints.
    pub fn remove_body(&mut self, body: BodyHandle) {
        let removed = self.bodies.remove(
            body.0,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        if removed.is_some() {
            let joints = &self.impulse_joints;
            self.breaking_forces.retain(|h, _| joints.get(*h).is_some());
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contains_body(&self, body: BodyHandle) -> bool {
        self.bodies.contains(body.0)
    }

    /// Current position and rotation of a body.
    pub fn body_position(&self, body: BodyHandle) -> (Vec2, f32) {
        self.bodies
            .get(body.0)
            .map(|rb| na_iso_to_pos_rot(rb.position()))
            .unwrap_or((Vec2::ZERO, 0.0))
    }

    /// Teleport a body. Kinematic bodies keep moving by their velocity
    /// during the next step.
    pub fn set_body_position(&mut self, body: BodyHandle, pos: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.0) {
            rb.set_translation(vec2_to_na(pos), true);
        }
    }

    pub fn velocity(&self, body: BodyHandle) -> Vec2 {
        self.bodies
            .get(body.0)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn set_velocity(&mut self, body: BodyHandle, vel: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.0) {
            rb.set_linvel(vec2_to_na(vel), true);
        }
    }

    pub fn angular_velocity(&self, body: BodyHandle) -> f32 {
        self.bodies.get(body.0).map(|rb| rb.angvel()).unwrap_or(0.0)
    }

    pub fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.0) {
            rb.apply_impulse(vec2_to_na(impulse), true);
        }
    }

    pub fn body_type(&self, body: BodyHandle) -> Option<BodyType> {
        self.bodies.get(body.0).map(|rb| BodyType::from_rapier(rb.body_type()))
    }

    /// Mass of a dynamic body; [`INFINITE_MASS`] for anything the solver
    /// never moves in response to forces.
    pub fn mass(&self, body: BodyHandle) -> f32 {
        match self.bodies.get(body.0) {
            Some(rb) if rb.is_dynamic() => rb.mass(),
            _ => INFINITE_MASS,
        }
    }

    pub fn is_sleeping(&self, body: BodyHandle) -> bool {
        self.bodies.get(body.0).map(|rb| rb.is_sleeping()).unwrap_or(false)
    }

    /// Seconds the body has spent below the sleep velocity thresholds.
    pub fn idle_time(&self, body: BodyHandle) -> f32 {
        self.bodies
            .get(body.0)
            .map(|rb| rb.activation().time_since_can_sleep)
            .unwrap_or(0.0)
    }

    pub fn world_to_local(&self, body: BodyHandle, point: Vec2) -> Vec2 {
        self.bodies
            .get(body.0)
            .map(|rb| point_to_vec2(&rb.position().inverse_transform_point(&vec2_to_point(point))))
            .unwrap_or(point)
    }

    pub fn local_to_world(&self, body: BodyHandle, point: Vec2) -> Vec2 {
        self.bodies
            .get(body.0)
            .map(|rb| point_to_vec2(&(rb.position() * vec2_to_point(point))))
            .unwrap_or(point)
    }

    // -- Shapes --

    /// Attach a shape to a body. Returns `None` if the description has no
    /// valid collider (e.g. a polygon hull of collinear points).
    pub fn add_shape(&mut self, body: BodyHandle, desc: &ShapeDesc) -> Option<ShapeHandle> {
        let Some(builder) = desc.collider.build_collider() else {
            log::warn!("shape description {:?} has no valid collider", desc.collider);
            return None;
        };
        if !self.bodies.contains(body.0) {
            return None;
        }

        let id = self.next_shape_id;
        self.next_shape_id = self.next_shape_id.wrapping_add(1);

        let builder = match desc.mass {
            Some(mass) => builder.mass(mass),
            None => builder.density(desc.material.density),
        };
        // Coefficients of two touching shapes multiply: a bouncy wall and a
        // dead box give a dead contact.
        let collider = builder
            .restitution(desc.material.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Multiply)
            .friction(desc.material.friction)
            .friction_combine_rule(CoefficientCombineRule::Multiply)
            .sensor(desc.sensor)
            .collision_groups(desc.filter.to_groups())
            .user_data(id as u128)
            .build();

        Some(ShapeHandle(self.colliders.insert_with_parent(
            collider,
            body.0,
            &mut self.bodies,
        )))
    }

    /// Create a body and attach one shape to it.
    pub fn spawn(&mut self, body: &BodyDesc, shape: &ShapeDesc) -> (BodyHandle, Option<ShapeHandle>) {
        let handle = self.create_body(body);
        let shape = self.add_shape(handle, shape);
        (handle, shape)
    }

    pub fn remove_shape(&mut self, shape: ShapeHandle) {
        self.colliders.remove(
            shape.0,
            &mut self.island_manager,
            &mut self.bodies,
            true,
        );
    }

    pub fn shape_count(&self) -> usize {
        self.colliders.len()
    }

    /// All shapes in a stable order.
    pub fn shapes(&self) -> impl Iterator<Item = ShapeHandle> + '_ {
        self.colliders.iter().map(|(h, _)| ShapeHandle(h))
    }

    pub fn shape_body(&self, shape: ShapeHandle) -> Option<BodyHandle> {
        self.colliders.get(shape.0)?.parent().map(BodyHandle)
    }

    pub fn shape_id(&self, shape: ShapeHandle) -> Option<ShapeId> {
        self.colliders.get(shape.0).map(|c| ShapeId(c.user_data as u32))
    }

    /// Snapshot of the state the debug colors depend on.
    pub fn shape_view(&self, shape: ShapeHandle) -> Option<ShapeView> {
        let collider = self.colliders.get(shape.0)?;
        let rb = self.bodies.get(collider.parent()?)?;
        Some(ShapeView {
            id: ShapeId(collider.user_data as u32),
            sensor: collider.is_sensor(),
            body_type: BodyType::from_rapier(rb.body_type()),
            sleeping: rb.is_sleeping(),
            idle_time: rb.activation().time_since_can_sleep,
        })
    }

    /// Geometry of a shape in its body's local frame.
    pub fn shape_geometry(&self, shape: ShapeHandle) -> Option<ShapeGeometry> {
        let collider = self.colliders.get(shape.0)?;
        let local = collider
            .position_wrt_parent()
            .copied()
            .unwrap_or_else(na::Isometry2::identity);
        let xf = |p: &na::Point2<f32>| point_to_vec2(&(local * p));
        let shape = collider.shape();

        if let Some(ball) = shape.as_ball() {
            Some(ShapeGeometry::Circle {
                center: na_to_vec2(&local.translation.vector),
                radius: ball.radius,
            })
        } else if let Some(capsule) = shape.as_capsule() {
            Some(ShapeGeometry::Segment {
                a: xf(&capsule.segment.a),
                b: xf(&capsule.segment.b),
                radius: capsule.radius,
            })
        } else if let Some(segment) = shape.as_segment() {
            Some(ShapeGeometry::Segment {
                a: xf(&segment.a),
                b: xf(&segment.b),
                radius: 0.0,
            })
        } else if let Some(cuboid) = shape.as_cuboid() {
            Some(ShapeGeometry::Polygon {
                vertices: transform_all(&local, box_vertices(cuboid.half_extents.x, cuboid.half_extents.y)),
                radius: 0.0,
            })
        } else if let Some(round) = shape.as_round_cuboid() {
            let he = round.inner_shape.half_extents;
            Some(ShapeGeometry::Polygon {
                vertices: transform_all(&local, box_vertices(he.x, he.y)),
                radius: round.border_radius,
            })
        } else if let Some(poly) = shape.as_convex_polygon() {
            Some(ShapeGeometry::Polygon {
                vertices: poly.points().iter().map(xf).collect(),
                radius: 0.0,
            })
        } else if let Some(round) = shape.as_round_convex_polygon() {
            Some(ShapeGeometry::Polygon {
                vertices: round.inner_shape.points().iter().map(xf).collect(),
                radius: round.border_radius,
            })
        } else {
            None
        }
    }

    // -- Queries --

    /// Nearest shape to `point` within `max_distance`, seen through `filter`.
    /// Sensors are never returned.
    pub fn point_query_nearest(
        &mut self,
        point: Vec2,
        max_distance: f32,
        filter: ShapeFilter,
    ) -> Option<PointQueryInfo> {
        self.query_pipeline.update(&self.colliders);

        let query_filter = QueryFilter::default()
            .groups(filter.to_groups())
            .exclude_sensors();
        let (handle, projection) = self.query_pipeline.project_point(
            &self.bodies,
            &self.colliders,
            &vec2_to_point(point),
            true,
            query_filter,
        )?;

        let hit = point_to_vec2(&projection.point);
        let distance = if projection.is_inside { 0.0 } else { hit.distance(point) };
        if distance > max_distance {
            return None;
        }

        let body = self.colliders.get(handle)?.parent()?;
        Some(PointQueryInfo {
            shape: ShapeHandle(handle),
            body: BodyHandle(body),
            point: hit,
            distance,
        })
    }

    /// Active contact pairs involving any shape of `body`.
    pub fn contacts(&self, body: BodyHandle) -> Vec<Contact> {
        let mut out = Vec::new();
        let Some(rb) = self.bodies.get(body.0) else {
            return out;
        };

        for &collider in rb.colliders() {
            for pair in self.narrow_phase.contact_pairs_with(collider) {
                if !pair.has_any_active_contact {
                    continue;
                }
                let (flip, other) = if pair.collider1 == collider {
                    (1.0, pair.collider2)
                } else {
                    (-1.0, pair.collider1)
                };
                let Some(other_body) = self.colliders.get(other).and_then(|c| c.parent()) else {
                    continue;
                };
                let Some(manifold) = pair.manifolds.iter().find(|m| !m.points.is_empty()) else {
                    continue;
                };
                let normal = na_to_vec2(&manifold.data.normal) * flip;
                // The stored impulse also carries the warm-start impulse
                // brought in from the previous step. Subtracting the one kept
                // for the next step gives this step's share once the contact
                // has settled.
                let total_impulse = pair
                    .manifolds
                    .iter()
                    .map(|m| {
                        let magnitude: f32 = m
                            .points
                            .iter()
                            .map(|p| p.data.impulse - p.data.warmstart_impulse)
                            .sum();
                        na_to_vec2(&m.data.normal) * magnitude
                    })
                    .sum::<Vec2>()
                    * flip;
                out.push(Contact {
                    other: BodyHandle(other_body),
                    normal,
                    total_impulse,
                });
            }
        }
        out
    }

    /// World-space points of every active solver contact.
    pub fn contact_points(&self) -> Vec<Vec2> {
        self.narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact)
            .flat_map(|pair| pair.manifolds.iter())
            .flat_map(|m| m.data.solver_contacts.iter())
            .map(|c| point_to_vec2(&c.point))
            .collect()
    }

    // -- Joints --

    /// Create a joint between two bodies. Returns a handle for later removal.
    pub fn create_joint(&mut self, body_a: BodyHandle, body_b: BodyHandle, desc: &JointDesc) -> JointHandle {
        let joint: GenericJoint = match *desc {
            JointDesc::Pivot { anchor_a, anchor_b } => RevoluteJointBuilder::new()
                .local_anchor1(vec2_to_point(anchor_a))
                .local_anchor2(vec2_to_point(anchor_b))
                .build()
                .into(),
            JointDesc::Drag { anchor_a, anchor_b, max_force, error_bias } => {
                // Fraction left after 1s -> exponential correction rate, then
                // critically damped gains for that rate.
                let rate = -error_bias.clamp(f32::EPSILON, 1.0).ln();
                let stiffness = rate * rate;
                let damping = 2.0 * rate;
                GenericJointBuilder::new(JointAxesMask::empty())
                    .local_anchor1(vec2_to_point(anchor_a))
                    .local_anchor2(vec2_to_point(anchor_b))
                    .motor_position(JointAxis::LinX, 0.0, stiffness, damping)
                    .motor_position(JointAxis::LinY, 0.0, stiffness, damping)
                    .motor_max_force(JointAxis::LinX, max_force)
                    .motor_max_force(JointAxis::LinY, max_force)
                    .build()
            }
            JointDesc::Slide { anchor_a, anchor_b, max_distance } => {
                let mut joint: GenericJoint = RopeJointBuilder::new(max_distance)
                    .local_anchor1(vec2_to_point(anchor_a))
                    .local_anchor2(vec2_to_point(anchor_b))
                    .build()
                    .into();
                joint.set_contacts_enabled(false);
                joint
            }
        };
        JointHandle(self.impulse_joints.insert(body_a.0, body_b.0, joint, true))
    }

    /// Remove a joint. Returns `false` if it was already gone.
    pub fn remove_joint(&mut self, handle: JointHandle) -> bool {
        self.breaking_forces.remove(&handle.0);
        self.impulse_joints.remove(handle.0, true).is_some()
    }

    pub fn contains_joint(&self, handle: JointHandle) -> bool {
        self.impulse_joints.get(handle.0).is_some()
    }

    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    pub fn joints(&self) -> impl Iterator<Item = JointHandle> + '_ {
        self.impulse_joints.iter().map(|(h, _)| JointHandle(h))
    }

    /// World-space anchor points of a joint.
    pub fn joint_anchors(&self, handle: JointHandle) -> Option<(Vec2, Vec2)> {
        let joint = self.impulse_joints.get(handle.0)?;
        let a = self.bodies.get(joint.body1)?.position() * joint.data.local_anchor1();
        let b = self.bodies.get(joint.body2)?.position() * joint.data.local_anchor2();
        Some((point_to_vec2(&a), point_to_vec2(&b)))
    }

    /// Magnitude of the impulse the joint applied during the last step,
    /// counting locked axes, limits (slide joints) and motors (drag joints).
    pub fn joint_impulse(&self, handle: JointHandle) -> Option<f32> {
        let joint = self.impulse_joints.get(handle.0)?;
        let limits: f32 = joint.data.limits.iter().map(|l| l.impulse * l.impulse).sum();
        let motors: f32 = joint.data.motors.iter().map(|m| m.impulse * m.impulse).sum();
        Some((joint.impulses.norm_squared() + limits + motors).sqrt())
    }

    /// Mark a joint as breakable once it has to exert more than `force`.
    ///
    /// This only arms the breaking check in
    /// [`break_overloaded_joints`](crate::core::breakable::break_overloaded_joints);
    /// the solver does not clamp pivot or slide joints to `force`, so an
    /// overloaded joint holds for the step that overloads it and snaps on
    /// the next check. Drag joints carry their own cap in [`JointDesc::Drag`].
    pub fn set_breaking_force(&mut self, handle: JointHandle, force: f32) {
        if self.contains_joint(handle) {
            self.breaking_forces.insert(handle.0, force);
        }
    }

    pub fn breaking_force(&self, handle: JointHandle) -> Option<f32> {
        self.breaking_forces.get(&handle.0).copied()
    }

    pub fn breakable_joints(&self) -> Vec<(JointHandle, f32)> {
        self.breaking_forces
            .iter()
            .map(|(h, f)| (JointHandle(*h), *f))
            .collect()
    }

    // -- private helpers --

    fn check_finite(&self) -> Result<(), SolverError> {
        for (handle, rb) in self.bodies.iter() {
            let t = rb.translation();
            let v = rb.linvel();
            if !(t.x.is_finite() && t.y.is_finite() && v.x.is_finite() && v.y.is_finite()) {
                return Err(SolverError::NonFiniteBody {
                    body: handle.into_raw_parts().0,
                });
            }
        }
        Ok(())
    }
}

impl SimulationSpace for PhysicsSpace {
    fn step(&mut self, dt: f32) -> Result<(), SolverError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SolverError::InvalidStep { dt });
        }
        self.integration_parameters.dt = dt;
        self.last_dt = dt;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        self.check_finite()
    }
}

fn transform_all(iso: &na::Isometry2<f32>, points: Vec<Vec2>) -> Vec<Vec2> {
    points
        .into_iter()
        .map(|p| point_to_vec2(&(iso * vec2_to_point(p))))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(radius: f32) -> ShapeDesc {
        ShapeDesc::new(ColliderDesc::Ball { radius })
    }

    #[test]
    fn new_space_has_only_the_static_body() {
        let space = PhysicsSpace::new(Vec2::ZERO);
        assert_eq!(space.body_count(), 1);
        assert_eq!(space.body_type(space.static_body()), Some(BodyType::Fixed));
    }

    #[test]
    fn create_and_remove_body() {
        let mut space = PhysicsSpace::new(Vec2::ZERO);
        let (body, shape) = space.spawn(&BodyDesc::dynamic(), &ball(10.0));
        assert!(shape.is_some());
        assert_eq!(space.body_count(), 2);
        assert_eq!(space.shape_count(), 1);
        space.remove_body(body);
        assert_eq!(space.body_count(), 1);
        assert_eq!(space.shape_count(), 0);
    }

    #[test]
    fn gravity_affects_dynamic_body() {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, 100.0));
        let (body, _) = space.spawn(&BodyDesc::dynamic(), &ball(5.0));

        let (initial_pos, _) = space.body_position(body);
        for _ in 0..10 {
            space.step(1.0 / 60.0).unwrap();
        }
        let (new_pos, _) = space.body_position(body);

        // positive Y = down
        assert!(
            new_pos.y > initial_pos.y,
            "Body should fall: start={}, end={}",
            initial_pos.y,
            new_pos.y
        );
    }

    #[test]
    fn fixed_body_does_not_move() {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, 100.0));
        let (body, _) = space.spawn(
            &BodyDesc::fixed().with_position(Vec2::new(0.0, 500.0)),
            &ShapeDesc::new(ColliderDesc::Cuboid { half_width: 100.0, half_height: 10.0 }),
        );
        for _ in 0..10 {
            space.step(1.0 / 60.0).unwrap();
        }
        let (pos, _) = space.body_position(body);
        assert!((pos.y - 500.0).abs() < 0.001, "Fixed body should not move: y={}", pos.y);
    }

    #[test]
    fn invalid_step_is_rejected() {
        let mut space = PhysicsSpace::new(Vec2::ZERO);
        assert_eq!(space.step(0.0), Err(SolverError::InvalidStep { dt: 0.0 }));
        assert!(space.step(f32::NAN).is_err());
    }

    #[test]
    fn impulse_changes_velocity() {
        let mut space = PhysicsSpace::new(Vec2::ZERO);
        let (body, _) = space.spawn(&BodyDesc::dynamic(), &ball(5.0));
        assert_eq!(space.velocity(body), Vec2::ZERO);
        space.apply_impulse(body, Vec2::new(100.0, 0.0));
        space.step(1.0 / 60.0).unwrap();
        assert!(space.velocity(body).x > 0.0);
    }

    #[test]
    fn mass_override_and_infinite_mass() {
        let mut space = PhysicsSpace::new(Vec2::ZERO);
        let (body, _) = space.spawn(&BodyDesc::dynamic(), &ball(5.0).with_mass(3.0));
        assert!((space.mass(body) - 3.0).abs() < 1e-3);

        let stat = space.static_body();
        assert_eq!(space.mass(stat), INFINITE_MASS);
        let kin = space.create_body(&BodyDesc::kinematic());
        assert_eq!(space.mass(kin), INFINITE_MASS);
    }

    #[test]
    fn body_position_and_rotation() {
        let mut space = PhysicsSpace::new(Vec2::ZERO);
        let body = space.create_body(
            &BodyDesc::dynamic()
                .with_position(Vec2::new(100.0, 200.0))
                .with_rotation(1.5),
        );
        let (pos, rot) = space.body_position(body);
        assert!((pos - Vec2::new(100.0, 200.0)).length() < 0.001);
        assert!((rot - 1.5).abs() < 0.001);

        let local = space.world_to_local(body, Vec2::new(100.0, 200.0));
        assert!(local.length() < 1e-4);
        let back = space.local_to_world(body, Vec2::new(3.0, 4.0));
        assert!((space.world_to_local(body, back) - Vec2::new(3.0, 4.0)).length() < 1e-3);
    }

    #[test]
    fn shape_geometry_is_body_local() {
        let mut space = PhysicsSpace::new(Vec2::ZERO);
        let body = space.create_body(&BodyDesc::dynamic().with_position(Vec2::new(50.0, 50.0)));
        let circle = space.add_shape(body, &ball(15.0)).unwrap();
        let boxed = space
            .add_shape(body, &ShapeDesc::new(ColliderDesc::Cuboid { half_width: 2.0, half_height: 1.0 }))
            .unwrap();
        let capsule = space
            .add_shape(
                body,
                &ShapeDesc::new(ColliderDesc::Capsule {
                    a: Vec2::new(0.0, -5.0),
                    b: Vec2::new(0.0, 5.0),
                    radius: 2.0,
                }),
            )
            .unwrap();

        assert_eq!(
            space.shape_geometry(circle),
            Some(ShapeGeometry::Circle { center: Vec2::ZERO, radius: 15.0 })
        );
        match space.shape_geometry(boxed) {
            Some(ShapeGeometry::Polygon { vertices, radius }) => {
                assert_eq!(vertices.len(), 4);
                assert_eq!(radius, 0.0);
                assert!(vertices.iter().all(|v| v.x.abs() == 2.0 && v.y.abs() == 1.0));
            }
            other => panic!("expected polygon, got {:?}", other),
        }
        match space.shape_geometry(capsule) {
            Some(ShapeGeometry::Segment { a, b, radius }) => {
                assert!((a.y.abs() - 5.0).abs() < 1e-4);
                assert!((b.y.abs() - 5.0).abs() < 1e-4);
                assert_eq!(radius, 2.0);
            }
            other => panic!("expected segment, got {:?}", other),
        }
    }

    #[test]
    fn shape_ids_are_unique_and_stable() {
        let mut space = PhysicsSpace::new(Vec2::ZERO);
        let (_, a) = space.spawn(&BodyDesc::dynamic(), &ball(1.0));
        let (_, b) = space.spawn(&BodyDesc::dynamic(), &ball(1.0));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(space.shape_id(a), space.shape_id(b));
        space.step(1.0 / 60.0).unwrap();
        assert_eq!(space.shape_view(a).unwrap().id, space.shape_id(a).unwrap());
    }

    #[test]
    fn point_query_inside_and_nearby() {
        let mut space = PhysicsSpace::new(Vec2::ZERO);
        let (body, shape) = space.spawn(
            &BodyDesc::dynamic().with_position(Vec2::new(100.0, 100.0)),
            &ball(10.0),
        );

        let inside = space
            .point_query_nearest(Vec2::new(102.0, 100.0), 5.0, ShapeFilter::GRABBABLE)
            .expect("inside hit");
        assert_eq!(inside.shape, shape.unwrap());
        assert_eq!(inside.body, body);
        assert_eq!(inside.distance, 0.0);

        let near = space
            .point_query_nearest(Vec2::new(113.0, 100.0), 5.0, ShapeFilter::GRABBABLE)
            .expect("near hit");
        assert!((near.distance - 3.0).abs() < 1e-3);
        assert!((near.point - Vec2::new(110.0, 100.0)).length() < 1e-3);

        assert!(space
            .point_query_nearest(Vec2::new(120.0, 100.0), 5.0, ShapeFilter::GRABBABLE)
            .is_none());
    }

    #[test]
    fn point_query_respects_filter_and_sensors() {
        let mut space = PhysicsSpace::new(Vec2::ZERO);
        space.spawn(
            &BodyDesc::dynamic(),
            &ball(10.0).with_filter(ShapeFilter::NOT_GRABBABLE),
        );
        space.spawn(
            &BodyDesc::dynamic().with_position(Vec2::new(50.0, 0.0)),
            &ball(10.0).with_sensor(true),
        );

        assert!(space.point_query_nearest(Vec2::ZERO, 5.0, ShapeFilter::GRABBABLE).is_none());
        assert!(space.point_query_nearest(Vec2::ZERO, 5.0, ShapeFilter::ALL).is_some());
        assert!(space
            .point_query_nearest(Vec2::new(50.0, 0.0), 5.0, ShapeFilter::ALL)
            .is_none());
    }

    #[test]
    fn create_and_remove_joint() {
        let mut space = PhysicsSpace::new(Vec2::ZERO);
        let a = space.create_body(&BodyDesc::dynamic());
        let b = space.create_body(&BodyDesc::dynamic().with_position(Vec2::new(50.0, 0.0)));

        assert_eq!(space.joint_count(), 0);
        let handle = space.create_joint(a, b, &JointDesc::Pivot {
            anchor_a: Vec2::new(25.0, 0.0),
            anchor_b: Vec2::new(-25.0, 0.0),
        });
        assert_eq!(space.joint_count(), 1);
        let (wa, wb) = space.joint_anchors(handle).unwrap();
        assert!((wa - wb).length() < 1e-4);

        assert!(space.remove_joint(handle));
        assert!(!space.remove_joint(handle));
        assert_eq!(space.joint_count(), 0);
    }

    #[test]
    fn pivot_joint_swings_pendulum() {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, 500.0));
        let pivot = space.create_body(&BodyDesc::fixed().with_position(Vec2::new(100.0, 100.0)));
        let (bob, _) = space.spawn(
            &BodyDesc::dynamic().with_position(Vec2::new(150.0, 100.0)),
            &ball(5.0),
        );
        space.create_joint(pivot, bob, &JointDesc::Pivot {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::new(-50.0, 0.0),
        });

        for _ in 0..60 {
            space.step(1.0 / 60.0).unwrap();
        }

        let (pos, _) = space.body_position(bob);
        assert!(pos.y > 105.0, "bob should swing down: y={}", pos.y);
        assert!(((pos - Vec2::new(100.0, 100.0)).length() - 50.0).abs() < 2.0);
    }

    #[test]
    fn slide_joint_limits_distance() {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, 500.0));
        let anchor = space.static_body();
        let (bob, _) = space.spawn(&BodyDesc::dynamic().with_position(Vec2::new(0.0, 10.0)), &ball(2.0));
        space.create_joint(anchor, bob, &JointDesc::Slide {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            max_distance: 30.0,
        });

        for _ in 0..120 {
            space.step(1.0 / 60.0).unwrap();
        }
        let (pos, _) = space.body_position(bob);
        assert!(pos.length() < 32.0, "rope should hold the bob: {:?}", pos);
        assert!(pos.y > 20.0, "bob should hang at the end of the rope: {:?}", pos);
    }

    #[test]
    fn slide_joint_reports_its_tension() {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, 500.0));
        let anchor = space.static_body();
        let (bob, _) = space.spawn(
            &BodyDesc::dynamic().with_position(Vec2::new(0.0, 30.0)),
            &ball(2.0).with_mass(1.0),
        );
        let joint = space.create_joint(anchor, bob, &JointDesc::Slide {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            max_distance: 30.0,
        });

        for _ in 0..120 {
            space.step(1.0 / 60.0).unwrap();
        }
        // taut rope carries the bob's weight, 1 * 500
        let force = space.joint_impulse(joint).unwrap() / space.time_step();
        assert!(force > 350.0 && force < 650.0, "rope tension {}", force);
    }

    fn resting_ball(space: &mut PhysicsSpace) -> BodyHandle {
        let floor = space.static_body();
        space.add_shape(
            floor,
            &ShapeDesc::new(ColliderDesc::Segment {
                a: Vec2::new(-100.0, 20.0),
                b: Vec2::new(100.0, 20.0),
            }),
        );
        space
            .spawn(
                &BodyDesc::dynamic().with_position(Vec2::new(0.0, 14.5)),
                &ball(5.0).with_elasticity(0.0),
            )
            .0
    }

    #[test]
    fn sleep_threshold_reaches_the_solver() {
        // set before the body exists
        let mut early = PhysicsSpace::new(Vec2::new(0.0, 100.0));
        early.set_sleep_time_threshold(0.5);
        let early_ball = resting_ball(&mut early);

        // set after the body exists
        let mut late = PhysicsSpace::new(Vec2::new(0.0, 100.0));
        let late_ball = resting_ball(&mut late);
        late.set_sleep_time_threshold(0.5);

        let mut default = PhysicsSpace::new(Vec2::new(0.0, 100.0));
        let default_ball = resting_ball(&mut default);

        for _ in 0..75 {
            early.step(1.0 / 60.0).unwrap();
            late.step(1.0 / 60.0).unwrap();
            default.step(1.0 / 60.0).unwrap();
        }

        assert!(early.is_sleeping(early_ball));
        assert!(late.is_sleeping(late_ball));
        assert!(!default.is_sleeping(default_ball), "default threshold is 2 s");
        assert!(default.idle_time(default_ball) > 0.5);
    }

    #[test]
    fn long_sleep_threshold_keeps_body_awake() {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, 100.0));
        space.set_sleep_time_threshold(5.0);
        let body = resting_ball(&mut space);
        for _ in 0..180 {
            space.step(1.0 / 60.0).unwrap();
        }
        assert!(!space.is_sleeping(body));
        assert!(space.idle_time(body) > 2.0);
    }

    #[test]
    fn remove_shape_keeps_the_body() {
        let mut space = PhysicsSpace::new(Vec2::ZERO);
        let (body, shape) = space.spawn(&BodyDesc::dynamic(), &ball(3.0));
        space.remove_shape(shape.unwrap());
        assert_eq!(space.shape_count(), 0);
        assert!(space.contains_body(body));
    }

    #[test]
    fn resting_body_reports_contacts() {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, 100.0));
        let floor = space.static_body();
        space.add_shape(
            floor,
            &ShapeDesc::new(ColliderDesc::Segment {
                a: Vec2::new(-100.0, 20.0),
                b: Vec2::new(100.0, 20.0),
            }),
        );
        let (ball_body, _) = space.spawn(&BodyDesc::dynamic(), &ball(5.0));

        for _ in 0..120 {
            space.step(1.0 / 60.0).unwrap();
        }

        let contacts = space.contacts(ball_body);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].other, floor);
        assert!(contacts[0].normal.y.abs() > 0.9, "{:?}", contacts[0].normal);
        assert!(!space.contact_points().is_empty());
    }

    #[test]
    fn builder_pattern() {
        let desc = BodyDesc::dynamic()
            .with_position(Vec2::new(10.0, 20.0))
            .with_velocity(Vec2::new(1.0, 2.0))
            .with_angular_velocity(0.4)
            .with_gravity_scale(0.5)
            .with_fixed_rotation(true)
            .with_ccd(true);

        assert_eq!(desc.body_type, BodyType::Dynamic);
        assert_eq!(desc.position, Vec2::new(10.0, 20.0));
        assert_eq!(desc.velocity, Vec2::new(1.0, 2.0));
        assert!((desc.angular_velocity - 0.4).abs() < 1e-6);
        assert!(desc.fixed_rotation);
        assert!(desc.ccd);

        let shape = ShapeDesc::new(ColliderDesc::Ball { radius: 1.0 })
            .with_friction(0.7)
            .with_elasticity(0.0)
            .with_filter(ShapeFilter::NOT_GRABBABLE);
        assert!((shape.material.friction - 0.7).abs() < 1e-6);
        assert_eq!(shape.filter, ShapeFilter::NOT_GRABBABLE);
    }

    #[test]
    fn collider_material_defaults() {
        let mat = ColliderMaterial::default();
        assert!((mat.restitution - 0.3).abs() < 0.001);
        assert!((mat.friction - 0.5).abs() < 0.001);
        assert!((mat.density - 1.0).abs() < 0.001);
    }
}
