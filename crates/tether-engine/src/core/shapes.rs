//! Convenience constructors for the common sandbox bodies.

use glam::Vec2;

use crate::core::physics::{
    BodyDesc, BodyHandle, ColliderDesc, PhysicsSpace, ShapeDesc, ShapeFilter, ShapeHandle,
};

const BODY_FRICTION: f32 = 0.7;

/// Bouncy, grippy, never grabbable segment on an existing body.
pub fn add_wall(space: &mut PhysicsSpace, body: BodyHandle, a: Vec2, b: Vec2, radius: f32) -> Option<ShapeHandle> {
    let collider = if radius > 0.0 {
        ColliderDesc::Capsule { a, b, radius }
    } else {
        ColliderDesc::Segment { a, b }
    };
    let desc = ShapeDesc::new(collider)
        .with_elasticity(1.0)
        .with_friction(1.0)
        .with_filter(ShapeFilter::NOT_GRABBABLE);
    space.add_shape(body, &desc)
}

/// Dynamic box of the given total mass, centered on `pos`.
pub fn add_box(space: &mut PhysicsSpace, pos: Vec2, mass: f32, width: f32, height: f32) -> Option<ShapeHandle> {
    let collider = ColliderDesc::Cuboid {
        half_width: width / 2.0,
        half_height: height / 2.0,
    };
    spawn_dynamic(space, pos, mass, collider)
}

pub fn add_circle(space: &mut PhysicsSpace, pos: Vec2, mass: f32, radius: f32) -> Option<ShapeHandle> {
    spawn_dynamic(space, pos, mass, ColliderDesc::Ball { radius })
}

/// Vertical capsule filling a `width` x `height` box.
pub fn add_capsule(space: &mut PhysicsSpace, pos: Vec2, mass: f32, width: f32, height: f32) -> Option<ShapeHandle> {
    let half = ((height - width) / 2.0).max(0.0);
    let collider = ColliderDesc::Capsule {
        a: Vec2::new(0.0, half),
        b: Vec2::new(0.0, -half),
        radius: width / 2.0,
    };
    spawn_dynamic(space, pos, mass, collider)
}

/// Kinematic body spinning at a constant rate, e.g. a tumbling container.
pub fn add_spinner(space: &mut PhysicsSpace, pos: Vec2, angular_velocity: f32) -> BodyHandle {
    space.create_body(
        &BodyDesc::kinematic()
            .with_position(pos)
            .with_angular_velocity(angular_velocity),
    )
}

fn spawn_dynamic(space: &mut PhysicsSpace, pos: Vec2, mass: f32, collider: ColliderDesc) -> Option<ShapeHandle> {
    let desc = ShapeDesc::new(collider)
        .with_mass(mass)
        .with_elasticity(0.0)
        .with_friction(BODY_FRICTION);
    space.spawn(&BodyDesc::dynamic().with_position(pos), &desc).1
}
