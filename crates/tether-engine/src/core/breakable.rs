//! Joints that snap once they are loaded close to their breaking force.

use crate::core::physics::{JointHandle, PhysicsSpace};

/// A joint breaks when its last-step force exceeds this share of its limit.
pub const BREAK_THRESHOLD: f32 = 0.9;

/// Remove every breakable joint whose force over the last step exceeded
/// [`BREAK_THRESHOLD`] of its breaking force. Meant to run from the
/// pre-tick hook so it sees the impulses of the step just taken.
pub fn break_overloaded_joints(space: &mut PhysicsSpace) -> Vec<JointHandle> {
    let dt = space.time_step();
    if dt <= 0.0 {
        return Vec::new();
    }

    let mut broken = Vec::new();
    for (joint, max_force) in space.breakable_joints() {
        let Some(impulse) = space.joint_impulse(joint) else {
            continue;
        };
        let force = impulse / dt;
        if force > BREAK_THRESHOLD * max_force {
            log::debug!("joint {:?} broke at {:.1} (limit {:.1})", joint, force, max_force);
            space.remove_joint(joint);
            broken.push(joint);
        }
    }
    broken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::driver::SimulationSpace;
    use crate::core::physics::{BodyDesc, ColliderDesc, JointDesc, ShapeDesc};
    use glam::Vec2;

    fn hanging_weight(breaking_force: f32) -> (PhysicsSpace, JointHandle) {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, 100.0));
        let anchor = space.static_body();
        let (weight, _) = space.spawn(
            &BodyDesc::dynamic().with_position(Vec2::new(0.0, 20.0)),
            &ShapeDesc::new(ColliderDesc::Ball { radius: 5.0 }).with_mass(10.0),
        );
        let joint = space.create_joint(anchor, weight, &JointDesc::Pivot {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::new(0.0, -20.0),
        });
        space.set_breaking_force(joint, breaking_force);
        (space, joint)
    }

    fn run(space: &mut PhysicsSpace, ticks: usize) -> Vec<JointHandle> {
        let mut broken = Vec::new();
        for _ in 0..ticks {
            broken.extend(break_overloaded_joints(space));
            space.step(1.0 / 60.0).unwrap();
        }
        broken
    }

    #[test]
    fn weak_joint_breaks_under_load() {
        // weight is 10 * 100 = 1000
        let (mut space, joint) = hanging_weight(100.0);
        let broken = run(&mut space, 10);
        assert_eq!(broken, vec![joint]);
        assert!(!space.contains_joint(joint));
        assert_eq!(space.breaking_force(joint), None);
    }

    #[test]
    fn strong_joint_holds() {
        let (mut space, joint) = hanging_weight(100_000.0);
        assert!(run(&mut space, 30).is_empty());
        assert!(space.contains_joint(joint));
    }

    #[test]
    fn overloaded_slide_joint_snaps() {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, 100.0));
        let anchor = space.static_body();
        let (weight, _) = space.spawn(
            &BodyDesc::dynamic().with_position(Vec2::new(0.0, 20.0)),
            &ShapeDesc::new(ColliderDesc::Ball { radius: 5.0 }).with_mass(10.0),
        );
        let rope = space.create_joint(anchor, weight, &JointDesc::Slide {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            max_distance: 20.0,
        });
        space.set_breaking_force(rope, 100.0);

        assert_eq!(run(&mut space, 10), vec![rope]);
        assert_eq!(space.joint_count(), 0);
    }

    #[test]
    fn unbreakable_joints_are_ignored() {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, 100.0));
        let a = space.static_body();
        let b = space.create_body(&BodyDesc::dynamic());
        space.create_joint(a, b, &JointDesc::Pivot { anchor_a: Vec2::ZERO, anchor_b: Vec2::ZERO });
        assert!(run(&mut space, 5).is_empty());
        assert_eq!(space.joint_count(), 1);
    }
}
