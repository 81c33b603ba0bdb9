use tether_engine::glam::Vec2;
use tether_engine::{
    add_capsule, add_circle, add_wall, break_overloaded_joints, JointDesc, PhysicsSpace,
    SandboxConfig, Scenario,
};

const SCREEN_WIDTH: f32 = 600.0;
const SCREEN_HEIGHT: f32 = 480.0;
const CHAIN_COUNT: usize = 8;
const LINK_COUNT: usize = 10;
const LINK_WIDTH: f32 = 20.0;
const LINK_HEIGHT: f32 = 30.0;
const BREAKING_FORCE: f32 = 80_000.0;

/// Chains of capsule links hanging from the ceiling, hit by a ball thrown
/// upward. Links snap when overloaded.
pub struct Chains {
    broken: usize,
}

impl Chains {
    pub fn new() -> Self {
        Self { broken: 0 }
    }

    pub fn broken(&self) -> usize {
        self.broken
    }
}

impl Default for Chains {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for Chains {
    fn config(&self) -> SandboxConfig {
        SandboxConfig {
            gravity: Vec2::new(0.0, 100.0),
            iterations: 30,
            sleep_time_threshold: 0.5,
            ..SandboxConfig::default()
        }
    }

    fn init(&mut self, space: &mut PhysicsSpace) {
        let ground = space.static_body();
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, SCREEN_HEIGHT),
            Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            Vec2::new(SCREEN_WIDTH, 0.0),
        ];
        for i in 0..corners.len() {
            add_wall(space, ground, corners[i], corners[(i + 1) % corners.len()], 0.0);
        }

        let spacing = LINK_WIDTH * 0.3;
        for i in 0..CHAIN_COUNT {
            let mut prev = None;
            for j in 0..LINK_COUNT {
                let pos = Vec2::new(
                    SCREEN_WIDTH / 2.0 + 40.0 * (i as f32 - (CHAIN_COUNT as f32 - 1.0) / 2.0),
                    (j as f32 + 0.5) * LINK_HEIGHT + (j as f32 + 1.0) * spacing,
                );
                let Some(link) = add_capsule(space, pos, 1.0, LINK_WIDTH, LINK_HEIGHT)
                    .and_then(|shape| space.shape_body(shape))
                else {
                    continue;
                };

                let top = Vec2::new(0.0, -LINK_HEIGHT / 2.0);
                let (other, anchor) = match prev {
                    Some(prev) => (prev, Vec2::new(0.0, LINK_HEIGHT / 2.0)),
                    None => (ground, Vec2::new(pos.x, 0.0)),
                };
                let joint = space.create_joint(link, other, &JointDesc::Slide {
                    anchor_a: top,
                    anchor_b: anchor,
                    max_distance: spacing,
                });
                space.set_breaking_force(joint, BREAKING_FORCE);
                prev = Some(link);
            }
        }

        if let Some(ball) = add_circle(space, Vec2::new(SCREEN_WIDTH / 2.0, SCREEN_HEIGHT - 100.0), 10.0, 15.0)
            .and_then(|shape| space.shape_body(shape))
        {
            space.set_velocity(ball, Vec2::new(0.0, -300.0));
        }
    }

    fn pre_tick(&mut self, space: &mut PhysicsSpace, _dt: f32) {
        self.broken += break_overloaded_joints(space).len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_engine::Sandbox;

    #[test]
    fn every_link_is_jointed() {
        let sandbox = Sandbox::new(Chains::new());
        assert_eq!(sandbox.space().joint_count(), CHAIN_COUNT * LINK_COUNT);
        assert!(sandbox
            .space()
            .joints()
            .all(|j| sandbox.space().breaking_force(j) == Some(BREAKING_FORCE)));
    }

    #[test]
    fn broken_links_are_accounted_for() {
        let mut sandbox = Sandbox::new(Chains::new());
        for _ in 0..60 {
            sandbox.advance_simulation(1.0 / 60.0).unwrap();
        }
        let space = sandbox.space();
        assert_eq!(
            space.joint_count() + sandbox.scenario().broken(),
            CHAIN_COUNT * LINK_COUNT
        );
    }
}
