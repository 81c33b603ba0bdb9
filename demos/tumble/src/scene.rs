use tether_engine::glam::Vec2;
use tether_engine::{
    add_box, add_capsule, add_circle, add_spinner, add_wall, PhysicsSpace, SandboxConfig, Scenario,
};

const COLUMNS: usize = 7;
const ROWS: usize = 3;
const WIDTH: f32 = 30.0;
const HEIGHT: f32 = WIDTH * 2.0;

/// A square container spinning slowly around its center, full of boxes,
/// capsules and circle pairs.
pub struct Tumble;

impl Tumble {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Tumble {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for Tumble {
    fn config(&self) -> SandboxConfig {
        SandboxConfig {
            gravity: Vec2::new(0.0, 600.0),
            ..SandboxConfig::default()
        }
    }

    fn init(&mut self, space: &mut PhysicsSpace) {
        let container = add_spinner(space, Vec2::new(300.0, 200.0), 0.4);
        let corners = [
            Vec2::new(-200.0, -200.0),
            Vec2::new(-200.0, 200.0),
            Vec2::new(200.0, 200.0),
            Vec2::new(200.0, -200.0),
        ];
        for i in 0..corners.len() {
            add_wall(space, container, corners[i], corners[(i + 1) % corners.len()], 1.0);
        }

        let mass = 1.0;
        for i in 0..COLUMNS {
            for j in 0..ROWS {
                let pos = Vec2::new(i as f32 * WIDTH + 200.0, j as f32 * HEIGHT + 100.0);
                match (i + j) % 3 {
                    0 => {
                        add_box(space, pos, mass, WIDTH, HEIGHT);
                    }
                    1 => {
                        add_capsule(space, pos, mass, WIDTH, HEIGHT);
                    }
                    _ => {
                        let offset = Vec2::new(0.0, (HEIGHT - WIDTH) / 2.0);
                        add_circle(space, pos + offset, mass, WIDTH / 2.0);
                        add_circle(space, pos - offset, mass, WIDTH / 2.0);
                    }
                }
            }
        }
    }
}
