use tether_engine::glam::Vec2;
use tether_engine::{
    add_circle, add_wall, BodyHandle, ContactSummary, InputEvent, PhysicsSpace, PointerId,
    Sandbox, SandboxConfig, Scenario,
};

const FLOOR_Y: f32 = 300.0;
const RADIUS: f32 = 10.0;

#[derive(Default)]
struct BallOnFloor {
    ball: Option<BodyHandle>,
}

impl Scenario for BallOnFloor {
    fn config(&self) -> SandboxConfig {
        SandboxConfig {
            gravity: Vec2::new(0.0, 300.0),
            ..SandboxConfig::default()
        }
    }

    fn init(&mut self, space: &mut PhysicsSpace) {
        let ground = space.static_body();
        add_wall(space, ground, Vec2::new(0.0, FLOOR_Y), Vec2::new(600.0, FLOOR_Y), 0.0);
        self.ball = add_circle(space, Vec2::new(300.0, 100.0), 1.0, RADIUS)
            .and_then(|shape| space.shape_body(shape));
    }
}

fn ball(sandbox: &Sandbox<BallOnFloor>) -> BodyHandle {
    sandbox.scenario().ball.expect("ball spawned")
}

fn run(sandbox: &mut Sandbox<BallOnFloor>, frames: usize) {
    for _ in 0..frames {
        sandbox.advance_simulation(1.0 / 60.0).unwrap();
    }
}

#[test]
fn ball_falls_and_comes_to_rest_on_the_floor() {
    let mut sandbox = Sandbox::new(BallOnFloor::default());
    let ball = ball(&sandbox);
    let rest_y = FLOOR_Y - RADIUS;
    let tolerance = 2.0;

    let mut heights = Vec::new();
    for _ in 0..240 {
        sandbox.advance_simulation(1.0 / 60.0).unwrap();
        heights.push(sandbox.space().body_position(ball).0.y);
    }

    let contact = heights
        .iter()
        .position(|&y| y >= rest_y - tolerance)
        .expect("ball should reach the floor");
    assert!(contact > 0, "ball starts well above the floor");
    for pair in heights[..=contact].windows(2) {
        assert!(pair[1] >= pair[0], "y must not decrease while falling: {:?}", pair);
    }
    for (frame, &y) in heights.iter().enumerate().skip(contact) {
        assert!(
            (y - rest_y).abs() < tolerance,
            "ball left the floor at frame {}: y = {}",
            frame,
            y
        );
    }
    assert!(sandbox.space().velocity(ball).length() < 5.0);

    let summary = ContactSummary::for_body(sandbox.space(), ball);
    assert_eq!(summary.touching, 1);
}

#[test]
fn grab_and_drag_lifts_the_ball() {
    let mut sandbox = Sandbox::new(BallOnFloor::default());
    let ball = ball(&sandbox);
    run(&mut sandbox, 240);

    let (rest, _) = sandbox.space().body_position(ball);
    sandbox.push_input(InputEvent::PointerDown { id: PointerId::Mouse, pos: rest });
    run(&mut sandbox, 1);
    assert_eq!(sandbox.space().joint_count(), 1);

    let target = rest + Vec2::new(100.0, -150.0);
    sandbox.push_input(InputEvent::PointerMove { id: PointerId::Mouse, pos: target });
    run(&mut sandbox, 120);

    let (held, _) = sandbox.space().body_position(ball);
    assert!(
        held.distance(target) < 20.0,
        "ball should hang near the pointer: {:?} vs {:?}",
        held,
        target
    );

    sandbox.push_input(InputEvent::PointerUp { id: PointerId::Mouse });
    run(&mut sandbox, 240);
    assert_eq!(sandbox.space().joint_count(), 0);
    let (dropped, _) = sandbox.space().body_position(ball);
    assert!((dropped.y - (FLOOR_Y - RADIUS)).abs() < 1.5, "ball should fall back: {:?}", dropped);
}

#[test]
fn frame_mesh_indices_stay_in_bounds() {
    let mut sandbox = Sandbox::new(BallOnFloor::default());
    for _ in 0..30 {
        sandbox.advance_simulation(1.0 / 60.0).unwrap();
        let mesh = sandbox.build_frame_mesh();
        let count = mesh.vertex_count() as u32;
        assert!(count > 0);
        assert_eq!(mesh.index_count() % 3, 0);
        assert!(mesh.indices().iter().all(|&i| i < count));
        assert_eq!(mesh.vertex_bytes().len(), mesh.vertex_count() * 48);
    }
}

#[test]
fn catch_up_is_capped_after_a_stall() {
    let mut sandbox = Sandbox::new(BallOnFloor::default());
    // a two second stall only replays max_catch_up worth of steps
    let steps = sandbox.advance_simulation(2.0).unwrap();
    assert_eq!(steps, 15);
    sandbox.build_frame_mesh();

    let stats = sandbox.stats();
    assert_eq!(stats.frames, 1);
    assert_eq!(stats.total_steps, 15);
    assert_eq!(stats.shapes_drawn, 2);
    assert_eq!(stats.shapes_skipped, 0);
}
