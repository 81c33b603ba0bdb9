use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::renderer::mesh::Color;

/// How frame time is turned into physics steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    /// Consume wall time in whole fixed steps.
    Accumulate,
    /// Run exactly this many fixed steps per frame, ignoring wall time.
    FixedCount(u32),
}

impl Default for StepPolicy {
    fn default() -> Self {
        StepPolicy::Accumulate
    }
}

/// Which debug overlays the frame mesh includes besides shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugDrawFlags {
    pub joints: bool,
    pub contacts: bool,
    pub bounding_boxes: bool,
}

/// Sandbox configuration, provided by the scenario or loaded from JSON.
/// Every field has a default, so a partial document is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Frame deltas above this are clamped; the excess is dropped.
    pub max_catch_up: f32,
    pub step_policy: StepPolicy,
    /// For Y-down coordinate systems, use positive Y for downward gravity.
    pub gravity: Vec2,
    pub iterations: usize,
    /// Seconds a body idles before it sleeps. Idle bodies kept awake by
    /// their neighbours past this are drawn as idle.
    pub sleep_time_threshold: f32,
    /// How far from a shape a press may land and still grab it.
    pub capture_radius: f32,
    pub drag_max_force: f32,
    /// Fraction of drag error left uncorrected after one second.
    pub drag_error_bias: f32,
    /// How far a proxy moves toward its pointer each frame (0..=1).
    pub pointer_blend: f32,
    /// Frames per second used to turn proxy motion into velocity.
    pub display_rate: f32,
    /// Antialiasing margin in world units.
    pub aa_margin: f32,
    pub outline_color: Color,
    pub constraint_color: Color,
    pub collision_point_color: Color,
    pub bounds_color: Color,
    pub debug_draw: DebugDrawFlags,
}

impl SandboxConfig {
    pub const DEFAULT_DRAG_MAX_FORCE: f32 = 50000.0;

    /// 15% of the error corrected per tick at 60 Hz.
    pub fn default_drag_error_bias() -> f32 {
        (1.0f32 - 0.15).powi(60)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// The 1/180 s x3 super-stepping setup.
    pub fn super_stepping(steps: u32) -> Self {
        let steps = steps.max(1);
        Self {
            fixed_dt: 1.0 / (60.0 * steps as f32),
            step_policy: StepPolicy::FixedCount(steps),
            ..Self::default()
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_catch_up: 0.25,
            step_policy: StepPolicy::Accumulate,
            gravity: Vec2::new(0.0, 100.0),
            iterations: 10,
            sleep_time_threshold: 0.5,
            capture_radius: 5.0,
            drag_max_force: Self::DEFAULT_DRAG_MAX_FORCE,
            drag_error_bias: Self::default_drag_error_bias(),
            pointer_blend: 0.25,
            display_rate: 60.0,
            aa_margin: 1.0,
            outline_color: Color::new(0.3, 0.3, 0.3, 1.0),
            constraint_color: Color::new(0.0, 0.75, 0.0, 1.0),
            collision_point_color: Color::new(0.0, 0.0, 1.0, 1.0),
            bounds_color: Color::RED,
            debug_draw: DebugDrawFlags::default(),
        }
    }
}
