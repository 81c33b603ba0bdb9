//! Deterministic debug coloring for simulation shapes.

use crate::api::types::ShapeId;
use crate::core::physics::BodyType;
use crate::renderer::mesh::Color;

/// Snapshot of everything the color policy looks at for one shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeView {
    pub id: ShapeId,
    pub sensor: bool,
    pub body_type: BodyType,
    pub sleeping: bool,
    /// Seconds the owning body has been below the sleep velocity thresholds.
    pub idle_time: f32,
}

/// Maps a shape's identity and body state to a display color.
#[derive(Debug, Clone, Copy)]
pub struct ShapeStyler {
    sleep_time_threshold: f32,
}

impl ShapeStyler {
    pub const SENSOR: Color = Color::new(1.0, 1.0, 1.0, 0.1);
    pub const SLEEPING: Color = Color::gray(0.2);
    pub const IDLE: Color = Color::gray(0.66);
    pub const STATIC_INTENSITY: f32 = 0.15;
    pub const DYNAMIC_INTENSITY: f32 = 0.75;

    pub fn new(sleep_time_threshold: f32) -> Self {
        Self { sleep_time_threshold }
    }

    pub fn sleep_time_threshold(&self) -> f32 {
        self.sleep_time_threshold
    }

    pub fn color_for(&self, shape: &ShapeView) -> Color {
        if shape.sensor {
            return Self::SENSOR;
        }
        if shape.sleeping {
            return Self::SLEEPING;
        }
        if shape.idle_time > self.sleep_time_threshold {
            return Self::IDLE;
        }

        let intensity = match shape.body_type {
            BodyType::Fixed => Self::STATIC_INTENSITY,
            _ => Self::DYNAMIC_INTENSITY,
        };
        hashed_color(shape.id, intensity)
    }
}

/// Robert Jenkins' 32-bit integer hash.
pub fn scramble(mut val: u32) -> u32 {
    val = val.wrapping_add(0x7ed5_5d16).wrapping_add(val << 12);
    val = (val ^ 0xc761_c23c) ^ (val >> 19);
    val = val.wrapping_add(0x1656_67b1).wrapping_add(val << 5);
    val = val.wrapping_add(0xd3a2_646c) ^ (val << 9);
    val = val.wrapping_add(0xfd70_46c5).wrapping_add(val << 3);
    val = (val ^ 0xb55a_4f09) ^ (val >> 16);
    val
}

/// Stretch the three hashed byte channels so their span equals `intensity`.
pub fn hashed_color(id: ShapeId, intensity: f32) -> Color {
    let val = scramble(id.0);
    let r = (val & 0xFF) as f32;
    let g = ((val >> 8) & 0xFF) as f32;
    let b = ((val >> 16) & 0xFF) as f32;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if min == max {
        return Color::gray(intensity);
    }

    let coef = intensity / (max - min);
    Color::rgb((r - min) * coef, (g - min) * coef, (b - min) * coef)
}
