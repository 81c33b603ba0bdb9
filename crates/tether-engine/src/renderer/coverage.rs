//! Fragment coverage contract for [`MeshVertex`](super::mesh::MeshVertex) meshes.
//!
//! The host rasterizer runs [`ANTIALIAS_WGSL`]; [`shade`] is the same
//! function on the CPU, used by software hosts and to pin the behavior down
//! in tests.

use glam::Vec2;

use super::mesh::Color;

/// WGSL source implementing the coverage function in a vertex+fragment pair.
pub const ANTIALIAS_WGSL: &str = include_str!("antialias.wgsl");

/// Rate of change of the aa coordinate used when no derivative is available.
pub const FALLBACK_FWIDTH: f32 = 0.1;

/// Hermite interpolation, matching the shading-language builtin.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Premultiplied output color for one fragment.
///
/// `fwidth` is the screen-space rate of change of `aa`; pass `None` to use
/// [`FALLBACK_FWIDTH`].
pub fn shade(aa: Vec2, fwidth: Option<f32>, fill: Color) -> [f32; 4] {
    let l = aa.length();
    let fw = fwidth.unwrap_or(FALLBACK_FWIDTH);

    let ow = 1.0 - fw;
    let fo_step = smoothstep((ow - fw).max(0.0), ow, l);
    let mix = |c: f32| c + (1.0 - c) * fo_step;
    let fo = [mix(fill.r), mix(fill.g), mix(fill.b), mix(fill.a)];

    let alpha = 1.0 - smoothstep(1.0 - fw, 1.0, l);
    let k = fo[3] * alpha;
    [fo[0] * k, fo[1] * k, fo[2] * k, fo[3] * k]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_keeps_fill_color() {
        let fill = Color::new(0.2, 0.4, 0.6, 1.0);
        assert_eq!(shade(Vec2::ZERO, None, fill), [0.2, 0.4, 0.6, 1.0]);
    }

    #[test]
    fn outer_edge_is_transparent() {
        let out = shade(Vec2::new(1.0, 0.0), Some(0.05), Color::RED);
        assert_eq!(out[3], 0.0);
        let beyond = shade(Vec2::new(0.0, 1.4), None, Color::RED);
        assert_eq!(beyond, [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn outline_band_blends_to_white() {
        // just inside the outer fade, fully in the outline band
        let out = shade(Vec2::new(0.9, 0.0), Some(0.1), Color::BLACK);
        assert!((out[0] - 1.0).abs() < 1e-5, "{:?}", out);
        assert!((out[3] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn alpha_falls_off_smoothly() {
        let mut last = 1.0;
        for i in 0..=10 {
            let l = 0.9 + i as f32 * 0.01;
            let a = shade(Vec2::new(l, 0.0), Some(0.1), Color::WHITE)[3];
            assert!(a <= last + 1e-6);
            last = a;
        }
    }

    #[test]
    fn output_is_premultiplied() {
        let out = shade(Vec2::ZERO, None, Color::new(1.0, 0.5, 0.0, 0.5));
        assert!((out[0] - 0.5).abs() < 1e-6);
        assert!((out[1] - 0.25).abs() < 1e-6);
        assert!((out[3] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn wgsl_source_is_embedded() {
        assert!(ANTIALIAS_WGSL.contains("fn fs_main"));
        assert!(ANTIALIAS_WGSL.contains("fwidth"));
    }
}
