use glam::Vec2;

/// Closed set of shape classes the mesh builder understands.
///
/// Stored in body-local space; [`ShapeGeometry::to_world`] applies the owning
/// body's transform once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    Circle { center: Vec2, radius: f32 },
    /// Capsule between two endpoints. `radius == 0` is a hairline segment.
    Segment { a: Vec2, b: Vec2, radius: f32 },
    /// Convex polygon, consistently wound, with an optional rounding radius.
    Polygon { vertices: Vec<Vec2>, radius: f32 },
}

impl ShapeGeometry {
    /// Rotate by `angle` then translate by `position`.
    pub fn to_world(&self, position: Vec2, angle: f32) -> ShapeGeometry {
        let rot = Vec2::from_angle(angle);
        let xf = |p: Vec2| position + rot.rotate(p);
        match self {
            ShapeGeometry::Circle { center, radius } => ShapeGeometry::Circle {
                center: xf(*center),
                radius: *radius,
            },
            ShapeGeometry::Segment { a, b, radius } => ShapeGeometry::Segment {
                a: xf(*a),
                b: xf(*b),
                radius: *radius,
            },
            ShapeGeometry::Polygon { vertices, radius } => ShapeGeometry::Polygon {
                vertices: vertices.iter().map(|&v| xf(v)).collect(),
                radius: *radius,
            },
        }
    }

    /// Axis-aligned bounds including the rounding radius.
    pub fn bounds(&self) -> (Vec2, Vec2) {
        match self {
            ShapeGeometry::Circle { center, radius } => {
                (*center - Vec2::splat(*radius), *center + Vec2::splat(*radius))
            }
            ShapeGeometry::Segment { a, b, radius } => {
                (a.min(*b) - Vec2::splat(*radius), a.max(*b) + Vec2::splat(*radius))
            }
            ShapeGeometry::Polygon { vertices, radius } => {
                let (min, max) = vertices.iter().fold(
                    (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
                    |(lo, hi), &v| (lo.min(v), hi.max(v)),
                );
                (min - Vec2::splat(*radius), max + Vec2::splat(*radius))
            }
        }
    }
}

/// Corners of an axis-aligned box, counter-clockwise in a Y-up frame.
pub fn box_vertices(half_width: f32, half_height: f32) -> Vec<Vec2> {
    vec![
        Vec2::new(-half_width, -half_height),
        Vec2::new(half_width, -half_height),
        Vec2::new(half_width, half_height),
        Vec2::new(-half_width, half_height),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn to_world_rotates_then_translates() {
        let seg = ShapeGeometry::Segment {
            a: Vec2::ZERO,
            b: Vec2::new(10.0, 0.0),
            radius: 1.0,
        };
        match seg.to_world(Vec2::new(5.0, 5.0), FRAC_PI_2) {
            ShapeGeometry::Segment { a, b, radius } => {
                assert!((a - Vec2::new(5.0, 5.0)).length() < 1e-4);
                assert!((b - Vec2::new(5.0, 15.0)).length() < 1e-4);
                assert_eq!(radius, 1.0);
            }
            other => panic!("expected segment, got {:?}", other),
        }
    }

    #[test]
    fn polygon_bounds_include_radius() {
        let poly = ShapeGeometry::Polygon {
            vertices: box_vertices(2.0, 1.0),
            radius: 0.5,
        };
        let (min, max) = poly.bounds();
        assert_eq!(min, Vec2::new(-2.5, -1.5));
        assert_eq!(max, Vec2::new(2.5, 1.5));
    }
}
