//! Antialiased vector mesh building.
//!
//! Converts circles, capsules, convex polygons and dots into triangles with a
//! per-vertex antialiasing coordinate. The fragment stage (see
//! [`crate::renderer::coverage`]) turns that coordinate into a soft outline
//! ring and a soft outer edge, so every shape gets a ~1px fringe regardless
//! of zoom.
//!
//! # Usage
//!
//! ```ignore
//! let builder = VectorMeshBuilder::new(1.0);
//! let style = MeshStyle::new(Color::RED, Color::gray(0.5));
//! builder.draw_circle(&mut batch, center, angle, 10.0, style)?;
//! builder.draw_polygon(&mut batch, &corners, 0.0, style)?;
//! ```

use glam::Vec2;

use crate::core::geometry::ShapeGeometry;
use crate::error::GeometryError;
use crate::renderer::mesh::{Color, MeshBatch, MeshVertex};

/// Below this, `1 + n1·n2` is treated as a 180° fold.
const FOLD_EPSILON: f32 = 1e-4;
/// Edges and segments shorter than this cannot produce a normal.
const MIN_EDGE_LENGTH: f32 = 1e-6;

/// Vertices emitted for a circle: the quad plus its spoke.
pub const CIRCLE_VERTICES: usize = 4 + FAT_SEGMENT_VERTICES;
pub const CIRCLE_INDICES: usize = 6 + FAT_SEGMENT_INDICES;
pub const FAT_SEGMENT_VERTICES: usize = 8;
pub const FAT_SEGMENT_INDICES: usize = 18;
pub const DOT_VERTICES: usize = 4;
pub const DOT_INDICES: usize = 6;

/// Vertices emitted for an `n`-gon: `n` fill vertices plus 6 per ring segment.
pub const fn polygon_vertex_count(n: usize) -> usize {
    n + 6 * n
}

/// Indices emitted for an `n`-gon: a fan of `n - 2` triangles plus 4
/// triangles per ring segment.
pub const fn polygon_index_count(n: usize) -> usize {
    3 * (n - 2) + 12 * n
}

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

const FAT_SEGMENT_TRIANGLES: [u32; FAT_SEGMENT_INDICES] = [
    0, 1, 2, //
    3, 1, 2, //
    3, 4, 2, //
    3, 4, 5, //
    6, 4, 5, //
    6, 7, 5, //
];

/// Per ring segment: inner A, inner B, outer B-normal at A, outer B-normal at
/// B, outer miter at A, outer A-normal at A.
const RING_TRIANGLES: [u32; 12] = [
    0, 1, 3, //
    0, 2, 3, //
    0, 2, 4, //
    0, 4, 5, //
];

/// Outline and fill colors for one draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshStyle {
    pub outline: Color,
    pub fill: Color,
}

impl MeshStyle {
    pub const fn new(outline: Color, fill: Color) -> Self {
        Self { outline, fill }
    }

    /// Same color for outline and fill.
    pub const fn solid(color: Color) -> Self {
        Self { outline: color, fill: color }
    }
}

/// `(x, y) -> (y, -x)`: the right-hand normal of an edge direction.
fn reverse_perp(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

fn all_finite(points: &[Vec2]) -> bool {
    points.iter().all(|p| p.is_finite())
}

/// Stateless mesh emitter parameterised by the antialiasing margin.
#[derive(Debug, Clone, Copy)]
pub struct VectorMeshBuilder {
    margin: f32,
}

impl VectorMeshBuilder {
    /// Half-pixel margin used when nothing else is configured.
    pub const DEFAULT_MARGIN: f32 = 1.0;

    pub fn new(margin: f32) -> Self {
        Self { margin }
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Dispatch on the shape class. `angle` only matters for circles, whose
    /// spoke shows the body's rotation.
    pub fn draw_geometry(
        &self,
        batch: &mut MeshBatch,
        geometry: &ShapeGeometry,
        angle: f32,
        style: MeshStyle,
    ) -> Result<(), GeometryError> {
        match geometry {
            ShapeGeometry::Circle { center, radius } => {
                self.draw_circle(batch, *center, angle, *radius, style)
            }
            ShapeGeometry::Segment { a, b, radius } => {
                self.draw_fat_segment(batch, *a, *b, *radius, style)
            }
            ShapeGeometry::Polygon { vertices, radius } => {
                self.draw_polygon(batch, vertices, *radius, style)
            }
        }
    }

    /// One quad sized to `radius + margin` plus a spoke from the center
    /// towards `angle`.
    pub fn draw_circle(
        &self,
        batch: &mut MeshBatch,
        center: Vec2,
        angle: f32,
        radius: f32,
        style: MeshStyle,
    ) -> Result<(), GeometryError> {
        if !center.is_finite() || !radius.is_finite() || !angle.is_finite() {
            return Err(GeometryError::NonFinite);
        }

        let r = radius + self.margin;
        let corner = |sx: f32, sy: f32| {
            MeshVertex::new(
                center + Vec2::new(sx * r, sy * r),
                Vec2::new(sx, sy),
                style.fill,
                style.outline,
            )
        };
        let quad = [
            corner(-1.0, -1.0),
            corner(-1.0, 1.0),
            corner(1.0, 1.0),
            corner(1.0, -1.0),
        ];

        let spoke_len = radius - self.margin * 0.5;
        let spoke = if spoke_len > MIN_EDGE_LENGTH {
            let tip = center + Vec2::from_angle(angle) * spoke_len;
            Some(self.fat_segment_vertices(center, tip, 0.0, style)?)
        } else {
            None
        };

        batch.push(&quad, &QUAD_INDICES);
        if let Some(spoke) = spoke {
            batch.push(&spoke, &FAT_SEGMENT_TRIANGLES);
        }
        Ok(())
    }

    /// Hairline segment in a single color.
    pub fn draw_segment(
        &self,
        batch: &mut MeshBatch,
        a: Vec2,
        b: Vec2,
        color: Color,
    ) -> Result<(), GeometryError> {
        self.draw_fat_segment(batch, a, b, 0.0, MeshStyle::solid(color))
    }

    /// Capsule from `a` to `b`. A zero radius is widened to the margin and
    /// drawn in the outline color.
    pub fn draw_fat_segment(
        &self,
        batch: &mut MeshBatch,
        a: Vec2,
        b: Vec2,
        radius: f32,
        style: MeshStyle,
    ) -> Result<(), GeometryError> {
        let verts = self.fat_segment_vertices(a, b, radius, style)?;
        batch.push(&verts, &FAT_SEGMENT_TRIANGLES);
        Ok(())
    }

    fn fat_segment_vertices(
        &self,
        a: Vec2,
        b: Vec2,
        radius: f32,
        style: MeshStyle,
    ) -> Result<[MeshVertex; FAT_SEGMENT_VERTICES], GeometryError> {
        if !all_finite(&[a, b]) || !radius.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        let axis = b - a;
        if axis.length() < MIN_EDGE_LENGTH {
            return Err(GeometryError::ZeroLengthSegment);
        }

        let n = reverse_perp(axis).normalize();
        let t = reverse_perp(n);

        let half = self.margin;
        let mut r = radius + half;
        let mut fill = style.fill;
        if r <= half {
            r = half;
            fill = style.outline;
        }

        let nw = n * r;
        let tw = t * r;
        let v = |p: Vec2, u: f32, w: f32| MeshVertex::new(p, Vec2::new(u, w), fill, style.outline);

        Ok([
            v(b - (nw + tw), 1.0, -1.0),
            v(b + (nw - tw), 1.0, 1.0),
            v(b - nw, 0.0, -1.0),
            v(b + nw, 0.0, 1.0),
            v(a - nw, 0.0, -1.0),
            v(a + nw, 0.0, 1.0),
            v(a - (nw - tw), -1.0, -1.0),
            v(a + (nw + tw), -1.0, 1.0),
        ])
    }

    /// Convex polygon: a fill fan over the inset outline, then a ring of
    /// outline triangles between the inset and the outset boundary.
    ///
    /// Reversed winding flips the normals and renders the face inside out;
    /// that is not detected.
    pub fn draw_polygon(
        &self,
        batch: &mut MeshBatch,
        vertices: &[Vec2],
        radius: f32,
        style: MeshStyle,
    ) -> Result<(), GeometryError> {
        let count = vertices.len();
        if count < 3 {
            return Err(GeometryError::TooFewVertices { count });
        }
        if !all_finite(vertices) || !radius.is_finite() {
            return Err(GeometryError::NonFinite);
        }

        // (miter offset, normal of the edge leaving the vertex)
        let mut extrude = Vec::with_capacity(count);
        for i in 0..count {
            let v0 = vertices[(i + count - 1) % count];
            let v1 = vertices[i];
            let v2 = vertices[(i + 1) % count];

            let e1 = v1 - v0;
            let e2 = v2 - v1;
            if e1.length() < MIN_EDGE_LENGTH {
                return Err(GeometryError::ZeroLengthEdge { index: (i + count - 1) % count });
            }
            if e2.length() < MIN_EDGE_LENGTH {
                return Err(GeometryError::ZeroLengthEdge { index: i });
            }

            let n1 = reverse_perp(e1).normalize();
            let n2 = reverse_perp(e2).normalize();
            let denominator = 1.0 + n1.dot(n2);
            if denominator < FOLD_EPSILON {
                return Err(GeometryError::DegenerateFold { index: i, denominator });
            }
            extrude.push(((n1 + n2) / denominator, n2));
        }

        let inset = -(self.margin - radius).max(0.0);
        let outset = self.margin + radius - inset;

        let mut verts = Vec::with_capacity(polygon_vertex_count(count));
        let mut indices = Vec::with_capacity(polygon_index_count(count));

        for (v, (offset, _)) in vertices.iter().zip(&extrude) {
            verts.push(MeshVertex::new(*v + *offset * inset, Vec2::ZERO, style.fill, style.fill));
        }
        for i in 1..(count as u32 - 1) {
            indices.extend_from_slice(&[0, i, i + 1]);
        }

        let mut j = count - 1;
        for i in 0..count {
            let (offset_a, n_a) = extrude[i];
            let (offset_b, n_b) = extrude[j];
            let inner_a = vertices[i] + offset_a * inset;
            let inner_b = vertices[j] + offset_b * inset;

            let base = verts.len() as u32;
            let v = |p: Vec2, aa: Vec2| MeshVertex::new(p, aa, style.fill, style.outline);
            verts.extend_from_slice(&[
                v(inner_a, Vec2::ZERO),
                v(inner_b, Vec2::ZERO),
                v(inner_a + n_b * outset, n_b),
                v(inner_b + n_b * outset, n_b),
                v(inner_a + offset_a * outset, offset_a),
                v(inner_a + n_a * outset, n_a),
            ]);
            indices.extend(RING_TRIANGLES.iter().map(|k| base + k));

            j = i;
        }

        batch.push(&verts, &indices);
        Ok(())
    }

    /// Axis-aligned quad centered on `pos`.
    pub fn draw_dot(&self, batch: &mut MeshBatch, diameter: f32, pos: Vec2, color: Color) {
        let r = diameter * 0.5;
        let corner = |sx: f32, sy: f32| {
            MeshVertex::new(pos + Vec2::new(sx * r, sy * r), Vec2::new(sx, sy), color, color)
        };
        batch.push(
            &[
                corner(-1.0, -1.0),
                corner(-1.0, 1.0),
                corner(1.0, 1.0),
                corner(1.0, -1.0),
            ],
            &QUAD_INDICES,
        );
    }

    /// Outline-only box, drawn as a polygon with a transparent fill.
    pub fn draw_bounds(
        &self,
        batch: &mut MeshBatch,
        min: Vec2,
        max: Vec2,
        outline: Color,
    ) -> Result<(), GeometryError> {
        let corners = [
            Vec2::new(max.x, min.y),
            Vec2::new(max.x, max.y),
            Vec2::new(min.x, max.y),
            Vec2::new(min.x, min.y),
        ];
        self.draw_polygon(batch, &corners, 0.0, MeshStyle::new(outline, Color::TRANSPARENT))
    }
}

impl Default for VectorMeshBuilder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MARGIN)
    }
}
