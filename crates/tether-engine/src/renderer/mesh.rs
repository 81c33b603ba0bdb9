use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// RGBA color, straight (not premultiplied) alpha, components in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color from RGB components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Opaque gray with all channels at `v`.
    pub const fn gray(v: f32) -> Self {
        Self::rgb(v, v, v)
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Per-vertex data for the antialiased mesh pipeline.
/// 12 floats = 48 bytes per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 2],
    /// Antialiasing coordinate. The fragment stage fades coverage as its
    /// length approaches 1.
    pub aa: [f32; 2],
    pub fill: [f32; 4],
    pub outline: [f32; 4],
}

impl MeshVertex {
    /// Number of floats per vertex.
    pub const FLOATS: usize = 12;
    /// Stride in bytes.
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4; // 48

    pub fn new(position: Vec2, aa: Vec2, fill: Color, outline: Color) -> Self {
        Self {
            position: position.to_array(),
            aa: aa.to_array(),
            fill: fill.to_array(),
            outline: outline.to_array(),
        }
    }
}

/// One frame's worth of triangles.
///
/// Append-only during a frame and reset at the start of the next one.
/// Indices are relative to this batch's own vertex list.
pub struct MeshBatch {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
}

impl MeshBatch {
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(vertices * 2),
        }
    }

    /// Drop all geometry. Called once per frame before rebuilding.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Index the next pushed vertex will get.
    pub fn cursor(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Append vertices plus triangles whose indices are relative to the
    /// first appended vertex.
    pub fn push(&mut self, vertices: &[MeshVertex], local_indices: &[u32]) {
        debug_assert!(local_indices.len() % 3 == 0);
        debug_assert!(local_indices.iter().all(|&i| (i as usize) < vertices.len()));
        let base = self.cursor();
        self.vertices.extend_from_slice(vertices);
        self.indices.extend(local_indices.iter().map(|i| base + i));
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw pointer to the vertex data for zero-copy reads by the host.
    pub fn vertices_ptr(&self) -> *const f32 {
        self.vertices.as_ptr() as *const f32
    }

    /// Raw pointer to the index data for zero-copy reads by the host.
    pub fn indices_ptr(&self) -> *const u32 {
        self.indices.as_ptr()
    }

    /// Vertex data as bytes, ready for a GPU buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

impl Default for MeshBatch {
    fn default() -> Self {
        Self::new()
    }
}
