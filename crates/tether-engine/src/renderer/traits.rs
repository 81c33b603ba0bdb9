//! Renderer trait for hosts that rasterize the frame mesh.
//!
//! The browser host reads the mesh straight out of wasm memory and never
//! goes through this trait; native hosts implement it and get handed each
//! frame by [`Sandbox::render`](crate::api::sandbox::Sandbox::render).

use super::coverage::ANTIALIAS_WGSL;
use super::mesh::MeshBatch;

/// Timing information from a draw call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawTiming {
    /// Time spent submitting draw calls (microseconds)
    pub draw_us: u32,
    /// Time spent in GPU rasterization (microseconds, if measurable)
    pub raster_us: u32,
}

/// Everything a backend needs to put one frame on screen.
pub struct FrameData<'a> {
    pub mesh: &'a MeshBatch,
    /// Interpolation factor between the last two physics states.
    pub alpha: f32,
    /// Shader implementing the antialiasing coverage function.
    pub shader_source: &'static str,
}

impl<'a> FrameData<'a> {
    pub fn new(mesh: &'a MeshBatch, alpha: f32) -> Self {
        Self {
            mesh,
            alpha,
            shader_source: ANTIALIAS_WGSL,
        }
    }
}

/// Renderer trait for GPU backends.
///
/// # Example Implementation
///
/// ```ignore
/// struct WgpuRenderer { /* device, queue, pipeline, buffers */ }
///
/// impl Renderer for WgpuRenderer {
///     fn backend(&self) -> &'static str { "wgpu" }
///
///     fn draw(&mut self, frame: &FrameData) -> DrawTiming {
///         // upload frame.mesh.vertex_bytes() and indices, draw indexed
///     }
///
///     fn resize(&mut self, width: u32, height: u32) {
///         // recreate the surface and projection
///     }
/// }
/// ```
pub trait Renderer {
    /// Backend identifier (e.g., "webgpu", "wgpu", "software")
    fn backend(&self) -> &'static str;

    fn draw(&mut self, frame: &FrameData) -> DrawTiming;

    fn resize(&mut self, width: u32, height: u32);
}
