pub mod coverage;
pub mod mesh;
pub mod traits;

// Re-export key types for convenient access
pub use mesh::{Color, MeshBatch, MeshVertex};
pub use traits::{DrawTiming, FrameData, Renderer};
