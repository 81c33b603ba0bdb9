//! Error types for mesh building and simulation stepping.
//!
//! Geometry errors are recoverable: the frame loop drops the offending shape
//! for that frame and logs it. Solver errors are fatal and go back to the host.

use thiserror::Error;

/// A shape whose outline cannot be meshed without producing NaN vertices.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("polygon needs at least 3 vertices, got {count}")]
    TooFewVertices { count: usize },

    #[error("edge starting at vertex {index} has zero length")]
    ZeroLengthEdge { index: usize },

    #[error("vertex {index} folds back 180 degrees (miter denominator {denominator})")]
    DegenerateFold { index: usize, denominator: f32 },

    #[error("segment endpoints coincide")]
    ZeroLengthSegment,

    #[error("non-finite coordinate in shape geometry")]
    NonFinite,
}

/// A failure surfaced by a physics step. Never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("body {body} has a non-finite state after stepping")]
    NonFiniteBody { body: u32 },

    #[error("invalid step size {dt}")]
    InvalidStep { dt: f32 },
}
