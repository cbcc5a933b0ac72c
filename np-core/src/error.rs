//! Error types for shape construction.

use thiserror::Error;

/// Errors that can occur when building a convex polyhedron.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// A face references fewer than three vertices.
    #[error("face {face} has {count} vertices (minimum 3)")]
    DegenerateFace {
        /// Index of the offending face.
        face: usize,
        /// Number of vertices in the face loop.
        count: usize,
    },

    /// A face references a vertex index outside the vertex array.
    #[error("face {face} references out-of-range vertex {vertex}")]
    VertexOutOfRange {
        /// Index of the offending face.
        face: usize,
        /// The out-of-range vertex index.
        vertex: usize,
    },

    /// An edge is not shared by exactly two faces (mesh is open or non-manifold).
    #[error("edge ({0}, {1}) is not shared by exactly two faces")]
    NonManifoldEdge(usize, usize),

    /// A face's vertex loop is collinear, so no normal can be computed.
    #[error("face {face} is collinear, cannot compute a normal")]
    CollinearFace {
        /// Index of the offending face.
        face: usize,
    },
}
