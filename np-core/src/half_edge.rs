//! Half-edge convex polyhedron data.
//!
//! Each undirected edge of the polyhedron is split into two directed
//! half-edges, one per adjacent face, enabling face/edge adjacency queries
//! without search. SAT axis enumeration iterates the unique (undirected)
//! edges; clipping iterates a face's vertex loop.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::error::ShapeError;

/// A directed edge bordering one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfEdge {
    /// Index of the origin vertex.
    pub vertex: usize,
    /// Index of the oppositely-directed half-edge on the adjacent face.
    pub twin: usize,
    /// Index of the next half-edge around the same face (CCW).
    pub next: usize,
    /// Index of the face this half-edge borders.
    pub face: usize,
}

/// One face of the polyhedron.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    /// Vertex indices in counter-clockwise order viewed from outside.
    pub vertices: Vec<usize>,
    /// Index of the first half-edge of this face's loop.
    pub first_edge: usize,
}

/// Immutable convex polyhedron with half-edge topology.
///
/// Vertices are in shape-local coordinates; face normals are unit-length,
/// outward-facing, and precomputed at construction. The collision routines
/// only read this data.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexPolyhedronData {
    vertices: Vec<Point3<f64>>,
    faces: Vec<Face>,
    face_normals: Vec<Vector3<f64>>,
    half_edges: Vec<HalfEdge>,
    /// Unique undirected edges as (vertex, vertex) index pairs.
    edges: Vec<(usize, usize)>,
}

impl ConvexPolyhedronData {
    /// Build a polyhedron from vertices and CCW face loops.
    ///
    /// Every edge must be shared by exactly two faces (closed, manifold
    /// surface); convexity is the caller's responsibility.
    pub fn new(
        vertices: Vec<Point3<f64>>,
        face_loops: Vec<Vec<usize>>,
    ) -> Result<Self, ShapeError> {
        let mut faces = Vec::with_capacity(face_loops.len());
        let mut face_normals = Vec::with_capacity(face_loops.len());
        let mut half_edges = Vec::new();
        let mut twin_lookup: HashMap<(usize, usize), usize> = HashMap::new();

        for (face_index, loop_vertices) in face_loops.iter().enumerate() {
            let count = loop_vertices.len();
            if count < 3 {
                return Err(ShapeError::DegenerateFace {
                    face: face_index,
                    count,
                });
            }
            for &v in loop_vertices {
                if v >= vertices.len() {
                    return Err(ShapeError::VertexOutOfRange {
                        face: face_index,
                        vertex: v,
                    });
                }
            }

            face_normals.push(face_normal_newell(&vertices, loop_vertices, face_index)?);

            let first_edge = half_edges.len();
            for i in 0..count {
                let from = loop_vertices[i];
                let to = loop_vertices[(i + 1) % count];
                let edge_index = half_edges.len();
                half_edges.push(HalfEdge {
                    vertex: from,
                    twin: usize::MAX, // patched below
                    next: first_edge + (i + 1) % count,
                    face: face_index,
                });
                if twin_lookup.insert((from, to), edge_index).is_some() {
                    // Same directed edge twice means inconsistent winding
                    return Err(ShapeError::NonManifoldEdge(from, to));
                }
            }

            faces.push(Face {
                vertices: loop_vertices.clone(),
                first_edge,
            });
        }

        // Link twins; every directed edge must have its reverse on another face
        let mut edges = Vec::with_capacity(half_edges.len() / 2);
        for (&(from, to), &edge_index) in &twin_lookup {
            let &twin_index = twin_lookup
                .get(&(to, from))
                .ok_or(ShapeError::NonManifoldEdge(from, to))?;
            half_edges[edge_index].twin = twin_index;
            if from < to {
                edges.push((from, to));
            }
        }
        // HashMap iteration order is unstable; sort for deterministic axis order
        edges.sort_unstable();

        Ok(Self {
            vertices,
            faces,
            face_normals,
            half_edges,
            edges,
        })
    }

    /// Build an axis-aligned box with the given half-extents.
    ///
    /// # Panics
    ///
    /// Never panics; the box topology is statically correct.
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn cuboid(half_extents: Vector3<f64>) -> Self {
        let (hx, hy, hz) = (half_extents.x, half_extents.y, half_extents.z);
        let vertices = vec![
            Point3::new(-hx, -hy, -hz),
            Point3::new(hx, -hy, -hz),
            Point3::new(hx, hy, -hz),
            Point3::new(-hx, hy, -hz),
            Point3::new(-hx, -hy, hz),
            Point3::new(hx, -hy, hz),
            Point3::new(hx, hy, hz),
            Point3::new(-hx, hy, hz),
        ];
        let face_loops = vec![
            vec![0, 3, 2, 1], // -Z
            vec![4, 5, 6, 7], // +Z
            vec![0, 1, 5, 4], // -Y
            vec![2, 3, 7, 6], // +Y
            vec![0, 4, 7, 3], // -X
            vec![1, 2, 6, 5], // +X
        ];
        #[allow(clippy::unwrap_used)]
        Self::new(vertices, face_loops).unwrap()
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex position in local coordinates.
    #[must_use]
    pub fn vertex(&self, index: usize) -> Point3<f64> {
        self.vertices[index]
    }

    /// All vertices in local coordinates.
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Face descriptor (vertex loop + first half-edge).
    #[must_use]
    pub fn face(&self, index: usize) -> &Face {
        &self.faces[index]
    }

    /// Outward unit face normal in local coordinates.
    #[must_use]
    pub fn face_normal(&self, index: usize) -> Vector3<f64> {
        self.face_normals[index]
    }

    /// Half-edge by index.
    #[must_use]
    pub fn half_edge(&self, index: usize) -> &HalfEdge {
        &self.half_edges[index]
    }

    /// Unique undirected edges as (vertex, vertex) index pairs.
    #[must_use]
    pub fn unique_edges(&self) -> &[(usize, usize)] {
        &self.edges
    }
}

/// Face normal via Newell's method, normalized.
fn face_normal_newell(
    vertices: &[Point3<f64>],
    loop_vertices: &[usize],
    face_index: usize,
) -> Result<Vector3<f64>, ShapeError> {
    let mut normal: Vector3<f64> = Vector3::zeros();
    for i in 0..loop_vertices.len() {
        let a = vertices[loop_vertices[i]];
        let b = vertices[loop_vertices[(i + 1) % loop_vertices.len()]];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    let norm = normal.norm();
    if norm < 1e-12 {
        return Err(ShapeError::CollinearFace { face: face_index });
    }
    Ok(normal / norm)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cuboid_topology() {
        let cuboid = ConvexPolyhedronData::cuboid(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(cuboid.vertex_count(), 8);
        assert_eq!(cuboid.face_count(), 6);
        assert_eq!(cuboid.unique_edges().len(), 12);
    }

    #[test]
    fn test_cuboid_normals_outward() {
        let cuboid = ConvexPolyhedronData::cuboid(Vector3::new(1.0, 1.0, 1.0));
        for f in 0..cuboid.face_count() {
            let normal = cuboid.face_normal(f);
            assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-12);
            // Outward: a face vertex projected on the normal is extremal
            let v0 = cuboid.vertex(cuboid.face(f).vertices[0]);
            let plane = normal.dot(&v0.coords);
            for v in cuboid.vertices() {
                assert!(normal.dot(&v.coords) <= plane + 1e-12);
            }
        }
    }

    #[test]
    fn test_twin_links_consistent() {
        let cuboid = ConvexPolyhedronData::cuboid(Vector3::new(1.0, 1.0, 1.0));
        for f in 0..cuboid.face_count() {
            let face = cuboid.face(f);
            let mut edge_index = face.first_edge;
            for _ in 0..face.vertices.len() {
                let edge = cuboid.half_edge(edge_index);
                let twin = cuboid.half_edge(edge.twin);
                // Twin of my twin is me, and it borders a different face
                assert_eq!(cuboid.half_edge(twin.twin).face, f);
                assert_ne!(twin.face, f);
                edge_index = edge.next;
            }
            // The loop closes
            assert_eq!(edge_index, face.first_edge);
        }
    }

    #[test]
    fn test_open_mesh_rejected() {
        // Single quad: every edge has no twin
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let result = ConvexPolyhedronData::new(vertices, vec![vec![0, 1, 2, 3]]);
        assert!(matches!(result, Err(ShapeError::NonManifoldEdge(_, _))));
    }

    #[test]
    fn test_degenerate_face_rejected() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let result = ConvexPolyhedronData::new(vertices, vec![vec![0, 1]]);
        assert!(matches!(result, Err(ShapeError::DegenerateFace { .. })));
    }
}
