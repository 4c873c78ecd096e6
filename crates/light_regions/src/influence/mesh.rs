//! Indexed triangle mesh used throughout the influence pipeline

use crate::foundation::math::Vec3;
use crate::physics::CollisionMesh;
use crate::scene::AABB;

/// Indexed triangle list in a light's local frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions
    pub vertices: Vec<Vec3>,
    /// Triangle list, three indices per triangle
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    /// Create a mesh from raw vertex and index data
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Area-weighted vertex normals
    ///
    /// Vertices touched only by degenerate triangles get a zero normal.
    pub fn compute_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::zeros(); self.vertices.len()];
        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            let (Some(va), Some(vb), Some(vc)) =
                (self.vertices.get(a), self.vertices.get(b), self.vertices.get(c))
            else {
                continue;
            };
            let face = (vb - va).cross(&(vc - va));
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        normals
            .into_iter()
            .map(|normal| normal.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros))
            .collect()
    }

    /// Bounds of all vertices; `None` for an empty mesh
    pub fn compute_bounds(&self) -> Option<AABB> {
        AABB::from_points(&self.vertices)
    }

    /// World-space collider for this mesh placed at `origin`
    pub fn to_collision_mesh(&self, origin: Vec3) -> CollisionMesh {
        CollisionMesh::from_vertices(&self.vertices, &self.indices, origin, 1.0)
    }
}
