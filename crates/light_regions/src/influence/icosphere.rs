//! Icosphere generation
//!
//! Starts from a regular icosahedron on the unit sphere and splits every
//! triangle into four per round. Each round quadruples the triangle count:
//! `20 * 4^k` triangles and `10 * 4^k + 2` vertices after `k` rounds.

use std::collections::HashMap;

use super::TriangleMesh;
use crate::foundation::math::{constants::GOLDEN_RATIO, Vec3};

const ICOSAHEDRON_TRIANGLES: [u32; 60] = [
    0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, //
    1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7, 1, 8, //
    3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, //
    4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9, 8, 1,
];

/// Regular icosahedron with unit-length vertices
pub fn icosahedron() -> TriangleMesh {
    let t = GOLDEN_RATIO;
    let vertices = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
    .iter()
    .map(Vec3::normalize)
    .collect();

    TriangleMesh::new(vertices, ICOSAHEDRON_TRIANGLES.to_vec())
}

/// Split every triangle into four, pushing new vertices onto the unit sphere
pub fn subdivide(mesh: &mut TriangleMesh) {
    let mut midpoints: HashMap<u64, u32> = HashMap::new();
    let mut indices = Vec::with_capacity(mesh.indices.len() * 4);

    for triangle in mesh.indices.chunks_exact(3) {
        let (v1, v2, v3) = (triangle[0], triangle[1], triangle[2]);
        let a = midpoint(&mut mesh.vertices, &mut midpoints, v1, v2);
        let b = midpoint(&mut mesh.vertices, &mut midpoints, v2, v3);
        let c = midpoint(&mut mesh.vertices, &mut midpoints, v3, v1);

        indices.extend_from_slice(&[v1, a, c, v2, b, a, v3, c, b, a, b, c]);
    }

    mesh.indices = indices;
}

/// Icosahedron after `subdivisions` rounds of [`subdivide`]
pub fn icosphere(subdivisions: u32) -> TriangleMesh {
    let mut mesh = icosahedron();
    for _ in 0..subdivisions {
        subdivide(&mut mesh);
    }
    mesh
}

fn midpoint(vertices: &mut Vec<Vec3>, cache: &mut HashMap<u64, u32>, p1: u32, p2: u32) -> u32 {
    let key = (u64::from(p1.min(p2)) << 32) + u64::from(p1.max(p2));
    if let Some(&index) = cache.get(&key) {
        return index;
    }

    let middle = (vertices[p1 as usize] + vertices[p2 as usize]).normalize();
    let index = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
    vertices.push(middle);
    cache.insert(key, index);
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_icosphere_topology() {
        for k in 0..4u32 {
            let sphere = icosphere(k);
            assert_eq!(sphere.triangle_count(), 20 * 4usize.pow(k));
            assert_eq!(sphere.vertex_count(), 10 * 4usize.pow(k) + 2);
        }
    }

    #[test]
    fn test_vertices_on_unit_sphere() {
        let sphere = icosphere(2);
        for vertex in &sphere.vertices {
            assert_relative_eq!(vertex.magnitude(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_winding_faces_outward() {
        let sphere = icosphere(1);
        for triangle in sphere.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| sphere.vertices[i as usize]);
            let normal = (b - a).cross(&(c - a));
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(&centroid) > 0.0);
        }
    }
}
