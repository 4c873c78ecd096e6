//! Distance-based vertex merging
//!
//! Each vertex is merged into the first already accepted vertex closer than
//! the merge distance, or accepted itself. Triangle indices are remapped and
//! triangles that collapse are kept as they are.

use super::TriangleMesh;
use crate::foundation::math::Vec3;

/// Merge vertices closer than `base_factor * multiplier`
pub fn simplify(mesh: &TriangleMesh, base_factor: f32, multiplier: f32) -> TriangleMesh {
    let threshold = base_factor * multiplier;
    let mut vertices: Vec<Vec3> = Vec::new();

    let remap: Vec<u32> = mesh
        .vertices
        .iter()
        .map(|vertex| {
            let existing = vertices
                .iter()
                .position(|accepted| (vertex - accepted).magnitude() < threshold);
            let index = existing.unwrap_or_else(|| {
                vertices.push(*vertex);
                vertices.len() - 1
            });
            u32::try_from(index).unwrap_or(u32::MAX)
        })
        .collect();

    let indices = mesh
        .indices
        .iter()
        .map(|&index| remap[index as usize])
        .collect();

    TriangleMesh::new(vertices, indices)
}
