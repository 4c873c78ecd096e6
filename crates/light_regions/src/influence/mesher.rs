//! Light influence meshes
//!
//! A light's influence is approximated by a unit icosphere whose vertices are
//! pushed out along their direction until they hit occluding geometry or the
//! light's range. The projected sphere is then decimated until it fits the
//! vertex budget, coarsening the sphere when merging alone is not enough.

use log::{debug, warn};

use super::decimate::simplify;
use super::icosphere::icosphere;
use super::TriangleMesh;
use crate::config::LightRegionsSettings;
use crate::foundation::math::Vec3;
use crate::physics::{CollisionMesh, LayerMask, Ray};
use crate::scene::{GeometryQuery, AABB};

/// Accepted meshes have fewer vertices than this
pub const VERTEX_BUDGET: usize = 128;

/// Merge distance multiplier added per attempt
pub const MERGE_MULTIPLIER_STEP: f32 = 0.8;

const ATTEMPTS: u32 = 4;

/// Baked influence volume of one light
#[derive(Debug, Clone)]
pub struct InfluenceMesh {
    mesh: TriangleMesh,
    normals: Vec<Vec3>,
    bounds: AABB,
    origin: Vec3,
    subdivisions: u32,
    within_budget: bool,
}

impl InfluenceMesh {
    fn finalize(mesh: TriangleMesh, origin: Vec3, subdivisions: u32, within_budget: bool) -> Self {
        let normals = mesh.compute_normals();
        let bounds = mesh
            .compute_bounds()
            .unwrap_or_else(|| AABB::new(Vec3::zeros(), Vec3::zeros()));
        Self {
            mesh,
            normals,
            bounds,
            origin,
            subdivisions,
            within_budget,
        }
    }

    /// Vertex positions relative to the light's offset point
    pub fn vertices(&self) -> &[Vec3] {
        &self.mesh.vertices
    }

    /// Triangle list
    pub fn indices(&self) -> &[u32] {
        &self.mesh.indices
    }

    /// Per-vertex normals
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Local bounds of the vertices
    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    /// World-space point the mesh is centered on
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Icosphere subdivision level of the accepted attempt
    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    /// Whether the vertex budget was met
    pub fn within_budget(&self) -> bool {
        self.within_budget
    }

    /// Underlying triangle mesh
    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    /// World-space collider for the influence layer
    pub fn collision_mesh(&self) -> CollisionMesh {
        self.mesh.to_collision_mesh(self.origin)
    }
}

/// Builds influence meshes against a geometry backend
pub struct InfluenceMesher<'a, G: GeometryQuery> {
    geometry: &'a G,
    occlusion_mask: LayerMask,
    decimation_factor: f32,
}

impl<'a, G: GeometryQuery> InfluenceMesher<'a, G> {
    /// Create a mesher using the occlusion mask and decimation factor from `settings`
    pub fn new(geometry: &'a G, settings: &LightRegionsSettings) -> Self {
        Self {
            geometry,
            occlusion_mask: settings.occlusion_mask,
            decimation_factor: settings.influence_mesh_decimation_factor,
        }
    }

    /// Icosphere at `subdivisions` projected from `origin` out to `range`
    pub fn project(&self, origin: Vec3, range: f32, subdivisions: u32) -> TriangleMesh {
        let mut mesh = icosphere(subdivisions);
        for vertex in &mut mesh.vertices {
            let ray = Ray::new(origin, *vertex);
            *vertex = match self.geometry.raycast(&ray, range, self.occlusion_mask) {
                Some(hit) => hit.point - origin,
                None => *vertex * range,
            };
        }
        mesh
    }

    /// Bake the influence mesh of a light at `origin`
    ///
    /// Tries up to four times: twice at the requested subdivision level, then
    /// one level coarser each time, with the merge distance growing by
    /// [`MERGE_MULTIPLIER_STEP`] per attempt. The first result under
    /// [`VERTEX_BUDGET`] wins; otherwise the last attempt is kept.
    pub fn generate(&self, origin: Vec3, range: f32, subdivisions: u32) -> InfluenceMesh {
        let mut level = subdivisions;
        let mut projected: Option<(u32, TriangleMesh)> = None;
        let mut last = TriangleMesh::default();

        for attempt in 0..ATTEMPTS {
            if attempt >= 2 && level > 0 {
                level -= 1;
            }
            let source = match projected.take() {
                Some((cached_level, mesh)) if cached_level == level => mesh,
                _ => self.project(origin, range, level),
            };

            let multiplier = 1.0 + attempt as f32 * MERGE_MULTIPLIER_STEP;
            let simplified = simplify(&source, self.decimation_factor, multiplier);
            debug!(
                "Influence attempt {}: level {}, x{:.1} merge, {} -> {} vertices",
                attempt,
                level,
                multiplier,
                source.vertex_count(),
                simplified.vertex_count()
            );

            if simplified.vertex_count() < VERTEX_BUDGET {
                return InfluenceMesh::finalize(simplified, origin, level, true);
            }
            projected = Some((level, source));
            last = simplified;
        }

        warn!(
            "Couldn't simplify the influence mesh enough. Expected a vertex count under {} but only achieved {}",
            VERTEX_BUDGET,
            last.vertex_count()
        );
        InfluenceMesh::finalize(last, origin, level, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::StaticScene;
    use approx::assert_relative_eq;

    const GEOMETRY: LayerMask = LayerMask::from_layer(0);

    #[test]
    fn test_empty_scene_reaches_full_range() {
        let scene = StaticScene::new();
        let settings = LightRegionsSettings::default();
        let mesher = InfluenceMesher::new(&scene, &settings);
        let origin = Vec3::new(3.0, 4.0, 5.0);
        let influence = mesher.generate(origin, 10.0, 3);

        assert!(influence.within_budget());
        assert!(influence.vertices().len() < VERTEX_BUDGET);
        for vertex in influence.vertices() {
            assert_relative_eq!(vertex.magnitude(), 10.0, epsilon = 1e-3);
        }
        assert_eq!(influence.normals().len(), influence.vertices().len());
        assert_relative_eq!(influence.origin(), origin);
    }

    #[test]
    fn test_projection_stops_at_occluder() {
        let mut scene = StaticScene::new();
        scene.add_box(Vec3::new(4.0, 0.0, 0.0), Vec3::new(1.0, 50.0, 50.0), GEOMETRY);
        let settings = LightRegionsSettings::default();
        let mesher = InfluenceMesher::new(&scene, &settings);

        let projected = mesher.project(Vec3::zeros(), 10.0, 2);
        let sphere = icosphere(2);
        for (vertex, direction) in projected.vertices.iter().zip(&sphere.vertices) {
            if direction.x > 0.5 {
                // Blocked by the wall face at x = 3
                assert_relative_eq!(vertex.x, 3.0, epsilon = 1e-3);
            } else if direction.x < 0.0 {
                assert_relative_eq!(vertex.magnitude(), 10.0, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_budget_shortfall_keeps_last_attempt() {
        let scene = StaticScene::new();
        let settings = LightRegionsSettings {
            influence_mesh_decimation_factor: 0.0,
            ..LightRegionsSettings::default()
        };
        let mesher = InfluenceMesher::new(&scene, &settings);
        // Levels 4, 4, 3, 2 with nothing merged
        let influence = mesher.generate(Vec3::zeros(), 10.0, 4);

        assert!(!influence.within_budget());
        assert_eq!(influence.subdivisions(), 2);
        assert_eq!(influence.vertices().len(), 162);
    }

    #[test]
    fn test_zero_subdivisions_never_goes_negative() {
        let scene = StaticScene::new();
        let settings = LightRegionsSettings::default();
        let mesher = InfluenceMesher::new(&scene, &settings);
        let influence = mesher.generate(Vec3::zeros(), 1.0, 0);
        assert_eq!(influence.subdivisions(), 0);
        assert_eq!(influence.mesh().triangle_count(), 20);
    }
}
