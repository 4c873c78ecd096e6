//! Brute-force in-memory geometry backend
//!
//! Performs linear search for all queries. Sufficient for offline bakes of
//! small scenes and for tests; engines plug their own physics in through
//! [`GeometryQuery`] instead.

use log::debug;

use super::query::{ColliderRegistry, GeometryQuery};
use crate::foundation::math::Vec3;
use crate::physics::{BoundingSphere, ColliderId, CollisionMesh, CollisionShape, LayerMask, Ray, RayHit};

#[derive(Debug, Clone)]
struct SceneCollider {
    shape: CollisionShape,
    layer: LayerMask,
}

/// List of colliders with layer filtering
#[derive(Debug, Default)]
pub struct StaticScene {
    colliders: Vec<Option<SceneCollider>>,
}

impl StaticScene {
    /// Create a new empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collider on `layer` and return its handle
    pub fn add_collider(&mut self, shape: CollisionShape, layer: LayerMask) -> ColliderId {
        let id = ColliderId(u32::try_from(self.colliders.len()).unwrap_or(u32::MAX));
        self.colliders.push(Some(SceneCollider { shape, layer }));
        id
    }

    /// Add an axis-aligned box occluder
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, layer: LayerMask) -> ColliderId {
        self.add_collider(CollisionShape::cuboid(center, half_extents), layer)
    }

    /// Number of live colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.iter().flatten().count()
    }

    /// Shape of a live collider
    pub fn shape(&self, id: ColliderId) -> Option<&CollisionShape> {
        self.colliders
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .map(|collider| &collider.shape)
    }

    fn live(&self, mask: LayerMask) -> impl Iterator<Item = (ColliderId, &SceneCollider)> {
        self.colliders.iter().enumerate().filter_map(move |(index, slot)| {
            let collider = slot.as_ref()?;
            let id = ColliderId(u32::try_from(index).ok()?);
            collider.layer.intersects(mask).then_some((id, collider))
        })
    }
}

impl GeometryQuery for StaticScene {
    fn raycast(&self, ray: &Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        let mut closest: Option<RayHit> = None;

        for (id, collider) in self.live(mask) {
            let Some((distance, point, normal)) = collider.shape.intersect_ray_detailed(ray) else {
                continue;
            };
            if distance > max_distance || closest.is_some_and(|hit| hit.distance <= distance) {
                continue;
            }
            let facing = if normal.dot(&ray.direction) > 0.0 { -normal } else { normal };
            closest = Some(RayHit {
                collider: id,
                distance,
                point,
                normal: facing,
            });
        }

        closest
    }

    fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        mask: LayerMask,
        results: &mut [Option<ColliderId>],
    ) -> usize {
        let sphere = BoundingSphere::new(center, radius);
        let mut count = 0;

        for (id, collider) in self.live(mask) {
            if count == results.len() {
                break;
            }
            if collider.shape.overlaps_sphere(&sphere) {
                results[count] = Some(id);
                count += 1;
            }
        }

        count
    }
}

impl ColliderRegistry for StaticScene {
    fn set_mesh_collider(
        &mut self,
        previous: Option<ColliderId>,
        mesh: CollisionMesh,
        layer: LayerMask,
    ) -> ColliderId {
        let collider = SceneCollider {
            shape: CollisionShape::Mesh(mesh),
            layer,
        };

        if let Some(id) = previous {
            if let Some(slot) = self.colliders.get_mut(id.0 as usize) {
                debug!("Replacing mesh collider {:?}", id);
                *slot = Some(collider);
                return id;
            }
        }

        let id = ColliderId(u32::try_from(self.colliders.len()).unwrap_or(u32::MAX));
        self.colliders.push(Some(collider));
        id
    }

    fn remove_collider(&mut self, id: ColliderId) {
        if let Some(slot) = self.colliders.get_mut(id.0 as usize) {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const GEOMETRY: LayerMask = LayerMask::from_layer(0);
    const OTHER: LayerMask = LayerMask::from_layer(5);

    #[test]
    fn test_raycast_returns_closest_hit() {
        let mut scene = StaticScene::new();
        let far = scene.add_box(Vec3::new(20.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0), GEOMETRY);
        let near = scene.add_box(Vec3::new(10.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0), GEOMETRY);

        let ray = Ray::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        let hit = scene.raycast(&ray, 100.0, GEOMETRY).expect("expected a hit");
        assert_eq!(hit.collider, near);
        assert_ne!(hit.collider, far);
        assert_relative_eq!(hit.distance, 9.0, epsilon = 1e-4);
        assert_relative_eq!(hit.normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_raycast_respects_distance_and_mask() {
        let mut scene = StaticScene::new();
        scene.add_box(Vec3::new(10.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0), OTHER);
        let ray = Ray::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));

        assert!(scene.raycast(&ray, 100.0, GEOMETRY).is_none());
        assert!(scene.raycast(&ray, 5.0, OTHER).is_none());
        assert!(scene.raycast(&ray, 100.0, OTHER).is_some());
    }

    #[test]
    fn test_overlap_truncates_to_capacity() {
        let mut scene = StaticScene::new();
        for i in 0..5 {
            scene.add_box(Vec3::new(i as f32 * 0.1, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0), GEOMETRY);
        }
        let mut results = [None; 3];
        let count = scene.overlap_sphere(Vec3::zeros(), 0.5, GEOMETRY, &mut results);
        assert_eq!(count, 3);
        assert!(results.iter().all(Option::is_some));
    }

    #[test]
    fn test_mesh_collider_replacement_keeps_id() {
        let mut scene = StaticScene::new();
        let mesh = CollisionMesh::cuboid(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let id = scene.set_mesh_collider(None, mesh.clone(), OTHER);
        let replaced = scene.set_mesh_collider(Some(id), mesh, OTHER);
        assert_eq!(id, replaced);
        assert_eq!(scene.collider_count(), 1);

        scene.remove_collider(id);
        assert_eq!(scene.collider_count(), 0);
        assert!(scene.shape(id).is_none());
    }
}
