//! Geometry query ports
//!
//! The bake and the shadow gate never own scene geometry. They talk to the
//! host engine through these traits: a ray query for occlusion, a sphere
//! overlap for influence gating, and a registry that receives the baked
//! influence meshes as colliders.

use crate::foundation::math::Vec3;
use crate::physics::{ColliderId, CollisionMesh, LayerMask, Ray, RayHit};

/// Ray and overlap queries against the host's colliders
pub trait GeometryQuery {
    /// Closest hit along `ray` within `max_distance`, restricted to `mask`
    ///
    /// The returned normal faces back towards the ray origin.
    fn raycast(&self, ray: &Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit>;

    /// Colliders on `mask` touching the sphere, written into `results`
    ///
    /// Returns how many slots were filled. Overlaps beyond `results.len()`
    /// are dropped.
    fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        mask: LayerMask,
        results: &mut [Option<ColliderId>],
    ) -> usize;
}

/// Receives baked proxy meshes as colliders
pub trait ColliderRegistry {
    /// Install `mesh` on `layer`, replacing `previous` if the light had one
    fn set_mesh_collider(
        &mut self,
        previous: Option<ColliderId>,
        mesh: CollisionMesh,
        layer: LayerMask,
    ) -> ColliderId;

    /// Drop a collider; unknown ids are ignored
    fn remove_collider(&mut self, id: ColliderId);
}
