//! Physics primitives backing the geometry queries
//!
//! Rays, triangles, meshes and layer masks shared by the bake (ray casts)
//! and the shadow gate (sphere overlaps).

pub mod collision;
pub mod collision_layers;

pub use collision::{BoundingSphere, ColliderId, CollisionMesh, CollisionShape, Ray, RayHit, Triangle};
pub use collision_layers::LayerMask;
