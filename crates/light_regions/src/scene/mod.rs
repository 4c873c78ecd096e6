//! Scene-facing boundary
//!
//! Bounding volumes plus the query ports the host engine implements. A
//! brute-force [`StaticScene`] backend is included for offline bakes.

mod bounds;
mod query;
mod static_scene;

pub use bounds::{Plane, AABB};
pub use query::{ColliderRegistry, GeometryQuery};
pub use static_scene::StaticScene;
