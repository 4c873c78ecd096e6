//! Light influence pipeline
//!
//! Icosphere generation, projection onto occluding geometry and decimation
//! under a vertex budget.

pub mod decimate;
pub mod icosphere;
mod mesh;
mod mesher;

pub use mesh::TriangleMesh;
pub use mesher::{InfluenceMesh, InfluenceMesher, MERGE_MULTIPLIER_STEP, VERTEX_BUDGET};
