//! # Light Regions
//!
//! Baked visibility regions and light influence meshes for runtime culling.
//!
//! ## Features
//!
//! - **Region baking**: multi-bounce ray sampling builds a symmetric region
//!   connectivity graph, with user overrides applied on top
//! - **Active-set propagation**: entering a region enables it and its
//!   neighbours and disables everything else, touching only what changed
//! - **Influence meshes**: per-light icosphere projections decimated under a
//!   vertex budget, used as colliders on an influence layer
//! - **Shadow gating**: one-shot shadow maps re-render only when a tracked
//!   caster moves inside a light's influence
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use light_regions::prelude::*;
//!
//! fn bake(manager: &mut RegionManager, scene: &mut StaticScene) -> Result<(), BakeError> {
//!     let settings = LightRegionsSettings::default();
//!     let report = BakeTask::start(manager, &settings)?.run(manager, scene)?;
//!     println!("{} edges", report.edges);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod bake;
pub mod config;
pub mod events;
pub mod foundation;
pub mod influence;
pub mod physics;
pub mod regions;
pub mod scene;
pub mod shadow;
pub mod world;

#[cfg(test)]
mod tests;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        bake::{BakeError, BakeProgress, BakeReport, BakeStatus, BakeTask, CancelToken},
        config::{BakeTargets, Config, ConfigError, LightRegionsSettings},
        events::{ManagerId, RegionEvent, RegionEventHandler, RegionEventType},
        foundation::math::{Quat, Transform, Vec3},
        influence::{InfluenceMesh, InfluenceMesher},
        physics::{ColliderId, LayerMask},
        regions::{
            ManagedKind, ManagedObjectDesc, ManagerBounds, ObjectId, RegionDesc, RegionError, RegionId,
            RegionManager, SceneHandle,
        },
        scene::{ColliderRegistry, GeometryQuery, StaticScene},
        shadow::{CaptureTracker, ShadowRenderer, ShadowUpdateScheduler},
        world::RegionWorld,
    };
}
