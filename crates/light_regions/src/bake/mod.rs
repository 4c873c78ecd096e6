//! Region connectivity and influence baking
//!
//! A bake samples light paths through the occluding geometry, folds the
//! region sequences into the region graph, applies the user overrides and
//! builds an influence mesh for every light.

pub mod sampler;
mod task;

pub use sampler::{distribute_points_on_sphere, fold_path, PathTracer};
pub use task::{BakeProgress, BakeReport, BakeStage, BakeStatus, BakeTask, CancelToken};

use crate::config::ConfigError;
use crate::regions::RegionError;

/// Bake errors
#[derive(thiserror::Error, Debug)]
pub enum BakeError {
    /// Settings failed validation
    #[error("Invalid bake settings: {0}")]
    Settings(#[from] ConfigError),

    /// Region setup is invalid
    #[error(transparent)]
    Region(#[from] RegionError),

    /// [`BakeTask::step`] was called after the bake ended
    #[error("Bake already finished")]
    AlreadyFinished,
}
