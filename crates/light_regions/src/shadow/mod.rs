//! Shadow update gating
//!
//! Lights with one-shot shadow maps only re-render when a tracked shadow
//! caster moves inside their baked influence mesh.

mod gate;
mod scheduler;
mod tracker;

pub use gate::ShadowCastGate;
pub use scheduler::ShadowUpdateScheduler;
pub use tracker::{CaptureTracker, CAPTURE_BUFFER_SIZE, DEFAULT_CAPTURE_RADIUS};

use crate::regions::ManagedObject;

/// Host hook that renders a light's shadow map once
pub trait ShadowRenderer {
    /// Render the shadow map of `light` on the next opportunity
    fn request_shadow_map(&mut self, light: &ManagedObject);
}
