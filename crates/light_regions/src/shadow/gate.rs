//! Per-frame shadow render gate

use std::collections::HashSet;

use crate::regions::{ObjectId, Region, RegionManager};

use super::ShadowRenderer;

/// Lets each light request at most one shadow render per frame
#[derive(Debug, Default)]
pub struct ShadowCastGate {
    rendered: HashSet<ObjectId>,
}

impl ShadowCastGate {
    /// Create a gate with no light rendered yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the per-light guards
    pub fn begin_frame(&mut self) {
        self.rendered.clear();
    }

    /// Whether `light` already rendered this frame
    pub fn has_rendered(&self, light: ObjectId) -> bool {
        self.rendered.contains(&light)
    }

    /// Request a shadow render for `light`
    ///
    /// Nothing happens when the light already rendered this frame or its
    /// region is inactive. Returns whether a render was requested.
    pub fn request<R: ShadowRenderer + ?Sized>(
        &mut self,
        manager: &RegionManager,
        light: ObjectId,
        renderer: &mut R,
    ) -> bool {
        if self.rendered.contains(&light) {
            return false;
        }
        let Some(object) = manager.object(light) else {
            return false;
        };
        if !manager.graph().get(object.region()).is_some_and(Region::is_active) {
            return false;
        }

        self.rendered.insert(light);
        renderer.request_shadow_map(object);
        true
    }
}
