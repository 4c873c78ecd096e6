//! RON scene descriptions
//!
//! A scene file lists one region manager with its regions, managed objects,
//! box occluders and override pairs. Override pairs name regions by handle.

use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use light_regions::prelude::*;
use light_regions::regions::Region;

/// Axis-aligned box on the occlusion layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccluderDesc {
    /// Box center
    pub center: Vec3,
    /// Half size along each axis
    pub half_extents: Vec3,
}

/// Override pairs applied before baking
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideDesc {
    /// Region pairs that must stay connected
    pub positive: Vec<(SceneHandle, SceneHandle)>,
    /// Region pairs that must stay disconnected
    pub negative: Vec<(SceneHandle, SceneHandle)>,
}

/// Everything the baker needs about one manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    /// Manager display name
    pub name: String,
    /// Volume covered by the manager
    pub bounds: ManagerBounds,
    /// Regions to gather
    pub regions: Vec<RegionDesc>,
    /// Objects and lights to bind
    #[serde(default)]
    pub objects: Vec<ManagedObjectDesc>,
    /// Occluding geometry
    #[serde(default)]
    pub occluders: Vec<OccluderDesc>,
    /// Connectivity overrides
    #[serde(default)]
    pub overrides: OverrideDesc,
}

impl SceneFile {
    /// Read and parse a scene file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene {}", path.display()))?;
        ron::from_str(&contents).with_context(|| format!("Failed to parse scene {}", path.display()))
    }

    /// Gather the manager and build the occluder geometry
    pub fn build(&self, settings: &LightRegionsSettings) -> Result<(RegionManager, StaticScene)> {
        let mut manager = RegionManager::new(self.name.clone(), self.bounds.clone());
        manager.gather_regions(&self.regions);
        manager.gather_managed_objects(&self.objects);

        for (a, b) in &self.overrides.positive {
            if let Some((a, b)) = resolve_pair(&manager, *a, *b) {
                manager.graph_mut().add_positive_override(a, b)?;
            }
        }
        for (a, b) in &self.overrides.negative {
            if let Some((a, b)) = resolve_pair(&manager, *a, *b) {
                manager.graph_mut().add_negative_override(a, b)?;
            }
        }

        let mut scene = StaticScene::new();
        for occluder in &self.occluders {
            scene.add_box(occluder.center, occluder.half_extents, settings.occlusion_mask);
        }
        Ok((manager, scene))
    }
}

fn resolve_pair(manager: &RegionManager, a: SceneHandle, b: SceneHandle) -> Option<(RegionId, RegionId)> {
    let find = |handle: SceneHandle| {
        let id = manager.regions().find(|r| r.handle() == handle).map(Region::id);
        if id.is_none() {
            warn!("Override names unknown region {:?}", handle);
        }
        id
    };
    Some((find(a)?, find(b)?))
}
