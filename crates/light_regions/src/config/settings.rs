//! Bake and runtime settings shared by every region manager

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::physics::LayerMask;

bitflags! {
    /// Which bake stages run when a bake is triggered
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BakeTargets: u8 {
        /// Region-to-region visibility graph
        const OCCLUSION = 1 << 0;
        /// Per-light influence meshes
        const INFLUENCE = 1 << 1;
    }
}

impl Default for BakeTargets {
    fn default() -> Self {
        Self::all()
    }
}

/// Settings for baking region connectivity and light influence meshes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightRegionsSettings {
    /// Layer index used by region volumes
    pub region_layer: u8,
    /// Layer index used by light influence colliders
    pub light_influence_layer: u8,
    /// Geometry layers that block visibility rays and influence projection
    pub occlusion_mask: LayerMask,

    /// Sampled directions per light
    pub rays_per_light: u32,
    /// Bounces traced per sampled direction
    pub bounces_per_ray: u32,
    /// How far a ray that escapes all geometry is followed
    pub max_ray_length: f32,
    /// Maximum random scatter applied at each bounce, in degrees
    pub ray_diffusion: f32,
    /// Also trace from every region's center at half resolution
    pub test_all_regions: bool,

    /// Base merge distance of the influence mesh decimator
    pub influence_mesh_decimation_factor: f32,
    /// Icosphere subdivisions used for influence projection
    pub influence_mesh_projection_subdivisions: u32,

    /// Stages run by a bake
    pub bake_targets: BakeTargets,
    /// Seed for the bounce scatter; a fresh seed is drawn when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for LightRegionsSettings {
    fn default() -> Self {
        Self {
            region_layer: 8,
            light_influence_layer: 9,
            occlusion_mask: LayerMask::from_layer(0),
            rays_per_light: 1024,
            bounces_per_ray: 3,
            max_ray_length: 400.0,
            ray_diffusion: 2.0,
            test_all_regions: true,
            influence_mesh_decimation_factor: 0.8,
            influence_mesh_projection_subdivisions: 3,
            bake_targets: BakeTargets::default(),
            seed: None,
        }
    }
}

impl Config for LightRegionsSettings {}

impl LightRegionsSettings {
    /// Mask selecting only the light influence layer
    pub fn influence_mask(&self) -> LayerMask {
        LayerMask::from_layer(self.light_influence_layer)
    }

    /// Check that every value is usable by the bake
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rays_per_light == 0 {
            return Err(ConfigError::Invalid {
                field: "rays_per_light",
                reason: "at least one ray per light is required".to_string(),
            });
        }
        if self.bounces_per_ray == 0 {
            return Err(ConfigError::Invalid {
                field: "bounces_per_ray",
                reason: "at least one bounce is required".to_string(),
            });
        }
        if !(self.max_ray_length > 0.0) {
            return Err(ConfigError::Invalid {
                field: "max_ray_length",
                reason: format!("must be positive, got {}", self.max_ray_length),
            });
        }
        if !(self.ray_diffusion >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "ray_diffusion",
                reason: format!("must not be negative, got {}", self.ray_diffusion),
            });
        }
        if !(self.influence_mesh_decimation_factor >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "influence_mesh_decimation_factor",
                reason: format!(
                    "must not be negative, got {}",
                    self.influence_mesh_decimation_factor
                ),
            });
        }
        if self.region_layer > 31 || self.light_influence_layer > 31 {
            return Err(ConfigError::Invalid {
                field: "region_layer",
                reason: "layer indices must be below 32".to_string(),
            });
        }
        if self.region_layer == self.light_influence_layer {
            return Err(ConfigError::Invalid {
                field: "light_influence_layer",
                reason: "regions and influence meshes need dedicated layers".to_string(),
            });
        }
        Ok(())
    }
}
