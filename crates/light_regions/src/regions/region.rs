//! Region volumes
//!
//! A region is a convex cell made of one or more boxes placed by the
//! region's transform. Containment uses the world-space bounds of each box.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ObjectId;
use crate::foundation::math::{Transform, Vec3};
use crate::scene::AABB;

/// Index of a region inside its manager, stable only within one gather
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub usize);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable handle the host uses for one of its scene entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneHandle(pub u64);

/// Box volume in the region's local space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBox {
    /// Local center of the box
    pub center: Vec3,
    /// Full edge lengths of the box
    pub size: Vec3,
}

impl RegionBox {
    /// Create a box from local center and full size
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    /// The eight local-space corners
    pub fn corners(&self) -> [Vec3; 8] {
        let h = self.size * 0.5;
        let c = self.center;
        [
            c + Vec3::new(-h.x, -h.y, -h.z),
            c + Vec3::new(h.x, -h.y, -h.z),
            c + Vec3::new(h.x, -h.y, h.z),
            c + Vec3::new(-h.x, -h.y, h.z),
            c + Vec3::new(-h.x, h.y, -h.z),
            c + Vec3::new(h.x, h.y, -h.z),
            c + Vec3::new(h.x, h.y, h.z),
            c + Vec3::new(-h.x, h.y, h.z),
        ]
    }
}

/// Host-side description of a region handed to a gather
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionDesc {
    /// Stable handle of the region entity
    pub handle: SceneHandle,
    /// Display name used in log messages
    #[serde(default)]
    pub name: String,
    /// Placement of the region
    #[serde(default)]
    pub transform: Transform,
    /// Box volumes making up the region
    pub boxes: Vec<RegionBox>,
}

/// A gathered region with its relations and bound objects
#[derive(Debug, Clone)]
pub struct Region {
    id: RegionId,
    handle: SceneHandle,
    name: String,
    transform: Transform,
    boxes: Vec<RegionBox>,
    world_bounds: Vec<AABB>,

    pub(crate) objects: Vec<ObjectId>,
    pub(crate) lights: Vec<ObjectId>,
    pub(crate) active: bool,

    pub(crate) connected: Vec<RegionId>,
    pub(crate) positive_overrides: Vec<RegionId>,
    pub(crate) negative_overrides: Vec<RegionId>,
}

impl Region {
    /// Build a region from its description
    pub fn new(id: RegionId, desc: &RegionDesc) -> Self {
        let world_bounds = desc
            .boxes
            .iter()
            .filter_map(|b| {
                let corners = b.corners().map(|corner| desc.transform.transform_point(corner));
                AABB::from_points(&corners)
            })
            .collect();

        Self {
            id,
            handle: desc.handle,
            name: desc.name.clone(),
            transform: desc.transform,
            boxes: desc.boxes.clone(),
            world_bounds,
            objects: Vec::new(),
            lights: Vec::new(),
            active: true,
            connected: Vec::new(),
            positive_overrides: Vec::new(),
            negative_overrides: Vec::new(),
        }
    }

    /// Index of this region in its manager
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Host handle this region was gathered from
    pub fn handle(&self) -> SceneHandle {
        self.handle
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placement of the region
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// World-space origin of the region, used as its center for tracing
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Local box volumes
    pub fn boxes(&self) -> &[RegionBox] {
        &self.boxes
    }

    /// World-space bounds of every box, in box order
    pub fn world_bounds(&self) -> &[AABB] {
        &self.world_bounds
    }

    /// Whether any box's world bounds contain `point`
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.world_bounds.iter().any(|bounds| bounds.contains_point(point))
    }

    /// World-space corners of every box
    pub fn corners(&self) -> Vec<Vec3> {
        self.boxes
            .iter()
            .flat_map(|b| b.corners())
            .map(|corner| self.transform.transform_point(corner))
            .collect()
    }

    /// Whether the region is currently enabled
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Non-light objects bound to this region
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    /// Lights bound to this region
    pub fn lights(&self) -> &[ObjectId] {
        &self.lights
    }

    /// Regions sampled (or forced) visible from this one
    pub fn connected_regions(&self) -> &[RegionId] {
        &self.connected
    }

    /// Regions always connected to this one
    pub fn positive_overrides(&self) -> &[RegionId] {
        &self.positive_overrides
    }

    /// Regions never connected to this one
    pub fn negative_overrides(&self) -> &[RegionId] {
        &self.negative_overrides
    }

    /// Whether `other` is reachable in one step; a region always reaches itself
    pub fn is_connected_to(&self, other: RegionId) -> bool {
        other == self.id || self.connected.contains(&other)
    }
}
