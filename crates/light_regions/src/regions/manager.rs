//! Region manager
//!
//! Owns one region arena and the objects bound to it. Handles gathering from
//! host descriptors, bounds validation, point lookups and the active set.

use std::collections::HashMap;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use super::{
    ManagedKind, ManagedObject, ManagedObjectDesc, ObjectId, Region, RegionDesc, RegionError,
    RegionGraph, RegionId, SceneHandle,
};
use crate::foundation::math::Vec3;
use crate::physics::ColliderId;
use crate::scene::{Plane, AABB};

/// Volume a manager is responsible for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ManagerBounds {
    /// World-space box, boundary inclusive
    Box(AABB),
    /// Sphere, strictly inside
    Sphere {
        /// Sphere center
        center: Vec3,
        /// Sphere radius
        radius: f32,
    },
    /// Convex volume given by outward-facing planes
    Custom(Vec<Plane>),
}

impl ManagerBounds {
    /// Whether `point` lies inside the volume
    pub fn contains(&self, point: Vec3) -> bool {
        match self {
            Self::Box(bounds) => bounds.contains_point(point),
            Self::Sphere { center, radius } => (point - center).magnitude() < *radius,
            Self::Custom(planes) => planes.iter().all(|plane| plane.distance_to_point(point) <= 0.0),
        }
    }
}

/// Regions toggled by one [`RegionManager::set_active_region`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSetChange {
    /// Regions switched on, in order
    pub enabled: Vec<RegionId>,
    /// Regions switched off, in order
    pub disabled: Vec<RegionId>,
}

/// Outcome of [`RegionManager::gather_managed_objects`]
#[derive(Debug, Clone, Default)]
pub struct ObjectGather {
    /// Entities bound to a region
    pub bound: usize,
    /// Entities outside every region
    pub unbound: usize,
    /// Lights among the bound entities
    pub lights: usize,
    /// Influence colliders whose light disappeared; the host should remove them
    pub released_colliders: Vec<ColliderId>,
}

/// Owner of a region arena and its managed objects
#[derive(Debug, Clone)]
pub struct RegionManager {
    name: String,
    bounds: ManagerBounds,
    graph: RegionGraph,
    objects: Vec<ManagedObject>,
    active_region: Option<RegionId>,
    active_set: Vec<RegionId>,

    /// Observers entering regions of this manager drive the active set
    pub occlusion_active: bool,
    /// Capture points consult this manager's influence meshes
    pub influence_active: bool,
}

impl RegionManager {
    /// Create an empty manager covering `bounds`
    pub fn new(name: impl Into<String>, bounds: ManagerBounds) -> Self {
        Self {
            name: name.into(),
            bounds,
            graph: RegionGraph::new(),
            objects: Vec::new(),
            active_region: None,
            active_set: Vec::new(),
            occlusion_active: true,
            influence_active: true,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Volume covered by this manager
    pub fn bounds(&self) -> &ManagerBounds {
        &self.bounds
    }

    /// Whether `point` is inside this manager's volume
    pub fn check_bounds(&self, point: Vec3) -> bool {
        self.bounds.contains(point)
    }

    /// Region connectivity
    pub fn graph(&self) -> &RegionGraph {
        &self.graph
    }

    /// Mutable region connectivity, for connect/disconnect and override edits
    pub fn graph_mut(&mut self) -> &mut RegionGraph {
        &mut self.graph
    }

    /// Number of regions
    pub fn region_count(&self) -> usize {
        self.graph.len()
    }

    /// All regions in id order
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.graph.iter()
    }

    /// Region by id; out-of-range ids are logged
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        let region = self.graph.get(id);
        if region.is_none() {
            error!(
                "Region {} does not exist in manager '{}' ({} regions)",
                id,
                self.name,
                self.graph.len()
            );
        }
        region
    }

    /// First region whose box bounds contain `point`
    pub fn region_id_at(&self, point: Vec3) -> Option<RegionId> {
        self.graph
            .iter()
            .find(|region| region.contains_point(point))
            .map(Region::id)
    }

    /// Region containing `point`
    pub fn region_at(&self, point: Vec3) -> Option<&Region> {
        self.region_id_at(point).and_then(|id| self.graph.get(id))
    }

    /// Managed object by id
    pub fn object(&self, id: ObjectId) -> Option<&ManagedObject> {
        self.objects.get(id.0)
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Option<&mut ManagedObject> {
        self.objects.get_mut(id.0)
    }

    /// All managed objects in id order
    pub fn objects(&self) -> impl Iterator<Item = &ManagedObject> {
        self.objects.iter()
    }

    /// Every light bound to a region, in region then binding order
    pub fn light_ids(&self) -> Vec<ObjectId> {
        self.graph
            .iter()
            .flat_map(|region| region.lights().iter().copied())
            .collect()
    }

    /// Object whose influence collider is `collider`
    pub fn object_by_collider(&self, collider: ColliderId) -> Option<&ManagedObject> {
        self.objects.iter().find(|object| object.collider == Some(collider))
    }

    /// Region the observer last activated
    pub fn active_region(&self) -> Option<RegionId> {
        self.active_region
    }

    /// Currently enabled regions, in activation order
    pub fn active_set(&self) -> &[RegionId] {
        &self.active_set
    }

    /// Rebuild the region arena from host descriptors
    ///
    /// Only regions whose position lies inside the manager's bounds are kept.
    /// Ids are reassigned in descriptor order. Regions seen before (same
    /// handle) keep their connectivity and overrides; references to regions
    /// that disappeared are pruned. Object bindings and the active set are
    /// reset, so gather objects again afterwards.
    pub fn gather_regions(&mut self, descs: &[RegionDesc]) -> usize {
        let previous = self.graph.take_regions();
        let old_handles: Vec<SceneHandle> = previous.iter().map(Region::handle).collect();
        let mut old_by_handle: HashMap<SceneHandle, Region> =
            previous.into_iter().map(|region| (region.handle(), region)).collect();

        let mut regions: Vec<Region> = Vec::with_capacity(descs.len());
        let mut new_by_handle: HashMap<SceneHandle, RegionId> = HashMap::new();
        for desc in descs {
            if !self.check_bounds(desc.transform.position) {
                debug!("Region '{}' lies outside manager '{}'", desc.name, self.name);
                continue;
            }
            if new_by_handle.contains_key(&desc.handle) {
                warn!("Duplicate region handle {:?} ('{}') skipped", desc.handle, desc.name);
                continue;
            }

            let id = RegionId(regions.len());
            let mut region = Region::new(id, desc);
            if let Some(old) = old_by_handle.remove(&desc.handle) {
                region.connected = old.connected;
                region.positive_overrides = old.positive_overrides;
                region.negative_overrides = old.negative_overrides;
            }
            new_by_handle.insert(desc.handle, id);
            regions.push(region);
        }

        let remap = |ids: &mut Vec<RegionId>| {
            *ids = ids
                .iter()
                .filter_map(|old| old_handles.get(old.0))
                .filter_map(|handle| new_by_handle.get(handle).copied())
                .collect();
        };
        for region in &mut regions {
            remap(&mut region.connected);
            remap(&mut region.positive_overrides);
            remap(&mut region.negative_overrides);
        }

        self.graph = RegionGraph::from_regions(regions);
        self.graph.reconcile();
        self.objects.clear();
        self.deactivate_all();

        info!("Manager '{}' gathered {} regions", self.name, self.graph.len());
        self.graph.len()
    }

    /// Bind host entities to the region containing their offset point
    ///
    /// Lights keep their influence collider across re-gathers when the handle
    /// is unchanged; the baked mesh itself is dropped and must be re-baked.
    pub fn gather_managed_objects(&mut self, descs: &[ManagedObjectDesc]) -> ObjectGather {
        let mut previous_colliders: HashMap<SceneHandle, ColliderId> = self
            .objects
            .iter()
            .filter_map(|object| object.collider.map(|collider| (object.handle(), collider)))
            .collect();

        for region in self.graph.iter_mut() {
            region.objects.clear();
            region.lights.clear();
        }
        self.objects.clear();

        let mut gather = ObjectGather::default();
        for desc in descs {
            let probe = ManagedObject::new(ObjectId(self.objects.len()), desc, RegionId(0));
            let Some(region_id) = self.region_id_at(probe.offset_point()) else {
                debug!("'{}' is outside every region of '{}'", desc.name, self.name);
                gather.unbound += 1;
                continue;
            };

            let mut object = ManagedObject::new(probe.id(), desc, region_id);
            let Some(region) = self.graph.get_mut(region_id) else {
                continue;
            };
            object.active = region.active;
            match desc.kind {
                ManagedKind::Object => region.objects.push(object.id()),
                ManagedKind::Light(source) => {
                    if source.is_none() {
                        warn!(
                            "There is no light data on '{}'; its influence cannot be baked",
                            desc.name
                        );
                    }
                    object.collider = previous_colliders.remove(&desc.handle);
                    region.lights.push(object.id());
                    gather.lights += 1;
                }
            }
            self.objects.push(object);
            gather.bound += 1;
        }

        gather.released_colliders = previous_colliders.into_values().collect();
        gather.released_colliders.sort();
        info!(
            "Manager '{}' bound {} objects ({} lights), {} outside all regions",
            self.name, gather.bound, gather.lights, gather.unbound
        );
        gather
    }

    /// Check that every corner of every region lies inside the manager
    pub fn validate_region_bounds(&self) -> Result<(), RegionError> {
        for region in self.graph.iter() {
            if region.corners().into_iter().any(|corner| !self.check_bounds(corner)) {
                error!(
                    "Region '{}' is out of bounds. Either expand the manager's bounds or shrink the region",
                    region.name()
                );
                return Err(RegionError::OutOfBounds {
                    name: region.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Enable or disable a region and everything bound to it
    pub fn set_region_state(&mut self, id: RegionId, active: bool) {
        let Some(region) = self.graph.get_mut(id) else {
            return;
        };
        region.active = active;
        for object_id in region.objects.iter().chain(region.lights.iter()) {
            if let Some(object) = self.objects.get_mut(object_id.0) {
                object.active = active;
            }
        }
    }

    /// Disable every region and forget the active set
    pub fn deactivate_all(&mut self) {
        for index in 0..self.graph.len() {
            self.set_region_state(RegionId(index), false);
        }
        self.active_set.clear();
        self.active_region = None;
    }

    /// Make `id` the observer's region
    ///
    /// Enables the region and its neighbours that are not yet enabled, then
    /// disables every previously enabled region that is not a neighbour.
    /// Regions that stay in the neighbourhood are not toggled.
    pub fn set_active_region(&mut self, id: RegionId) -> Result<ActiveSetChange, RegionError> {
        if let Err(e) = self.graph.check(id) {
            error!("Cannot activate region in manager '{}': {}", self.name, e);
            return Err(e);
        }

        let mut change = ActiveSetChange::default();
        let neighbours = self
            .graph
            .get(id)
            .map(|region| region.connected.clone())
            .unwrap_or_default();

        for neighbour in neighbours.into_iter().chain(std::iter::once(id)) {
            if !self.active_set.contains(&neighbour) {
                self.set_region_state(neighbour, true);
                self.active_set.push(neighbour);
                change.enabled.push(neighbour);
            }
        }

        let graph = &self.graph;
        let mut disabled = Vec::new();
        self.active_set.retain(|&current| {
            let keep = graph.is_connected(id, current);
            if !keep {
                disabled.push(current);
            }
            keep
        });
        for &region in &disabled {
            self.set_region_state(region, false);
        }
        change.disabled = disabled;

        self.active_region = Some(id);
        debug!(
            "Region {} active in '{}': +{:?} -{:?}",
            id, self.name, change.enabled, change.disabled
        );
        Ok(change)
    }
}
