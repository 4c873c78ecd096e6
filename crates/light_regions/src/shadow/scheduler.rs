//! Round-robin shadow update scheduling
//!
//! Influence checks are spread over frames: each tick checks one tracker.
//! Shadow renders are requested every frame for the lights of every dirty
//! tracker, through a [`ShadowCastGate`].

use log::debug;

use super::{CaptureTracker, ShadowCastGate, ShadowRenderer};
use crate::config::LightRegionsSettings;
use crate::foundation::collections::{SlotMap, TrackerKey};
use crate::physics::LayerMask;
use crate::regions::RegionManager;
use crate::scene::GeometryQuery;

/// Owns the capture trackers and drives their checks
#[derive(Debug)]
pub struct ShadowUpdateScheduler {
    trackers: SlotMap<TrackerKey, CaptureTracker>,
    order: Vec<TrackerKey>,
    cursor: usize,
    influence_mask: LayerMask,
    gate: ShadowCastGate,
}

impl ShadowUpdateScheduler {
    /// Create a scheduler querying `influence_mask`
    pub fn new(influence_mask: LayerMask) -> Self {
        Self {
            trackers: SlotMap::with_key(),
            order: Vec::new(),
            cursor: 0,
            influence_mask,
            gate: ShadowCastGate::new(),
        }
    }

    /// Create a scheduler on the influence layer of `settings`
    pub fn from_settings(settings: &LightRegionsSettings) -> Self {
        Self::new(settings.influence_mask())
    }

    /// Add a tracker to the rotation
    pub fn register(&mut self, tracker: CaptureTracker) -> TrackerKey {
        let key = self.trackers.insert(tracker);
        self.order.push(key);
        key
    }

    /// Remove a tracker; stale keys return `None`
    pub fn unregister(&mut self, key: TrackerKey) -> Option<CaptureTracker> {
        let tracker = self.trackers.remove(key)?;
        if let Some(index) = self.order.iter().position(|&k| k == key) {
            self.order.remove(index);
            if index < self.cursor {
                self.cursor -= 1;
            }
        }
        Some(tracker)
    }

    /// Tracker by key
    pub fn tracker(&self, key: TrackerKey) -> Option<&CaptureTracker> {
        self.trackers.get(key)
    }

    /// Mutable tracker by key, e.g. to update its pose
    pub fn tracker_mut(&mut self, key: TrackerKey) -> Option<&mut CaptureTracker> {
        self.trackers.get_mut(key)
    }

    /// Number of registered trackers
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    /// Whether no tracker is registered
    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Check the next tracker in the rotation
    ///
    /// Returns the key of the tracker that was checked.
    pub fn tick<G: GeometryQuery + ?Sized>(
        &mut self,
        manager: Option<&RegionManager>,
        geometry: &G,
    ) -> Option<TrackerKey> {
        if self.order.is_empty() {
            return None;
        }
        if self.cursor >= self.order.len() {
            self.cursor = 0;
        }

        let key = self.order[self.cursor];
        self.cursor += 1;
        let tracker = self.trackers.get_mut(key)?;
        tracker.check_for_influence(manager, geometry, self.influence_mask);
        Some(key)
    }

    /// Request shadow renders for the lights of every dirty tracker
    ///
    /// Returns how many renders were requested.
    pub fn cast_shadows<R: ShadowRenderer + ?Sized>(
        &mut self,
        manager: &RegionManager,
        renderer: &mut R,
    ) -> usize {
        let mut requested = 0;
        for tracker in self.trackers.values().filter(|t| t.is_dirty()) {
            for &light in tracker.lights() {
                if self.gate.request(manager, light, renderer) {
                    requested += 1;
                }
            }
        }
        requested
    }

    /// One frame: reset the gate, check one tracker, cast shadows
    pub fn update<G, R>(
        &mut self,
        manager: Option<&RegionManager>,
        geometry: &G,
        renderer: &mut R,
    ) -> usize
    where
        G: GeometryQuery + ?Sized,
        R: ShadowRenderer + ?Sized,
    {
        self.gate.begin_frame();
        self.tick(manager, geometry);
        let Some(manager) = manager else {
            return 0;
        };
        let requested = self.cast_shadows(manager, renderer);
        if requested > 0 {
            debug!("Requested {} shadow renders", requested);
        }
        requested
    }
}
