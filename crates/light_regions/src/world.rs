//! Region world
//!
//! Owns every region manager of a running scene together with the observers
//! moving through them. A main observer drives which manager is active and
//! which regions are enabled; secondary observers only raise events.

use log::{debug, error, info, warn};

use crate::events::{ManagerId, RegionEvent, RegionEventType, RegionEvents};
use crate::foundation::collections::{ObserverKey, SlotMap};
use crate::foundation::math::Vec3;
use crate::regions::{RegionId, RegionManager};

/// Tracked point moving through the managers, usually the camera
#[derive(Debug, Clone)]
pub struct Observer {
    main: bool,
    position: Vec3,
    manager: Option<ManagerId>,
    region: Option<RegionId>,
}

impl Observer {
    /// Whether this observer drives region activation
    pub fn is_main(&self) -> bool {
        self.main
    }

    /// Last reported position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Manager whose bounds contain the observer
    pub fn manager(&self) -> Option<ManagerId> {
        self.manager
    }

    /// Region of that manager containing the observer
    pub fn region(&self) -> Option<RegionId> {
        self.region
    }
}

/// Runtime context holding managers, observers and queued events
#[derive(Debug, Default)]
pub struct RegionWorld {
    managers: Vec<RegionManager>,
    active_manager: Option<ManagerId>,
    observers: SlotMap<ObserverKey, Observer>,
    events: RegionEvents,
}

impl RegionWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a loaded manager; all of its regions start disabled
    pub fn add_manager(&mut self, mut manager: RegionManager) -> ManagerId {
        manager.deactivate_all();
        let id = ManagerId(self.managers.len());
        info!("Loaded region manager '{}' with {} regions", manager.name(), manager.region_count());
        self.managers.push(manager);
        id
    }

    /// Manager by id
    pub fn manager(&self, id: ManagerId) -> Option<&RegionManager> {
        self.managers.get(id.0)
    }

    /// Mutable manager by id
    pub fn manager_mut(&mut self, id: ManagerId) -> Option<&mut RegionManager> {
        self.managers.get_mut(id.0)
    }

    /// All managers in id order
    pub fn managers(&self) -> impl Iterator<Item = &RegionManager> {
        self.managers.iter()
    }

    /// Manager the main observer is in
    pub fn active_manager_id(&self) -> Option<ManagerId> {
        self.active_manager
    }

    /// Manager the main observer is in
    pub fn active_manager(&self) -> Option<&RegionManager> {
        self.active_manager.and_then(|id| self.managers.get(id.0))
    }

    /// First manager whose bounds contain `point`
    pub fn manager_at(&self, point: Vec3) -> Option<ManagerId> {
        self.managers
            .iter()
            .position(|manager| manager.check_bounds(point))
            .map(ManagerId)
    }

    /// Activate the manager and region at `point` without an observer
    ///
    /// Used when loading straight into a location. Returns the manager made
    /// active, or `None` with a logged error when no manager covers `point`.
    pub fn initialize_at_point(&mut self, point: Vec3) -> Option<ManagerId> {
        let Some(id) = self.manager_at(point) else {
            error!("No region manager could be found at {:?}", point);
            return None;
        };
        self.active_manager = Some(id);

        let manager = self.managers.get_mut(id.0)?;
        manager.deactivate_all();
        match manager.region_id_at(point) {
            Some(region) => activate(manager, region),
            None => warn!("No region of '{}' contains {:?}", manager.name(), point),
        }
        Some(id)
    }

    /// Start tracking an observer at `position`
    ///
    /// Boundary events for the starting location are raised right away and a
    /// main observer activates the region it starts in, even while the
    /// manager's occlusion is off.
    pub fn add_observer(&mut self, position: Vec3, main: bool) -> ObserverKey {
        let key = self.observers.insert(Observer {
            main,
            position,
            manager: None,
            region: None,
        });
        self.update_observer(key, position);

        // `region_entered` does not activate while occlusion is off
        if main {
            let start = self.observers.get(key).and_then(|o| o.manager.zip(o.region));
            if let Some((manager, region)) = start {
                if let Some(manager) = self.managers.get_mut(manager.0) {
                    if !manager.occlusion_active {
                        activate(manager, region);
                    }
                }
            }
        }
        key
    }

    /// Stop tracking an observer; no exit events are raised
    pub fn remove_observer(&mut self, key: ObserverKey) -> Option<Observer> {
        self.observers.remove(key)
    }

    /// Observer by key
    pub fn observer(&self, key: ObserverKey) -> Option<&Observer> {
        self.observers.get(key)
    }

    /// Move an observer and process the boundaries it crossed
    ///
    /// Crossings are handled in the order region exit, manager exit, manager
    /// enter, region enter. Returns `false` for an unknown key.
    pub fn update_observer(&mut self, key: ObserverKey, position: Vec3) -> bool {
        let Some(observer) = self.observers.get_mut(key) else {
            return false;
        };
        observer.position = position;
        let main = observer.main;
        let from = (observer.manager, observer.region);

        let to_manager = self.manager_at(position);
        let to_region = to_manager
            .and_then(|id| self.managers.get(id.0))
            .and_then(|manager| manager.region_id_at(position));
        let to = (to_manager, to_region);
        if from == to {
            return true;
        }

        if let (Some(manager), Some(region)) = from {
            self.region_exited(key, manager, region, position, main);
        }
        if from.0 != to.0 {
            if let Some(manager) = from.0 {
                self.manager_exited(key, manager, main);
            }
            if let Some(manager) = to.0 {
                self.manager_entered(key, manager, to_region, main);
            }
        }
        if let (Some(manager), Some(region)) = to {
            self.region_entered(key, manager, region, main);
        }

        if let Some(observer) = self.observers.get_mut(key) {
            observer.manager = to_manager;
            observer.region = to_region;
        }
        true
    }

    /// Queued events
    pub fn events(&self) -> &RegionEvents {
        &self.events
    }

    /// Queued events, e.g. to register handlers or dispatch
    pub fn events_mut(&mut self) -> &mut RegionEvents {
        &mut self.events
    }

    /// Take every queued event
    pub fn drain_events(&mut self) -> Vec<RegionEvent> {
        self.events.drain()
    }

    fn region_entered(&mut self, key: ObserverKey, id: ManagerId, region: RegionId, main: bool) {
        let Some(manager) = self.managers.get_mut(id.0) else {
            return;
        };
        if !manager.occlusion_active {
            return;
        }
        if main {
            activate(manager, region);
        }
        self.events
            .send(RegionEvent::new(RegionEventType::RegionEntered, key, id, Some(region)));
    }

    fn region_exited(&mut self, key: ObserverKey, id: ManagerId, region: RegionId, position: Vec3, main: bool) {
        let Some(manager) = self.managers.get_mut(id.0) else {
            return;
        };
        if !manager.occlusion_active {
            return;
        }
        if main && manager.active_region() == Some(region) {
            if let Some(next) = manager.region_id_at(position) {
                activate(manager, next);
            }
        }
        self.events
            .send(RegionEvent::new(RegionEventType::RegionExited, key, id, Some(region)));
    }

    fn manager_entered(&mut self, key: ObserverKey, id: ManagerId, region: Option<RegionId>, main: bool) {
        let Some(manager) = self.managers.get(id.0) else {
            return;
        };
        if !main {
            self.events
                .send(RegionEvent::new(RegionEventType::ManagerEntered, key, id, region));
            return;
        }
        debug!("Entered region manager '{}'", manager.name());
        let active_region = manager.active_region();
        self.active_manager = Some(id);
        self.events
            .send(RegionEvent::new(RegionEventType::ManagerEntered, key, id, active_region));
    }

    fn manager_exited(&mut self, key: ObserverKey, id: ManagerId, main: bool) {
        let Some(manager) = self.managers.get_mut(id.0) else {
            return;
        };
        self.events.send(RegionEvent::new(
            RegionEventType::ManagerExited,
            key,
            id,
            manager.active_region(),
        ));
        if !main {
            return;
        }
        if self.active_manager == Some(id) {
            self.active_manager = None;
        }
        debug!("Left region manager '{}'", manager.name());
        manager.deactivate_all();
    }
}

fn activate(manager: &mut RegionManager, region: RegionId) {
    // Failures are logged by the manager
    if let Ok(change) = manager.set_active_region(region) {
        if !change.enabled.is_empty() || !change.disabled.is_empty() {
            debug!(
                "'{}': enabled {:?}, disabled {:?}",
                manager.name(),
                change.enabled,
                change.disabled
            );
        }
    }
}
