//! Influence capture points
//!
//! A tracker follows a shadow-casting object such as a character. Whenever it
//! is checked after moving it overlaps a small sphere with the influence layer
//! and remembers which lights can reach it.

use log::trace;

use crate::foundation::math::{Quat, Transform, Vec3};
use crate::physics::{ColliderId, LayerMask};
use crate::regions::{ObjectId, RegionManager};
use crate::scene::GeometryQuery;

/// Overlap results kept per check; extra overlaps are dropped
pub const CAPTURE_BUFFER_SIZE: usize = 16;

/// Radius of the capture sphere
pub const DEFAULT_CAPTURE_RADIUS: f32 = 1.25;

/// Capture point of a shadow caster
#[derive(Debug, Clone)]
pub struct CaptureTracker {
    /// Offset from the tracked position to the capture sphere center
    pub capture_offset: Vec3,
    /// Capture sphere radius
    pub capture_radius: f32,
    /// Re-check even when the pose has not changed
    pub cast_if_still: bool,
    pose: Transform,
    last_pose: Option<(Vec3, Quat)>,
    buffer: [Option<ColliderId>; CAPTURE_BUFFER_SIZE],
    lights: Vec<ObjectId>,
    dirty: bool,
}

impl Default for CaptureTracker {
    fn default() -> Self {
        Self::new(Transform::identity())
    }
}

impl CaptureTracker {
    /// Create a tracker at `pose` with the default capture sphere
    pub fn new(pose: Transform) -> Self {
        Self {
            capture_offset: Vec3::y(),
            capture_radius: DEFAULT_CAPTURE_RADIUS,
            cast_if_still: false,
            pose,
            last_pose: None,
            buffer: [None; CAPTURE_BUFFER_SIZE],
            lights: Vec::new(),
            dirty: false,
        }
    }

    /// Builder: capture sphere offset and radius
    pub fn with_capture(mut self, offset: Vec3, radius: f32) -> Self {
        self.capture_offset = offset;
        self.capture_radius = radius;
        self
    }

    /// Builder: re-check every time even without movement
    pub fn with_cast_if_still(mut self, cast_if_still: bool) -> Self {
        self.cast_if_still = cast_if_still;
        self
    }

    /// Move the tracked object
    pub fn set_pose(&mut self, pose: Transform) {
        self.pose = pose;
    }

    /// Current pose of the tracked object
    pub fn pose(&self) -> &Transform {
        &self.pose
    }

    /// Center of the capture sphere
    pub fn capture_point(&self) -> Vec3 {
        self.pose.position + self.capture_offset
    }

    /// Lights found by the last check that found anything
    pub fn lights(&self) -> &[ObjectId] {
        &self.lights
    }

    /// Whether the last check asked for shadow updates
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Look for influence meshes around the capture point
    ///
    /// Without an active manager the tracker goes clean. Otherwise, when the
    /// pose changed since the last query or `cast_if_still` is set, the
    /// previous lights are dropped, the influence layer is queried and the
    /// tracker goes dirty. An unchanged pose leaves it clean.
    pub fn check_for_influence<G: GeometryQuery + ?Sized>(
        &mut self,
        manager: Option<&RegionManager>,
        geometry: &G,
        influence_mask: LayerMask,
    ) {
        let Some(manager) = manager else {
            self.dirty = false;
            return;
        };

        let pose = (self.pose.position, self.pose.rotation);
        if self.last_pose == Some(pose) && !self.cast_if_still {
            self.dirty = false;
            return;
        }

        self.buffer = [None; CAPTURE_BUFFER_SIZE];
        self.lights.clear();
        let count = geometry.overlap_sphere(
            self.capture_point(),
            self.capture_radius,
            influence_mask,
            &mut self.buffer,
        );

        for collider in self.buffer.iter().take(count).flatten() {
            if let Some(light) = manager.object_by_collider(*collider) {
                if !self.lights.contains(&light.id()) {
                    self.lights.push(light.id());
                }
            }
        }
        trace!(
            "Capture at {:?}: {} overlaps, {} lights",
            self.capture_point(),
            count,
            self.lights.len()
        );

        self.last_pose = Some(pose);
        self.dirty = true;
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::foundation::math::{Transform, Vec3};
    use crate::physics::{CollisionShape, LayerMask};
    use crate::regions::{
        LightSource, ManagedKind, ManagedObjectDesc, ManagerBounds, ObjectId, RegionBox, RegionDesc,
        RegionId, RegionManager, SceneHandle,
    };
    use crate::scene::{StaticScene, AABB};

    pub const INFLUENCE: LayerMask = LayerMask::from_layer(9);

    /// Two connected, enabled rooms side by side, one light in each, with sphere influence colliders
    pub fn lit_rooms(scene: &mut StaticScene) -> RegionManager {
        let mut manager = RegionManager::new(
            "lit",
            ManagerBounds::Box(AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(21.0, 11.0, 11.0))),
        );
        let rooms: Vec<RegionDesc> = (0..2)
            .map(|i| RegionDesc {
                handle: SceneHandle(i),
                name: format!("room {i}"),
                transform: Transform::from_position(Vec3::new(5.0 + 10.0 * i as f32, 5.0, 5.0)),
                boxes: vec![RegionBox::new(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0))],
            })
            .collect();
        manager.gather_regions(&rooms);
        manager.graph_mut().connect(RegionId(0), RegionId(1)).unwrap();
        manager.set_active_region(RegionId(0)).unwrap();

        let lights: Vec<ManagedObjectDesc> = (0..2)
            .map(|i| ManagedObjectDesc {
                handle: SceneHandle(100 + i),
                name: format!("lamp {i}"),
                transform: Transform::from_position(Vec3::new(5.0 + 10.0 * i as f32, 5.0, 5.0)),
                center_offset: Vec3::zeros(),
                kind: ManagedKind::Light(Some(LightSource { range: 4.0 })),
            })
            .collect();
        manager.gather_managed_objects(&lights);

        for id in manager.light_ids() {
            let center = manager.object(id).map(|o| o.offset_point()).unwrap_or_default();
            let collider = scene.add_collider(CollisionShape::sphere(center, 4.0), INFLUENCE);
            if let Some(object) = manager.object_mut(id) {
                object.collider = Some(collider);
            }
        }
        manager
    }

    pub fn lamp(manager: &RegionManager, handle: u64) -> ObjectId {
        manager
            .objects()
            .find(|o| o.handle() == SceneHandle(handle))
            .map(|o| o.id())
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{lamp, lit_rooms, INFLUENCE};
    use super::*;
    use crate::scene::StaticScene;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let tracker = CaptureTracker::default();
        assert_relative_eq!(tracker.capture_offset, Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(tracker.capture_radius, 1.25);
        assert!(!tracker.cast_if_still);
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_finds_light_in_reach() {
        let mut scene = StaticScene::new();
        let manager = lit_rooms(&mut scene);
        let mut tracker = CaptureTracker::new(Transform::from_position(Vec3::new(6.0, 4.0, 5.0)));

        tracker.check_for_influence(Some(&manager), &scene, INFLUENCE);
        assert!(tracker.is_dirty());
        assert_eq!(tracker.lights(), &[lamp(&manager, 100)]);
    }

    #[test]
    fn test_capture_offset_and_radius() {
        let mut scene = StaticScene::new();
        let manager = lit_rooms(&mut scene);
        let pose = Transform::from_position(Vec3::new(9.6, 5.0, 5.0));

        let mut tight = CaptureTracker::new(pose).with_capture(Vec3::zeros(), 0.5);
        tight.check_for_influence(Some(&manager), &scene, INFLUENCE);
        assert!(tight.is_dirty());
        assert!(tight.lights().is_empty());

        let mut default = CaptureTracker::new(pose).with_cast_if_still(true);
        default.check_for_influence(Some(&manager), &scene, INFLUENCE);
        assert_eq!(default.lights(), &[lamp(&manager, 100)]);
        default.check_for_influence(Some(&manager), &scene, INFLUENCE);
        assert!(default.is_dirty());
    }

    #[test]
    fn test_still_pose_goes_clean() {
        let mut scene = StaticScene::new();
        let manager = lit_rooms(&mut scene);
        let mut tracker = CaptureTracker::new(Transform::from_position(Vec3::new(6.0, 4.0, 5.0)));

        tracker.check_for_influence(Some(&manager), &scene, INFLUENCE);
        tracker.check_for_influence(Some(&manager), &scene, INFLUENCE);
        assert!(!tracker.is_dirty());
        // The lights from the last query are kept
        assert_eq!(tracker.lights().len(), 1);

        tracker.cast_if_still = true;
        tracker.check_for_influence(Some(&manager), &scene, INFLUENCE);
        assert!(tracker.is_dirty());
    }

    #[test]
    fn test_moving_between_lights() {
        let mut scene = StaticScene::new();
        let manager = lit_rooms(&mut scene);
        let mut tracker = CaptureTracker::new(Transform::from_position(Vec3::new(6.0, 4.0, 5.0)));
        tracker.check_for_influence(Some(&manager), &scene, INFLUENCE);

        tracker.set_pose(Transform::from_position(Vec3::new(10.0, 4.0, 5.0)));
        tracker.check_for_influence(Some(&manager), &scene, INFLUENCE);
        assert_eq!(tracker.lights(), &[lamp(&manager, 100), lamp(&manager, 101)]);

        tracker.set_pose(Transform::from_position(Vec3::new(16.0, 4.0, 5.0)));
        tracker.check_for_influence(Some(&manager), &scene, INFLUENCE);
        assert_eq!(tracker.lights(), &[lamp(&manager, 101)]);
    }

    #[test]
    fn test_no_manager_goes_clean() {
        let mut scene = StaticScene::new();
        let manager = lit_rooms(&mut scene);
        let mut tracker = CaptureTracker::new(Transform::from_position(Vec3::new(6.0, 4.0, 5.0)));
        tracker.check_for_influence(Some(&manager), &scene, INFLUENCE);
        assert!(tracker.is_dirty());

        tracker.set_pose(Transform::from_position(Vec3::new(7.0, 4.0, 5.0)));
        tracker.check_for_influence(None, &scene, INFLUENCE);
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_overlaps_beyond_buffer_are_dropped() {
        let mut scene = StaticScene::new();
        let manager = lit_rooms(&mut scene);
        for _ in 0..20 {
            scene.add_collider(
                crate::physics::CollisionShape::sphere(Vec3::new(6.0, 5.0, 5.0), 1.0),
                INFLUENCE,
            );
        }
        let mut tracker = CaptureTracker::new(Transform::from_position(Vec3::new(6.0, 4.0, 5.0)));
        tracker.check_for_influence(Some(&manager), &scene, INFLUENCE);
        // The lamp colliders were registered first so they still fit
        assert_eq!(tracker.lights(), &[lamp(&manager, 100)]);
        assert!(tracker.buffer.iter().all(Option::is_some));
    }
}
