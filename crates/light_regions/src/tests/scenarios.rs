use approx::assert_relative_eq;

use crate::bake::{BakeTask, CancelToken};
use crate::config::{BakeTargets, LightRegionsSettings};
use crate::foundation::logging;
use crate::foundation::math::{Transform, Vec3};
use crate::physics::LayerMask;
use crate::regions::{
    LightSource, ManagedKind, ManagedObject, ManagedObjectDesc, ManagerBounds, ObjectId, RegionBox,
    RegionDesc, RegionId, RegionManager, RegionRelation, SceneHandle,
};
use crate::scene::{StaticScene, AABB};
use crate::shadow::{CaptureTracker, ShadowRenderer, ShadowUpdateScheduler};
use crate::world::RegionWorld;

const GEOMETRY: LayerMask = LayerMask::from_layer(0);
const A: RegionId = RegionId(0);
const B: RegionId = RegionId(1);

fn room(handle: u64, x: f32) -> RegionDesc {
    RegionDesc {
        handle: SceneHandle(handle),
        name: format!("room {handle}"),
        transform: Transform::from_position(Vec3::new(x, 5.0, 5.0)),
        boxes: vec![RegionBox::new(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0))],
    }
}

fn lamp(handle: u64, position: Vec3, range: f32) -> ManagedObjectDesc {
    ManagedObjectDesc {
        handle: SceneHandle(handle),
        name: format!("lamp {handle}"),
        transform: Transform::from_position(position),
        center_offset: Vec3::zeros(),
        kind: ManagedKind::Light(Some(LightSource { range })),
    }
}

/// Room A spans x in [0, 10], room B spans x in [10, 20], one lamp in A
fn rooms() -> RegionManager {
    let mut manager = RegionManager::new(
        "house",
        ManagerBounds::Box(AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(21.0, 11.0, 11.0))),
    );
    manager.gather_regions(&[room(1, 5.0), room(2, 15.0)]);
    manager.gather_managed_objects(&[lamp(10, Vec3::new(5.0, 5.0, 5.0), 6.0)]);
    manager
}

fn wall() -> StaticScene {
    let mut scene = StaticScene::new();
    scene.add_box(Vec3::new(10.0, 5.0, 5.0), Vec3::new(0.5, 50.0, 50.0), GEOMETRY);
    scene
}

fn occlusion_settings() -> LightRegionsSettings {
    LightRegionsSettings {
        rays_per_light: 64,
        bounces_per_ray: 1,
        test_all_regions: false,
        bake_targets: BakeTargets::OCCLUSION,
        seed: Some(3),
        ..LightRegionsSettings::default()
    }
}

fn bake(manager: &mut RegionManager, scene: &mut StaticScene, settings: &LightRegionsSettings) {
    BakeTask::start(manager, settings)
        .unwrap()
        .run(manager, scene)
        .unwrap();
}

fn assert_symmetric(manager: &RegionManager) {
    let graph = manager.graph();
    for a in 0..graph.len() {
        for b in 0..graph.len() {
            assert_eq!(
                graph.is_connected(RegionId(a), RegionId(b)),
                graph.is_connected(RegionId(b), RegionId(a)),
                "asymmetric edge between {a} and {b}"
            );
        }
    }
}

#[test]
fn test_occluder_wall_keeps_rooms_apart() {
    logging::init_for_tests();
    let mut manager = rooms();
    let mut scene = wall();
    bake(&mut manager, &mut scene, &occlusion_settings());

    assert!(!manager.graph().is_connected(A, B));
    assert_eq!(manager.graph().relation(A, B), Ok(RegionRelation::Disconnected));
    assert_symmetric(&manager);
}

#[test]
fn test_open_rooms_connect_symmetrically() {
    let mut manager = rooms();
    let mut scene = StaticScene::new();
    bake(&mut manager, &mut scene, &occlusion_settings());

    assert!(manager.graph().is_connected(A, B));
    assert!(manager.graph().is_connected(B, A));
    assert_eq!(manager.graph().edge_count(), 1);
    assert_symmetric(&manager);
}

#[test]
fn test_rebake_follows_the_occluder() {
    let mut manager = rooms();
    let settings = occlusion_settings();

    bake(&mut manager, &mut wall(), &settings);
    assert!(!manager.graph().is_connected(A, B));

    // Wall removed
    bake(&mut manager, &mut StaticScene::new(), &settings);
    assert!(manager.graph().is_connected(A, B));
    assert_symmetric(&manager);

    // And put back
    bake(&mut manager, &mut wall(), &settings);
    assert!(!manager.graph().is_connected(A, B));
}

#[test]
fn test_positive_override_bridges_the_wall() {
    let mut manager = rooms();
    manager.graph_mut().add_positive_override(A, B).unwrap();
    let mut scene = wall();
    bake(&mut manager, &mut scene, &occlusion_settings());

    assert!(manager.graph().is_connected(A, B));
    assert_eq!(manager.graph().relation(B, A), Ok(RegionRelation::PositiveOverride));
    assert_symmetric(&manager);
}

#[test]
fn test_negative_override_beats_sampling() {
    let mut manager = rooms();
    manager.graph_mut().add_negative_override(B, A).unwrap();
    let mut scene = StaticScene::new();
    bake(&mut manager, &mut scene, &occlusion_settings());

    assert!(!manager.graph().is_connected(A, B));
    assert_eq!(manager.graph().relation(A, B), Ok(RegionRelation::NegativeOverride));
}

#[test]
fn test_region_centers_see_past_unlit_rooms() {
    let mut manager = rooms();
    manager.gather_managed_objects(&[]);
    let mut scene = StaticScene::new();
    let settings = LightRegionsSettings {
        test_all_regions: true,
        ..occlusion_settings()
    };
    let report = BakeTask::start(&mut manager, &settings)
        .unwrap()
        .run(&mut manager, &mut scene)
        .unwrap();

    assert_eq!(report.lights_traced, 0);
    assert_eq!(report.regions_traced, 2);
    assert_eq!(report.rays_cast, 64);
    assert!(manager.graph().is_connected(A, B));
}

#[test]
fn test_empty_scene_influence_mesh_reaches_light_range() {
    let mut manager = rooms();
    let mut scene = StaticScene::new();
    let settings = LightRegionsSettings {
        bake_targets: BakeTargets::INFLUENCE,
        ..occlusion_settings()
    };
    let report = BakeTask::start(&mut manager, &settings)
        .unwrap()
        .run(&mut manager, &mut scene)
        .unwrap();
    assert_eq!(report.influence_meshes, 1);
    assert_eq!(report.over_budget, 0);

    let light = manager.objects().find(|o| o.is_light()).unwrap();
    let influence = light.influence_mesh().unwrap();
    assert!(influence.within_budget());
    for vertex in influence.vertices() {
        assert_relative_eq!(vertex.magnitude(), 6.0, epsilon = 1e-3);
    }
    assert!(light.influence_collider().is_some());
    assert_eq!(scene.collider_count(), 1);

    // Baking again replaces the collider instead of adding one
    bake(&mut manager, &mut scene, &settings);
    assert_eq!(scene.collider_count(), 1);
}

#[test]
fn test_cancelled_bake_still_honours_overrides() {
    let mut manager = rooms();
    manager.graph_mut().add_positive_override(A, B).unwrap();
    let mut scene = wall();
    let task = BakeTask::start(&mut manager, &occlusion_settings()).unwrap();
    let token: CancelToken = task.cancel_token();
    token.cancel();

    let report = task.run(&mut manager, &mut scene).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.lights_traced, 0);
    assert!(manager.graph().is_connected(A, B));
}

#[derive(Default)]
struct Recorder(Vec<ObjectId>);

impl ShadowRenderer for Recorder {
    fn request_shadow_map(&mut self, light: &ManagedObject) {
        self.0.push(light.id());
    }
}

#[test]
fn test_walkthrough_drives_regions_and_shadows() {
    let mut manager = rooms();
    let mut scene = wall();
    let settings = LightRegionsSettings {
        bake_targets: BakeTargets::all(),
        ..occlusion_settings()
    };
    bake(&mut manager, &mut scene, &settings);
    let lamp = manager.light_ids()[0];

    let mut world = RegionWorld::new();
    let house = world.add_manager(manager);
    let camera = world.add_observer(Vec3::new(3.0, 5.0, 5.0), true);

    let manager = world.manager(house).unwrap();
    assert_eq!(manager.active_set(), &[A]);
    assert!(manager.object(lamp).unwrap().is_active());

    let mut shadows = ShadowUpdateScheduler::from_settings(&settings);
    let player = shadows.register(CaptureTracker::new(Transform::from_position(Vec3::new(4.0, 3.0, 5.0))));
    let mut renderer = Recorder::default();
    assert_eq!(shadows.update(world.active_manager(), &scene, &mut renderer), 1);
    assert_eq!(renderer.0, vec![lamp]);

    // Behind the wall room A and its lamp are disabled
    world.update_observer(camera, Vec3::new(15.0, 5.0, 5.0));
    let manager = world.manager(house).unwrap();
    assert_eq!(manager.active_set(), &[B]);
    assert!(!manager.object(lamp).unwrap().is_active());

    if let Some(tracker) = shadows.tracker_mut(player) {
        tracker.set_pose(Transform::from_position(Vec3::new(4.5, 3.0, 5.0)));
    }
    assert_eq!(shadows.update(world.active_manager(), &scene, &mut renderer), 0);
    assert_eq!(renderer.0.len(), 1);
}
