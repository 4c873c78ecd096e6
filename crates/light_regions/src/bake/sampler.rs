//! Visibility sampling
//!
//! Directions come from a golden-ratio spiral. Each direction is followed for
//! a few bounces through the occluding geometry, and the regions the path
//! passes through are recorded in the order they are first seen.

use log::trace;
use rand::Rng;

use crate::foundation::math::{
    constants::GOLDEN_RATIO,
    utils::{deg_to_rad, lerp, reflect},
    Quat, Unit, Vec3,
};
use crate::physics::{LayerMask, Ray};
use crate::regions::{RegionError, RegionGraph, RegionId, RegionManager};
use crate::scene::GeometryQuery;

/// Longest distance probed per bounce
pub const PROBE_DISTANCE: f32 = 100.0;

/// Spacing of the region samples taken along each segment
pub const SAMPLE_SPACING: f32 = 1.0;

/// How far a bounced ray starts off the surface it hit
pub const SURFACE_OFFSET: f32 = 0.01;

/// `count` points on a sphere of `radius` following the golden-ratio spiral
pub fn distribute_points_on_sphere(count: usize, radius: f32) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32;
            let inclination = (1.0 - 2.0 * t).acos();
            let azimuth = 2.0 * std::f32::consts::PI * GOLDEN_RATIO * i as f32;

            Vec3::new(
                inclination.sin() * azimuth.cos(),
                inclination.sin() * azimuth.sin(),
                inclination.cos(),
            ) * radius
        })
        .collect()
}

/// Points from `start` towards `end` every [`SAMPLE_SPACING`], excluding `end`
pub fn trace_points(start: Vec3, end: Vec3) -> Vec<Vec3> {
    let distance = (end - start).magnitude();
    let count = (distance / SAMPLE_SPACING).ceil() as usize;
    (0..count)
        .map(|i| lerp(start, end, i as f32 / count as f32))
        .collect()
}

/// Tilt `normal` by a random angle in `[0, max_degrees]` around a random perpendicular axis
pub fn roughen<R: Rng + ?Sized>(normal: Vec3, max_degrees: f32, rng: &mut R) -> Vec3 {
    let normal = normal.try_normalize(f32::EPSILON).unwrap_or(normal);
    if max_degrees <= 0.0 {
        return normal;
    }

    let z: f32 = rng.gen_range(-1.0..=1.0);
    let phi: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
    let planar = (1.0 - z * z).max(0.0).sqrt();
    let random_point = Vec3::new(planar * phi.cos(), planar * phi.sin(), z);

    let Some(axis) = Unit::try_new(normal.cross(&random_point), f32::EPSILON) else {
        return normal;
    };
    let angle = deg_to_rad(rng.gen_range(0.0..=max_degrees));
    (Quat::from_axis_angle(&axis, angle) * normal).normalize()
}

/// Multi-bounce ray tracer mapping light paths to region sequences
#[derive(Debug, Clone, Copy)]
pub struct PathTracer<'a, G: GeometryQuery> {
    geometry: &'a G,
    occlusion_mask: LayerMask,
    bounces: u32,
    max_ray_length: f32,
    diffusion: f32,
}

impl<'a, G: GeometryQuery> PathTracer<'a, G> {
    /// Create a tracer
    pub fn new(
        geometry: &'a G,
        occlusion_mask: LayerMask,
        bounces: u32,
        max_ray_length: f32,
        diffusion: f32,
    ) -> Self {
        Self {
            geometry,
            occlusion_mask,
            bounces,
            max_ray_length,
            diffusion,
        }
    }

    /// Regions visited by a path starting at `origin` along `direction`
    ///
    /// Each bounce probes at most [`PROBE_DISTANCE`]. A hit samples the
    /// segment up to the hit point and reflects about a roughened normal; a
    /// miss samples out to the maximum ray length and ends the path.
    pub fn trace<R: Rng + ?Sized>(
        &self,
        regions: &RegionManager,
        origin: Vec3,
        direction: Vec3,
        rng: &mut R,
    ) -> Vec<RegionId> {
        let mut path = Vec::new();
        let mut ray = Ray::new(origin, direction);

        for bounce in 0..self.bounces {
            match self.geometry.raycast(&ray, PROBE_DISTANCE, self.occlusion_mask) {
                Some(hit) => {
                    record(&mut path, regions, trace_points(ray.origin, hit.point));
                    let normal = roughen(hit.normal, self.diffusion, rng);
                    trace!("Bounce {} hit {:?} at {:.2}", bounce, hit.collider, hit.distance);
                    ray = Ray::new(
                        hit.point + hit.normal * SURFACE_OFFSET,
                        reflect(ray.direction, normal),
                    );
                }
                None => {
                    record(
                        &mut path,
                        regions,
                        trace_points(ray.origin, ray.point_at(self.max_ray_length)),
                    );
                    break;
                }
            }
        }

        path
    }
}

fn record(path: &mut Vec<RegionId>, regions: &RegionManager, points: Vec<Vec3>) {
    for point in points {
        if let Some(id) = regions.region_id_at(point) {
            if !path.contains(&id) {
                path.push(id);
            }
        }
    }
}

/// Fold a traced path into the graph
///
/// Consecutive regions are connected and the origin region is connected to
/// every region on the path.
pub fn fold_path(graph: &mut RegionGraph, origin: RegionId, path: &[RegionId]) -> Result<(), RegionError> {
    for (index, &region) in path.iter().enumerate() {
        if index > 0 {
            graph.connect(region, path[index - 1])?;
        }
        graph.connect(origin, region)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use crate::regions::{ManagerBounds, RegionBox, RegionDesc, SceneHandle};
    use crate::scene::{StaticScene, AABB};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const GEOMETRY: LayerMask = LayerMask::from_layer(0);

    fn corridor(count: usize) -> RegionManager {
        let mut manager = RegionManager::new(
            "corridor",
            ManagerBounds::Box(AABB::new(Vec3::new(-500.0, -500.0, -500.0), Vec3::new(500.0, 500.0, 500.0))),
        );
        let descs: Vec<RegionDesc> = (0..count)
            .map(|i| RegionDesc {
                handle: SceneHandle(i as u64),
                name: format!("cell {i}"),
                transform: Transform::from_position(Vec3::new(5.0 + 10.0 * i as f32, 5.0, 5.0)),
                boxes: vec![RegionBox::new(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0))],
            })
            .collect();
        manager.gather_regions(&descs);
        manager
    }

    #[test]
    fn test_spiral_points_on_radius_and_distinct() {
        let points = distribute_points_on_sphere(256, 3.0);
        assert_eq!(points.len(), 256);
        assert_relative_eq!(points[0], Vec3::new(0.0, 0.0, 3.0), epsilon = 1e-5);
        for point in &points {
            assert_relative_eq!(point.magnitude(), 3.0, epsilon = 1e-4);
        }
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert!((a - b).magnitude() > 1e-3);
            }
        }
    }

    #[test]
    fn test_trace_points_exclude_end() {
        let points = trace_points(Vec3::zeros(), Vec3::new(2.5, 0.0, 0.0));
        assert_eq!(points.len(), 3);
        assert_relative_eq!(points[1], Vec3::new(2.5 / 3.0, 0.0, 0.0), epsilon = 1e-6);
        assert!(trace_points(Vec3::zeros(), Vec3::zeros()).is_empty());
    }

    #[test]
    fn test_roughen_stays_within_cone() {
        let mut rng = StdRng::seed_from_u64(7);
        let normal = Vec3::new(0.0, 1.0, 0.0);
        for _ in 0..200 {
            let rough = roughen(normal, 10.0, &mut rng);
            assert_relative_eq!(rough.magnitude(), 1.0, epsilon = 1e-5);
            assert!(rough.dot(&normal) >= deg_to_rad(10.0).cos() - 1e-5);
        }
        assert_eq!(roughen(normal, 0.0, &mut rng), normal);
    }

    #[test]
    fn test_miss_samples_to_max_length() {
        let scene = StaticScene::new();
        let manager = corridor(4);
        let tracer = PathTracer::new(&scene, GEOMETRY, 3, 400.0, 0.0);
        let mut rng = StdRng::seed_from_u64(1);

        let path = tracer.trace(&manager, Vec3::new(5.0, 5.0, 5.0), Vec3::new(1.0, 0.0, 0.0), &mut rng);
        assert_eq!(path, vec![RegionId(0), RegionId(1), RegionId(2), RegionId(3)]);

        let path = tracer.trace(&manager, Vec3::new(5.0, 5.0, 5.0), Vec3::new(-1.0, 0.0, 0.0), &mut rng);
        assert_eq!(path, vec![RegionId(0)]);
    }

    #[test]
    fn test_bounce_reflects_back() {
        let mut scene = StaticScene::new();
        scene.add_box(Vec3::new(20.0, 5.0, 5.0), Vec3::new(0.5, 50.0, 50.0), GEOMETRY);
        let manager = corridor(4);
        let tracer = PathTracer::new(&scene, GEOMETRY, 2, 400.0, 0.0);
        let mut rng = StdRng::seed_from_u64(1);

        // Start in cell 1, bounce off the wall at x = 19.5, travel back through cell 0
        let path = tracer.trace(&manager, Vec3::new(15.0, 5.0, 5.0), Vec3::new(1.0, 0.0, 0.0), &mut rng);
        assert_eq!(path, vec![RegionId(1), RegionId(0)]);
    }

    #[test]
    fn test_fold_path_connects_chain_and_origin() {
        let mut manager = corridor(4);
        fold_path(manager.graph_mut(), RegionId(0), &[RegionId(0), RegionId(2), RegionId(3)]).unwrap();
        let graph = manager.graph();
        assert!(graph.is_connected(RegionId(0), RegionId(2)));
        assert!(graph.is_connected(RegionId(2), RegionId(3)));
        assert!(graph.is_connected(RegionId(0), RegionId(3)));
        assert!(!graph.is_connected(RegionId(0), RegionId(1)));
        assert_eq!(graph.edge_count(), 3);
    }
}
