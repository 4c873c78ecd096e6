//! Resumable bake task
//!
//! The host starts a bake and then calls [`BakeTask::step`] as often as it
//! likes, e.g. once per editor frame. Every step traces one light, one region
//! center or builds one influence mesh. Cancellation is checked between steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::sampler::{distribute_points_on_sphere, fold_path, PathTracer};
use super::BakeError;
use crate::config::{BakeTargets, LightRegionsSettings};
use crate::foundation::math::Vec3;
use crate::influence::InfluenceMesher;
use crate::regions::{ObjectId, Region, RegionId, RegionManager};
use crate::scene::{ColliderRegistry, GeometryQuery};

/// Shared flag used to stop a running bake
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect before the next step
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Phase a bake step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakeStage {
    /// Tracing from lights
    Lights,
    /// Tracing from region centers
    Regions,
    /// Building influence meshes
    Influence,
}

/// Position of a running bake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BakeProgress {
    /// Phase of the step just completed
    pub stage: BakeStage,
    /// Steps completed so far
    pub completed: usize,
    /// Total number of steps
    pub total: usize,
}

impl BakeProgress {
    /// Completed fraction in `[0, 1]`
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}

/// Totals of a finished or cancelled bake
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakeReport {
    /// Lights traced
    pub lights_traced: usize,
    /// Region centers traced
    pub regions_traced: usize,
    /// Rays cast from lights and region centers
    pub rays_cast: usize,
    /// Influence meshes built
    pub influence_meshes: usize,
    /// Influence meshes that missed the vertex budget
    pub over_budget: usize,
    /// Lights skipped because they have no light data
    pub skipped_lights: usize,
    /// Region graph edges after reconciliation
    pub edges: usize,
    /// Whether the bake was cancelled
    pub cancelled: bool,
}

/// Result of one [`BakeTask::step`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BakeStatus {
    /// More steps remain
    InProgress(BakeProgress),
    /// All steps ran
    Finished(BakeReport),
    /// Stopped through the cancel token
    Cancelled(BakeReport),
}

#[derive(Debug, Clone, Copy)]
enum BakeStep {
    Light { region: RegionId, light: ObjectId },
    RegionCenter(RegionId),
    Influence(ObjectId),
}

impl BakeStep {
    const fn stage(self) -> BakeStage {
        match self {
            Self::Light { .. } => BakeStage::Lights,
            Self::RegionCenter(_) => BakeStage::Regions,
            Self::Influence(_) => BakeStage::Influence,
        }
    }
}

/// A bake in progress
#[derive(Debug)]
pub struct BakeTask {
    settings: LightRegionsSettings,
    rng: StdRng,
    steps: Vec<BakeStep>,
    cursor: usize,
    cancel: CancelToken,
    report: BakeReport,
    finished: bool,
}

impl BakeTask {
    /// Validate and start a bake of `manager`
    ///
    /// Settings and region bounds are checked before anything is touched.
    /// When occlusion is baked, sampled connectivity is cleared here;
    /// overrides are kept and re-applied when the bake ends.
    pub fn start(manager: &mut RegionManager, settings: &LightRegionsSettings) -> Result<Self, BakeError> {
        settings.validate()?;
        manager.validate_region_bounds()?;

        let targets = settings.bake_targets;
        let mut steps = Vec::new();
        if targets.contains(BakeTargets::OCCLUSION) {
            for region in manager.regions() {
                steps.extend(region.lights().iter().map(|&light| BakeStep::Light {
                    region: region.id(),
                    light,
                }));
            }
            if settings.test_all_regions {
                steps.extend(manager.regions().map(|region| BakeStep::RegionCenter(region.id())));
            }
            manager.graph_mut().clear_connections();
        }
        if targets.contains(BakeTargets::INFLUENCE) {
            steps.extend(manager.light_ids().into_iter().map(BakeStep::Influence));
        }

        let rng = settings
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        info!(
            "Baking '{}': {} regions, {} lights, {} steps",
            manager.name(),
            manager.region_count(),
            manager.light_ids().len(),
            steps.len()
        );

        Ok(Self {
            settings: settings.clone(),
            rng,
            steps,
            cursor: 0,
            cancel: CancelToken::new(),
            report: BakeReport::default(),
            finished: false,
        })
    }

    /// Token that cancels this bake from anywhere
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Whether the bake has finished or been cancelled
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Run the next step
    ///
    /// `manager` must be the manager the bake was started on.
    pub fn step<S>(&mut self, manager: &mut RegionManager, scene: &mut S) -> Result<BakeStatus, BakeError>
    where
        S: GeometryQuery + ColliderRegistry,
    {
        if self.finished {
            return Err(BakeError::AlreadyFinished);
        }

        if self.cancel.is_cancelled() {
            warn!(
                "Bake of '{}' cancelled after {}/{} steps",
                manager.name(),
                self.cursor,
                self.steps.len()
            );
            self.report.cancelled = true;
            return Ok(BakeStatus::Cancelled(self.finish(manager)));
        }

        let Some(&step) = self.steps.get(self.cursor) else {
            return Ok(BakeStatus::Finished(self.finish(manager)));
        };

        match step {
            BakeStep::Light { region, light } => self.trace_light(manager, &*scene, region, light)?,
            BakeStep::RegionCenter(region) => self.trace_region(manager, &*scene, region)?,
            BakeStep::Influence(light) => self.build_influence(manager, scene, light),
        }
        self.cursor += 1;

        if self.cursor == self.steps.len() {
            return Ok(BakeStatus::Finished(self.finish(manager)));
        }
        Ok(BakeStatus::InProgress(BakeProgress {
            stage: step.stage(),
            completed: self.cursor,
            total: self.steps.len(),
        }))
    }

    /// Step until the bake finishes or is cancelled
    pub fn run<S>(mut self, manager: &mut RegionManager, scene: &mut S) -> Result<BakeReport, BakeError>
    where
        S: GeometryQuery + ColliderRegistry,
    {
        loop {
            match self.step(manager, scene)? {
                BakeStatus::InProgress(_) => {}
                BakeStatus::Finished(report) | BakeStatus::Cancelled(report) => return Ok(report),
            }
        }
    }

    fn tracer<'a, G: GeometryQuery>(&self, geometry: &'a G) -> PathTracer<'a, G> {
        PathTracer::new(
            geometry,
            self.settings.occlusion_mask,
            self.settings.bounces_per_ray,
            self.settings.max_ray_length,
            self.settings.ray_diffusion,
        )
    }

    fn cast_from<G: GeometryQuery>(
        &mut self,
        manager: &mut RegionManager,
        geometry: &G,
        origin_region: RegionId,
        origin: Vec3,
        ray_count: usize,
    ) -> Result<(), BakeError> {
        let tracer = self.tracer(geometry);
        for direction in distribute_points_on_sphere(ray_count, 1.0) {
            let path = tracer.trace(manager, origin, direction, &mut self.rng);
            fold_path(manager.graph_mut(), origin_region, &path)?;
        }
        self.report.rays_cast += ray_count;
        Ok(())
    }

    fn trace_light<G: GeometryQuery>(
        &mut self,
        manager: &mut RegionManager,
        geometry: &G,
        region: RegionId,
        light: ObjectId,
    ) -> Result<(), BakeError> {
        let Some(origin) = manager.object(light).map(|object| object.offset_point()) else {
            warn!("Light {:?} disappeared from '{}' during the bake", light, manager.name());
            return Ok(());
        };

        self.report.lights_traced += 1;
        info!(
            "Baking light {}/{}",
            self.report.lights_traced,
            self.count(BakeStage::Lights)
        );
        let rays = self.settings.rays_per_light as usize;
        self.cast_from(manager, geometry, region, origin, rays)
    }

    fn trace_region<G: GeometryQuery>(
        &mut self,
        manager: &mut RegionManager,
        geometry: &G,
        region: RegionId,
    ) -> Result<(), BakeError> {
        manager.graph().check(region)?;
        let Some(origin) = manager.graph().get(region).map(Region::position) else {
            return Ok(());
        };

        self.report.regions_traced += 1;
        debug!(
            "Baking region {}/{}",
            self.report.regions_traced,
            self.count(BakeStage::Regions)
        );
        let rays = self.settings.rays_per_light as usize / 2;
        self.cast_from(manager, geometry, region, origin, rays)
    }

    fn build_influence<S>(&mut self, manager: &mut RegionManager, scene: &mut S, light: ObjectId)
    where
        S: GeometryQuery + ColliderRegistry,
    {
        let Some(object) = manager.object(light) else {
            return;
        };
        let source = match object.light_source() {
            Ok(source) => source,
            Err(e) => {
                error!("Skipping influence mesh: {}", e);
                self.report.skipped_lights += 1;
                return;
            }
        };
        let origin = object.offset_point();
        let previous = object.influence_collider();

        let mesh = InfluenceMesher::new(&*scene, &self.settings).generate(
            origin,
            source.range,
            self.settings.influence_mesh_projection_subdivisions,
        );
        let collider = scene.set_mesh_collider(previous, mesh.collision_mesh(), self.settings.influence_mask());

        self.report.influence_meshes += 1;
        if !mesh.within_budget() {
            self.report.over_budget += 1;
        }
        if let Some(object) = manager.object_mut(light) {
            object.influence = Some(mesh);
            object.collider = Some(collider);
        }
    }

    fn count(&self, stage: BakeStage) -> usize {
        self.steps.iter().filter(|step| step.stage() == stage).count()
    }

    fn finish(&mut self, manager: &mut RegionManager) -> BakeReport {
        self.finished = true;
        if self.settings.bake_targets.contains(BakeTargets::OCCLUSION) {
            manager.graph_mut().reconcile();
        }
        self.report.edges = manager.graph().edge_count();
        info!(
            "Bake of '{}' done: {} edges, {} influence meshes ({} over budget)",
            manager.name(),
            self.report.edges,
            self.report.influence_meshes,
            self.report.over_budget
        );
        self.report.clone()
    }
}
