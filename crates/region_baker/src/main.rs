//! Command line baker
//!
//! Loads a RON scene description and optional settings file, bakes the region
//! graph and influence meshes and prints what came out.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use log::info;
use serde::Serialize;

use light_regions::foundation::logging;
use light_regions::prelude::*;

mod scene;
use scene::SceneFile;

#[derive(Debug, Serialize)]
struct RegionSummary {
    name: String,
    connected: Vec<String>,
    lights: usize,
}

#[derive(Debug, Serialize)]
struct LightSummary {
    name: String,
    vertices: usize,
    triangles: usize,
    subdivisions: u32,
    within_budget: bool,
}

#[derive(Debug, Serialize)]
struct BakeSummary {
    manager: String,
    edges: usize,
    regions: Vec<RegionSummary>,
    lights: Vec<LightSummary>,
}

fn summarize(manager: &RegionManager, report: &BakeReport) -> BakeSummary {
    let regions = manager
        .regions()
        .map(|region| RegionSummary {
            name: region.name().to_string(),
            connected: region
                .connected_regions()
                .iter()
                .filter_map(|&id| manager.region(id).map(|r| r.name().to_string()))
                .collect(),
            lights: region.lights().len(),
        })
        .collect();

    let lights = manager
        .objects()
        .filter_map(|object| {
            let mesh = object.influence_mesh()?;
            Some(LightSummary {
                name: object.name().to_string(),
                vertices: mesh.vertices().len(),
                triangles: mesh.indices().len() / 3,
                subdivisions: mesh.subdivisions(),
                within_budget: mesh.within_budget(),
            })
        })
        .collect();

    BakeSummary {
        manager: manager.name().to_string(),
        edges: report.edges,
        regions,
        lights,
    }
}

fn main() -> Result<()> {
    logging::init();

    let matches = Command::new("region_baker")
        .about("Bakes light region connectivity and influence meshes from a scene description")
        .arg(
            Arg::new("scene")
                .value_name("SCENE")
                .help("RON scene description")
                .required(true),
        )
        .arg(
            Arg::new("settings")
                .short('s')
                .long("settings")
                .value_name("FILE")
                .help("Bake settings (.toml or .ron)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .help("Seed for repeatable bakes")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("occlusion-only")
                .long("occlusion-only")
                .help("Skip influence meshes")
                .action(ArgAction::SetTrue)
                .conflicts_with("influence-only"),
        )
        .arg(
            Arg::new("influence-only")
                .long("influence-only")
                .help("Skip region connectivity")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the bake summary as RON"),
        )
        .get_matches();

    let mut settings = match matches.get_one::<String>("settings") {
        Some(path) => LightRegionsSettings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {path}"))?,
        None => LightRegionsSettings::default(),
    };
    if let Some(seed) = matches.get_one::<u64>("seed") {
        settings.seed = Some(*seed);
    }
    if matches.get_flag("occlusion-only") {
        settings.bake_targets = BakeTargets::OCCLUSION;
    } else if matches.get_flag("influence-only") {
        settings.bake_targets = BakeTargets::INFLUENCE;
    }

    let scene_path = matches
        .get_one::<String>("scene")
        .map(PathBuf::from)
        .context("Missing scene path")?;
    let scene_file = SceneFile::load(&scene_path)?;
    let (mut manager, mut scene) = scene_file.build(&settings)?;
    info!(
        "Loaded '{}': {} regions, {} objects, {} occluders",
        manager.name(),
        manager.region_count(),
        manager.objects().count(),
        scene.collider_count()
    );

    let report = BakeTask::start(&mut manager, &settings)?.run(&mut manager, &mut scene)?;
    let summary = summarize(&manager, &report);

    println!("Baked '{}': {} edges", summary.manager, summary.edges);
    for region in &summary.regions {
        println!(
            "  {} ({} lights) -> [{}]",
            region.name,
            region.lights,
            region.connected.join(", ")
        );
    }
    for light in &summary.lights {
        println!(
            "  influence '{}': {} vertices, {} triangles, subdivisions {}{}",
            light.name,
            light.vertices,
            light.triangles,
            light.subdivisions,
            if light.within_budget { "" } else { " (over budget)" }
        );
    }
    if report.skipped_lights > 0 {
        println!("  {} lights skipped without light data", report.skipped_lights);
    }

    if let Some(output) = matches.get_one::<String>("output") {
        let contents = ron::ser::to_string_pretty(&summary, ron::ser::PrettyConfig::default())
            .context("Failed to serialize bake summary")?;
        std::fs::write(output, contents).with_context(|| format!("Failed to write {output}"))?;
        info!("Wrote bake summary to {}", output);
    }

    Ok(())
}
