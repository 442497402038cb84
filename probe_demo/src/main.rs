//! Probe Query Demo
//!
//! Loads a probe scene description, registers its volumes and walks a
//! query point across the scene, logging the blended probe lists:
//! - Irradiance probes with their trilinear weights
//! - Reflection probes with weights and mip levels for a few roughness values
//!
//! Usage: `probe_demo [scene.toml|scene.ron]` (defaults to `scenes/atrium.toml`).
//! Set `RUST_LOG=info` (or `debug`) to see the output.

use probe_lighting::foundation::logging;
use probe_lighting::prelude::*;
use thiserror::Error;

const DEFAULT_SCENE: &str = "scenes/atrium.toml";

// Walk settings
const WALK_START: [f32; 3] = [-9.0, 1.0, 0.0];
const WALK_END: [f32; 3] = [9.0, 1.0, 0.0];
const WALK_STEPS: usize = 12;
const ROUGHNESS_SAMPLES: [f32; 3] = [0.0, 0.5, 1.0];

#[derive(Error, Debug)]
enum DemoError {
    #[error("Failed to load scene: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid probe data: {0}")]
    Probes(#[from] ProbeVolumeError),
}

fn main() {
    logging::init();

    let scene_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SCENE.to_string());
    if let Err(e) = run(&scene_path) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(scene_path: &str) -> Result<(), DemoError> {
    log::info!("Loading probe scene from {}", scene_path);
    let scene = ProbeSceneConfig::load_from_file(scene_path)?;
    let handler = ProbeVolumeHandler::from_scene(&scene)?;
    let mut buffers = handler.query_buffers();

    let start = Vec3::from(WALK_START);
    let end = Vec3::from(WALK_END);
    for step in 0..=WALK_STEPS {
        let t = step as f32 / WALK_STEPS as f32;
        let point = Point3::from(start.lerp(&end, t));
        log::info!("Query at ({:.2}, {:.2}, {:.2})", point.x, point.y, point.z);

        let irradiance = handler.irradiance_at(point, &mut buffers);
        log::info!(
            "  irradiance: {} probes, total weight {:.3}",
            irradiance.len(),
            irradiance.iter().map(|s| s.weight).sum::<f32>()
        );
        for sample in irradiance {
            log::debug!("    texture {:>4} weight {:.3}", sample.probe.texture.0, sample.weight);
        }

        for roughness in ROUGHNESS_SAMPLES {
            let reflection = handler.reflection_at(point, roughness, &mut buffers);
            let summary: Vec<String> = reflection
                .iter()
                .map(|s| format!("#{}@{:.2} mip {:.1}", s.probe.texture.0, s.weight, s.mip_level))
                .collect();
            log::info!("  reflection (roughness {:.1}): [{}]", roughness, summary.join(", "));
        }
    }

    Ok(())
}
