//! # Probe Lighting
//!
//! Spatial queries over baked light probes for blending precomputed global
//! illumination at arbitrary world positions.
//!
//! ## Features
//!
//! - **Irradiance Volumes**: Regular 3D grids of diffuse probes, blended with
//!   trilinear interpolation
//! - **Reflection Volumes**: Single specular probes with box or ellipsoid
//!   influence and roughness-indexed mip selection
//! - **Volume Groups**: Weight normalization across overlapping volumes with a
//!   whole-scene fallback environment
//! - **Allocation-Free Queries**: Results are written into caller-owned,
//!   reusable buffers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use probe_lighting::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scene = ProbeSceneConfig::load_from_file("scenes/atrium.toml")?;
//!     let handler = ProbeVolumeHandler::from_scene(&scene)?;
//!     let mut buffers = handler.query_buffers();
//!
//!     let point = Point3::new(0.0, 1.0, 0.0);
//!     for sample in handler.irradiance_at(point, &mut buffers) {
//!         println!("{:?} -> {}", sample.probe.texture, sample.weight);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod error;
pub mod foundation;
pub mod probes;
pub mod spatial;

pub use error::ProbeVolumeError;

/// Common imports for probe lighting users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, ProbeLightingConfig, ProbeSceneConfig},
        error::ProbeVolumeError,
        foundation::math::{Point3, Quat, Transform, Vec3},
        probes::{
            GlobalEnvVolume, InfluenceType, InfluenceVolume, IrradianceProbeVolume, Probe,
            ProbeKind, ProbeQueryBuffers, ProbeSample, ProbeVolume, ProbeVolumeGroup,
            ProbeVolumeHandler, ReflectionProbeVolume, ReflectionProbeVolumeGroup,
            RoughnessMapping, TextureHandle,
        },
        spatial::AABB,
    };
}
