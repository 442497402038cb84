//! Light probe volumes
//!
//! Owns baked probes, computes each volume's region of influence, and turns
//! a world position into a normalized list of weighted probes for the
//! material layer to bind.
//!
//! ## Components
//!
//! - [`Probe`]: one baked cubemap at a fixed position
//! - [`IrradianceProbeVolume`]: trilinear grid of diffuse probes
//! - [`ReflectionProbeVolume`]: single specular probe with box or ellipsoid falloff
//! - [`ProbeVolumeGroup`]: normalizes overlapping volumes and applies the fallback
//! - [`GlobalEnvVolume`]: whole-scene fallback probe pair
//! - [`ProbeVolumeHandler`]: the object renderers query

mod buffer;
mod definition;
mod global_env;
mod group;
mod handler;
mod irradiance;
mod probe;
mod reflection;
mod volume;

#[cfg(test)]
mod tests;

pub use buffer::{total_weight, ProbeQueryBuffers, ProbeSample, QueryBuffer, VolumeWeight};
pub use definition::{GlobalEnvDefinition, TransformDefinition, VolumeDefinition, VolumeKindDefinition};
pub use global_env::GlobalEnvVolume;
pub use group::{ProbeVolumeGroup, ReflectionProbeVolumeGroup};
pub use handler::ProbeVolumeHandler;
pub use irradiance::IrradianceProbeVolume;
pub use probe::{Probe, ProbeKind, RoughnessMapping, TextureHandle};
pub use reflection::{InfluenceType, ReflectionProbeVolume};
pub use volume::{InfluenceVolume, ProbeVolume};
