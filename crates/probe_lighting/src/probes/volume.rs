//! Shared probe volume contract
//!
//! A probe volume is an oriented region with a falloff function and a way to
//! pick the probes surrounding a point. The two concrete layouts implement
//! [`InfluenceVolume`]; [`ProbeVolume`] is the closed sum over them that the
//! loader hands to [`super::ProbeVolumeHandler`].

use std::cell::Cell;
use std::rc::Rc;

use crate::error::ProbeVolumeError;
use crate::foundation::math::Point3;
use crate::spatial::AABB;

use super::buffer::{ProbeSample, QueryBuffer};
use super::definition::{VolumeDefinition, VolumeKindDefinition};
use super::global_env::GlobalEnvVolume;
use super::irradiance::IrradianceProbeVolume;
use super::probe::Probe;
use super::reflection::{InfluenceType, ReflectionProbeVolume};

/// Query interface shared by every probe volume layout
pub trait InfluenceVolume {
    /// World-space box outside of which the volume has no influence
    ///
    /// Computed on first access and cached until the volume is marked dirty.
    fn bounds(&self) -> AABB;

    /// Falloff ratio in `[0, 1]`: 0 outside the influence boundary, 1 in the core
    fn global_ratio(&self, point: &Point3) -> f32;

    /// Write the probes surrounding `point` starting at `out[offset]`
    ///
    /// The written weights sum to `weight`. `offset` must not exceed the
    /// buffer's current length. Returns the number of entries written.
    fn surrounding_probes(
        &self,
        point: &Point3,
        weight: f32,
        out: &mut QueryBuffer<ProbeSample>,
        offset: usize,
    ) -> usize;

    /// Number of probes owned by the volume
    fn probe_count(&self) -> usize;

    /// Probe of the global environment that stands in for this kind of volume
    fn fallback_probe(env: &GlobalEnvVolume) -> &Rc<Probe>
    where
        Self: Sized;
}

/// Lazily computed bounds with an explicit dirty state
#[derive(Debug, Clone, Default)]
pub(crate) struct BoundsCache {
    cached: Cell<Option<AABB>>,
}

impl BoundsCache {
    /// Return the cached box, recomputing it first if it is dirty
    pub(crate) fn get_or_compute(&self, compute: impl FnOnce() -> AABB) -> AABB {
        if let Some(bounds) = self.cached.get() {
            return bounds;
        }
        let bounds = compute();
        self.cached.set(Some(bounds));
        bounds
    }

    /// Force recomputation on the next access
    pub(crate) fn mark_dirty(&self) {
        self.cached.set(None);
    }

    #[cfg(test)]
    pub(crate) fn is_dirty(&self) -> bool {
        self.cached.get().is_none()
    }
}

/// A probe volume of either layout
#[derive(Debug, Clone)]
pub enum ProbeVolume {
    /// Grid of irradiance probes
    Irradiance(Rc<IrradianceProbeVolume>),
    /// Single reflection probe
    Reflection(Rc<ReflectionProbeVolume>),
}

impl ProbeVolume {
    /// Build a volume from its baked definition
    pub fn from_definition(definition: &VolumeDefinition) -> Result<Self, ProbeVolumeError> {
        let transform = definition.transform.to_transform()?;
        let volume = match &definition.kind {
            VolumeKindDefinition::Irradiance {
                resolution,
                influence_distance,
                falloff,
            } => Self::Irradiance(Rc::new(IrradianceProbeVolume::new(
                definition.name.clone(),
                transform,
                *resolution,
                *influence_distance,
                *falloff,
                &definition.textures,
            )?)),
            VolumeKindDefinition::Reflection {
                influence_type,
                influence_distance,
                falloff,
                roughness,
            } => Self::Reflection(Rc::new(ReflectionProbeVolume::new(
                definition.name.clone(),
                transform,
                influence_type.parse::<InfluenceType>()?,
                *influence_distance,
                *falloff,
                *roughness,
                &definition.textures,
            )?)),
        };
        Ok(volume)
    }

    /// Volume name from the baked data
    pub fn name(&self) -> &str {
        match self {
            Self::Irradiance(volume) => volume.name(),
            Self::Reflection(volume) => volume.name(),
        }
    }

    /// See [`InfluenceVolume::probe_count`]
    pub fn probe_count(&self) -> usize {
        match self {
            Self::Irradiance(volume) => volume.probe_count(),
            Self::Reflection(volume) => volume.probe_count(),
        }
    }

    /// See [`InfluenceVolume::bounds`]
    pub fn bounds(&self) -> AABB {
        match self {
            Self::Irradiance(volume) => volume.bounds(),
            Self::Reflection(volume) => volume.bounds(),
        }
    }

    /// See [`InfluenceVolume::global_ratio`]
    pub fn global_ratio(&self, point: &Point3) -> f32 {
        match self {
            Self::Irradiance(volume) => volume.global_ratio(point),
            Self::Reflection(volume) => volume.global_ratio(point),
        }
    }
}

impl From<IrradianceProbeVolume> for ProbeVolume {
    fn from(volume: IrradianceProbeVolume) -> Self {
        Self::Irradiance(Rc::new(volume))
    }
}

impl From<ReflectionProbeVolume> for ProbeVolume {
    fn from(volume: ReflectionProbeVolume) -> Self {
        Self::Reflection(Rc::new(volume))
    }
}
