//! Whole-scene fallback environment

use std::rc::Rc;

use crate::error::ProbeVolumeError;
use crate::foundation::math::Point3;

use super::definition::GlobalEnvDefinition;
use super::probe::{Probe, RoughnessMapping, TextureHandle};

/// Irradiance and reflection probe pair covering the whole scene
///
/// Groups read it to fill whatever weight their local volumes leave
/// unassigned. It has no queries of its own.
#[derive(Debug, Clone)]
pub struct GlobalEnvVolume {
    position: Point3,
    irradiance_probe: Rc<Probe>,
    reflection_probe: Rc<Probe>,
    roughness: RoughnessMapping,
}

impl GlobalEnvVolume {
    /// Create the environment from its two decoded cubemaps
    pub fn new(
        position: Point3,
        irradiance_texture: TextureHandle,
        reflection_texture: TextureHandle,
        roughness: RoughnessMapping,
    ) -> Result<Self, ProbeVolumeError> {
        roughness.validate()?;
        Ok(Self {
            position,
            irradiance_probe: Rc::new(Probe::irradiance(position, irradiance_texture)),
            reflection_probe: Rc::new(Probe::reflection(position, reflection_texture, roughness)),
            roughness,
        })
    }

    /// Build the environment from its baked definition
    pub fn from_definition(definition: &GlobalEnvDefinition) -> Result<Self, ProbeVolumeError> {
        Self::new(
            Point3::from(definition.position),
            definition.irradiance_texture,
            definition.reflection_texture,
            definition.roughness,
        )
    }

    /// Capture position
    pub fn position(&self) -> &Point3 {
        &self.position
    }

    /// Diffuse fallback probe
    pub fn irradiance_probe(&self) -> &Rc<Probe> {
        &self.irradiance_probe
    }

    /// Specular fallback probe
    pub fn reflection_probe(&self) -> &Rc<Probe> {
        &self.reflection_probe
    }

    /// Scene-wide roughness mapping
    pub fn roughness_mapping(&self) -> &RoughnessMapping {
        &self.roughness
    }

    /// Mip level of the fallback reflection chain for a material roughness
    pub fn roughness_to_mip(&self, roughness: f32) -> f32 {
        self.roughness.roughness_to_mip(roughness)
    }
}
