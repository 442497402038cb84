//! Composition root for probe queries

use std::rc::Rc;

use crate::config::{ProbeLightingConfig, ProbeSceneConfig};
use crate::error::ProbeVolumeError;
use crate::foundation::math::Point3;

use super::buffer::{ProbeQueryBuffers, ProbeSample};
use super::global_env::GlobalEnvVolume;
use super::group::{ProbeVolumeGroup, ReflectionProbeVolumeGroup};
use super::irradiance::IrradianceProbeVolume;
use super::volume::ProbeVolume;

/// Irradiance and reflection groups plus the global environment that backs them
///
/// Volumes are registered during scene load; afterwards the rendering stage
/// queries the groups once per shaded point.
#[derive(Debug, Default)]
pub struct ProbeVolumeHandler {
    /// Diffuse volumes
    pub irradiance_volumes: ProbeVolumeGroup<IrradianceProbeVolume>,
    /// Specular volumes
    pub reflection_volumes: ReflectionProbeVolumeGroup,
    global_env: Option<Rc<GlobalEnvVolume>>,
    config: ProbeLightingConfig,
}

impl ProbeVolumeHandler {
    /// Create an empty handler with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty handler with the given settings
    pub fn with_config(config: ProbeLightingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Build every volume of a scene description
    ///
    /// Fails on the first malformed definition.
    pub fn from_scene(scene: &ProbeSceneConfig) -> Result<Self, ProbeVolumeError> {
        let mut handler = Self::with_config(scene.lighting.clone());
        if let Some(definition) = &scene.global_env {
            handler.set_global_env(Some(Rc::new(GlobalEnvVolume::from_definition(definition)?)));
        }
        let mut probe_total = 0;
        for definition in &scene.volumes {
            let volume = ProbeVolume::from_definition(definition)?;
            probe_total += volume.probe_count();
            handler.add_volume(volume);
        }
        log::info!(
            "Loaded probe scene: {} irradiance volumes, {} reflection volumes, {} probes, global environment: {}",
            handler.irradiance_volumes.len(),
            handler.reflection_volumes.len(),
            probe_total,
            handler.global_env.is_some()
        );
        Ok(handler)
    }

    /// Settings in use
    pub fn config(&self) -> &ProbeLightingConfig {
        &self.config
    }

    /// Register a volume in the group matching its kind
    ///
    /// Returns false if that exact volume is already registered.
    pub fn add_volume(&mut self, volume: ProbeVolume) -> bool {
        match volume {
            ProbeVolume::Irradiance(volume) => self.irradiance_volumes.add_volume(volume),
            ProbeVolume::Reflection(volume) => self.reflection_volumes.add_volume(volume),
        }
    }

    /// Unregister a volume; returns false if it was not registered
    pub fn remove_volume(&mut self, volume: &ProbeVolume) -> bool {
        match volume {
            ProbeVolume::Irradiance(volume) => self.irradiance_volumes.remove_volume(volume),
            ProbeVolume::Reflection(volume) => self.reflection_volumes.remove_volume(volume),
        }
    }

    /// Remove every volume, keeping the global environment
    pub fn clear(&mut self) {
        self.irradiance_volumes.clear();
        self.reflection_volumes.clear();
    }

    /// Replace the global environment
    ///
    /// It becomes the fallback of both groups unless
    /// [`ProbeLightingConfig::attach_global_fallback`] is disabled.
    pub fn set_global_env(&mut self, global_env: Option<Rc<GlobalEnvVolume>>) {
        let fallback = global_env.clone().filter(|_| self.config.attach_global_fallback);
        self.irradiance_volumes.set_fallback(fallback.clone());
        self.reflection_volumes.set_fallback(fallback);
        self.global_env = global_env;
    }

    /// Current global environment
    pub fn global_env(&self) -> Option<&Rc<GlobalEnvVolume>> {
        self.global_env.as_ref()
    }

    /// Fresh query buffers sized from the configuration
    pub fn query_buffers(&self) -> ProbeQueryBuffers {
        ProbeQueryBuffers::with_capacity(self.config.probe_capacity, self.config.volume_capacity)
    }

    /// Weighted irradiance probes at `point`
    pub fn irradiance_at<'b>(&self, point: Point3, buffers: &'b mut ProbeQueryBuffers) -> &'b [ProbeSample] {
        self.irradiance_volumes
            .surrounding_probes(&point, &mut buffers.probes, &mut buffers.volumes);
        buffers.probes.as_slice()
    }

    /// Weighted reflection probes at `point` with mip levels for `roughness`
    pub fn reflection_at<'b>(
        &self,
        point: Point3,
        roughness: f32,
        buffers: &'b mut ProbeQueryBuffers,
    ) -> &'b [ProbeSample] {
        self.reflection_volumes
            .surrounding_probes(&point, &mut buffers.probes, &mut buffers.volumes, roughness);
        buffers.probes.as_slice()
    }
}
