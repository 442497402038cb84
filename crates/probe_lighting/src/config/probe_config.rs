//! Probe lighting settings and scene descriptions

use serde::{Deserialize, Serialize};

use super::Config;
use crate::probes::{GlobalEnvDefinition, VolumeDefinition};

/// Settings for probe queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeLightingConfig {
    /// Probe slots reserved in each query buffer
    pub probe_capacity: usize,
    /// Volume slots reserved in each scratch buffer
    pub volume_capacity: usize,
    /// Whether the global environment fills weight not covered by local volumes
    pub attach_global_fallback: bool,
}

impl Default for ProbeLightingConfig {
    fn default() -> Self {
        Self {
            // Two overlapping trilinear cells plus the fallback
            probe_capacity: 17,
            volume_capacity: 8,
            attach_global_fallback: true,
        }
    }
}

impl Config for ProbeLightingConfig {}

/// Volumes and global environment of one scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSceneConfig {
    /// Query settings
    pub lighting: ProbeLightingConfig,
    /// Global environment, if the scene has one
    pub global_env: Option<GlobalEnvDefinition>,
    /// Local volumes
    pub volumes: Vec<VolumeDefinition>,
}

impl Config for ProbeSceneConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::{TextureHandle, VolumeKindDefinition};

    const SCENE_TOML: &str = r#"
[lighting]
probe_capacity = 32

[global_env]
position = [0.0, 2.0, 0.0]
irradiance_texture = 900
reflection_texture = 901
roughness = { start_roughness = 0.0, end_roughness = 1.0, level_count = 8 }

[[volumes]]
name = "hall"
textures = [1, 2, 3, 4, 5, 6, 7, 8]
transform = { position = [0.0, 1.0, 0.0], scale = [4.0, 2.0, 4.0] }
kind = { type = "irradiance", resolution = [2, 2, 2], influence_distance = 0.5 }

[[volumes]]
name = "mirror"
textures = [20]
transform = { position = [3.0, 1.0, 0.0] }
kind = { type = "reflection", influence_type = "ellipsoid", influence_distance = 1.5, falloff = 0.25 }
"#;

    #[test]
    fn test_scene_parses_from_toml() {
        let scene: ProbeSceneConfig = toml::from_str(SCENE_TOML).expect("valid scene");

        assert_eq!(scene.lighting.probe_capacity, 32);
        assert_eq!(scene.lighting.volume_capacity, 8);
        assert_eq!(scene.volumes.len(), 2);
        assert_eq!(scene.volumes[0].textures.len(), 8);
        assert_eq!(scene.volumes[1].transform.scale, [1.0, 1.0, 1.0]);
        assert!(matches!(
            &scene.volumes[1].kind,
            VolumeKindDefinition::Reflection { influence_type, .. } if influence_type == "ellipsoid"
        ));
        let env = scene.global_env.expect("global env");
        assert_eq!(env.reflection_texture, TextureHandle(901));
        assert_eq!(env.roughness.level_count, 8);
    }

    #[test]
    fn test_lighting_config_parses_from_ron() {
        let config: ProbeLightingConfig =
            ron::from_str("(probe_capacity: 9, attach_global_fallback: false)").expect("valid config");

        assert_eq!(config.probe_capacity, 9);
        assert_eq!(config.volume_capacity, 8);
        assert!(!config.attach_global_fallback);
    }
}
