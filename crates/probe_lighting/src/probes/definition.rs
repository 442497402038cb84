//! Serializable volume definitions
//!
//! The asset layer decodes textures and baked metadata into these records;
//! [`super::ProbeVolume::from_definition`] and
//! [`super::GlobalEnvVolume::from_definition`] validate them into volumes.

use serde::{Deserialize, Serialize};

use crate::error::ProbeVolumeError;
use crate::foundation::math::{Quat, Quaternion, Transform, Vec3};

use super::probe::{RoughnessMapping, TextureHandle};

const fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

const fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

/// Position, rotation (quaternion `x, y, z, w`) and scale of a volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformDefinition {
    /// Volume centre
    pub position: [f32; 3],
    /// Half-extents of the volume core
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    /// Orientation as `[x, y, z, w]`
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
}

impl Default for TransformDefinition {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            scale: unit_scale(),
            rotation: identity_rotation(),
        }
    }
}

impl TransformDefinition {
    /// Convert to a [`Transform`], normalizing the rotation
    pub fn to_transform(&self) -> Result<Transform, ProbeVolumeError> {
        let [x, y, z, w] = self.rotation;
        let rotation = Quat::try_new(Quaternion::new(w, x, y, z), f32::EPSILON)
            .ok_or(ProbeVolumeError::DegenerateTransform)?;
        Ok(Transform::new(Vec3::from(self.position), rotation, Vec3::from(self.scale)))
    }
}

/// Layout-specific parameters of a volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VolumeKindDefinition {
    /// Irradiance grid
    Irradiance {
        /// Probes per axis
        resolution: [usize; 3],
        /// Fade distance beyond the core, in local units
        influence_distance: f32,
        /// Falloff fraction
        #[serde(default)]
        falloff: f32,
    },
    /// Reflection probe
    Reflection {
        /// Influence shape tag: `box` or `ellipsoid`
        influence_type: String,
        /// Influence radius multiplier
        influence_distance: f32,
        /// Falloff fraction
        falloff: f32,
        /// Roughness to mip mapping of the probe's blur chain
        #[serde(default)]
        roughness: RoughnessMapping,
    },
}

/// One baked probe volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeDefinition {
    /// Name used in logs and errors
    #[serde(default)]
    pub name: String,
    /// Volume transform
    #[serde(default)]
    pub transform: TransformDefinition,
    /// Layout parameters
    pub kind: VolumeKindDefinition,
    /// Decoded probe textures in linear probe order
    #[serde(default)]
    pub textures: Vec<TextureHandle>,
}

/// Baked whole-scene environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalEnvDefinition {
    /// Capture position
    #[serde(default)]
    pub position: [f32; 3],
    /// Diffuse cubemap
    pub irradiance_texture: TextureHandle,
    /// Prefiltered specular cubemap
    pub reflection_texture: TextureHandle,
    /// Roughness to mip mapping of the specular chain
    #[serde(default)]
    pub roughness: RoughnessMapping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_definition_normalizes_rotation() {
        let definition = TransformDefinition {
            position: [1.0, 2.0, 3.0],
            scale: [2.0, 2.0, 2.0],
            rotation: [0.0, 0.0, 0.0, 2.0],
        };
        let transform = definition.to_transform().expect("valid rotation");

        assert_relative_eq!(transform.rotation, Quat::identity());
        assert_eq!(transform.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_zero_rotation_is_degenerate() {
        let definition = TransformDefinition {
            rotation: [0.0; 4],
            ..Default::default()
        };
        assert_eq!(definition.to_transform(), Err(ProbeVolumeError::DegenerateTransform));
    }
}
