//! Baked probe records and roughness-to-mip mapping

use serde::{Deserialize, Serialize};

use crate::error::ProbeVolumeError;
use crate::foundation::math::Point3;

/// Opaque handle to a decoded probe texture owned by the asset layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureHandle(pub u64);

/// Maps material roughness onto a level of a reflection probe's blur chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoughnessMapping {
    /// Roughness at and below which mip 0 is sampled
    pub start_roughness: f32,
    /// Roughness at and above which the last level is sampled
    pub end_roughness: f32,
    /// Number of levels in the prefiltered chain
    pub level_count: u32,
}

impl Default for RoughnessMapping {
    fn default() -> Self {
        Self {
            start_roughness: 0.0,
            end_roughness: 1.0,
            level_count: 5,
        }
    }
}

impl RoughnessMapping {
    /// Create a validated mapping
    pub fn new(start_roughness: f32, end_roughness: f32, level_count: u32) -> Result<Self, ProbeVolumeError> {
        let mapping = Self {
            start_roughness,
            end_roughness,
            level_count,
        };
        mapping.validate()?;
        Ok(mapping)
    }

    /// Check that the roughness range is non-empty
    pub fn validate(&self) -> Result<(), ProbeVolumeError> {
        let finite = self.start_roughness.is_finite() && self.end_roughness.is_finite();
        if !finite || self.end_roughness <= self.start_roughness {
            return Err(ProbeVolumeError::InvalidRoughnessRange {
                start: self.start_roughness,
                end: self.end_roughness,
            });
        }
        Ok(())
    }

    /// Mip level for a roughness value, clamped to `[0, level_count]`
    pub fn roughness_to_mip(&self, roughness: f32) -> f32 {
        let span = self.end_roughness - self.start_roughness;
        let t = if span > 0.0 {
            ((roughness - self.start_roughness) / span).clamp(0.0, 1.0)
        } else if roughness >= self.start_roughness {
            1.0
        } else {
            0.0
        };
        t * self.level_count as f32
    }
}

/// Which lighting term a probe was baked for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeKind {
    /// Diffuse irradiance cubemap
    Irradiance,
    /// Prefiltered specular cubemap with its roughness mapping
    Reflection(RoughnessMapping),
}

/// A single baked lighting sample at a fixed world position
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    /// World-space capture position
    pub position: Point3,
    /// Decoded cubemap texture
    pub texture: TextureHandle,
    /// Probe kind
    pub kind: ProbeKind,
}

impl Probe {
    /// Create an irradiance probe
    pub fn irradiance(position: Point3, texture: TextureHandle) -> Self {
        Self {
            position,
            texture,
            kind: ProbeKind::Irradiance,
        }
    }

    /// Create a reflection probe
    pub fn reflection(position: Point3, texture: TextureHandle, mapping: RoughnessMapping) -> Self {
        Self {
            position,
            texture,
            kind: ProbeKind::Reflection(mapping),
        }
    }

    /// Roughness mapping for reflection probes
    pub fn roughness_mapping(&self) -> Option<&RoughnessMapping> {
        match &self.kind {
            ProbeKind::Irradiance => None,
            ProbeKind::Reflection(mapping) => Some(mapping),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_roughness_to_mip_clamps_to_level_range() {
        let mapping = RoughnessMapping::new(0.2, 0.8, 6).expect("valid range");

        assert_eq!(mapping.roughness_to_mip(0.0), 0.0);
        assert_eq!(mapping.roughness_to_mip(0.2), 0.0);
        assert_relative_eq!(mapping.roughness_to_mip(0.5), 3.0, epsilon = 1e-5);
        assert_eq!(mapping.roughness_to_mip(0.8), 6.0);
        assert_eq!(mapping.roughness_to_mip(5.0), 6.0);
    }

    #[test]
    fn test_roughness_to_mip_is_non_decreasing() {
        let mapping = RoughnessMapping::new(0.1, 0.9, 8).expect("valid range");
        let mut previous = f32::NEG_INFINITY;
        for step in 0..=100 {
            let mip = mapping.roughness_to_mip(step as f32 / 100.0 * 1.2 - 0.1);
            assert!(mip >= previous);
            assert!((0.0..=8.0).contains(&mip));
            previous = mip;
        }
    }

    #[test]
    fn test_inverted_roughness_range_rejected() {
        assert_eq!(
            RoughnessMapping::new(0.7, 0.3, 4),
            Err(ProbeVolumeError::InvalidRoughnessRange { start: 0.7, end: 0.3 })
        );
    }

    #[test]
    fn test_probe_kind_mapping_access() {
        let irradiance = Probe::irradiance(Point3::origin(), TextureHandle(1));
        let reflection = Probe::reflection(Point3::origin(), TextureHandle(2), RoughnessMapping::default());

        assert!(irradiance.roughness_mapping().is_none());
        assert_eq!(reflection.roughness_mapping().map(|m| m.level_count), Some(5));
    }
}
