//! Reflection probe volumes
//!
//! One prefiltered specular probe with an analytic box or ellipsoid
//! influence. The falloff is evaluated relative to the volume's scaled
//! influence distance, so the same volume can be rotated and stretched
//! freely.

use std::rc::Rc;
use std::str::FromStr;

use crate::error::ProbeVolumeError;
use crate::foundation::math::utils::saturate;
use crate::foundation::math::{Mat4, Point3, Transform, Vec3};
use crate::spatial::AABB;

use super::buffer::{ProbeSample, QueryBuffer};
use super::global_env::GlobalEnvVolume;
use super::probe::{Probe, RoughnessMapping, TextureHandle};
use super::volume::{BoundsCache, InfluenceVolume};

/// Shape of a reflection volume's influence region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfluenceType {
    /// Oriented box; falloff is applied per axis
    Box,
    /// Ellipsoid inscribed in the box; falloff is radial
    Ellipsoid,
}

impl FromStr for InfluenceType {
    type Err = ProbeVolumeError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "box" => Ok(Self::Box),
            "ellipsoid" => Ok(Self::Ellipsoid),
            _ => Err(ProbeVolumeError::UnknownInfluenceType(tag.to_string())),
        }
    }
}

/// Single reflection probe with box or ellipsoid influence
#[derive(Debug, Clone)]
pub struct ReflectionProbeVolume {
    name: String,
    transform: Transform,
    influence_type: InfluenceType,
    influence_distance: f32,
    falloff: f32,
    roughness: RoughnessMapping,
    probe: Rc<Probe>,
    bounds: BoundsCache,
}

impl ReflectionProbeVolume {
    /// Create a volume around its single probe, captured at the volume position
    ///
    /// `falloff` is the fraction of the influence radius over which the
    /// volume fades out; 0 gives a hard edge.
    pub fn new(
        name: impl Into<String>,
        transform: Transform,
        influence_type: InfluenceType,
        influence_distance: f32,
        falloff: f32,
        roughness: RoughnessMapping,
        textures: &[TextureHandle],
    ) -> Result<Self, ProbeVolumeError> {
        let name = name.into();
        if !influence_distance.is_finite() || influence_distance <= 0.0 {
            return Err(ProbeVolumeError::InvalidInfluence {
                name: "influence distance",
                value: influence_distance,
            });
        }
        if !(0.0..=1.0).contains(&falloff) {
            return Err(ProbeVolumeError::InvalidInfluence {
                name: "falloff",
                value: falloff,
            });
        }
        roughness.validate()?;
        let texture = match textures {
            [] => return Err(ProbeVolumeError::MissingProbeTexture(name)),
            [texture] => *texture,
            _ => {
                return Err(ProbeVolumeError::ProbeCountMismatch {
                    expected: 1,
                    actual: textures.len(),
                })
            }
        };
        if transform.inverse_matrix().is_none() {
            return Err(ProbeVolumeError::DegenerateTransform);
        }

        log::debug!(
            "Created reflection volume '{}' ({:?}, influence {})",
            name, influence_type, influence_distance
        );

        let probe = Rc::new(Probe::reflection(Point3::from(transform.position), texture, roughness));
        Ok(Self {
            name,
            transform,
            influence_type,
            influence_distance,
            falloff,
            roughness,
            probe,
            bounds: BoundsCache::default(),
        })
    }

    /// Volume name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Volume transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Influence shape
    pub fn influence_type(&self) -> InfluenceType {
        self.influence_type
    }

    /// Influence radius multiplier applied to the scale
    pub fn influence_distance(&self) -> f32 {
        self.influence_distance
    }

    /// Falloff fraction
    pub fn falloff(&self) -> f32 {
        self.falloff
    }

    /// The volume's probe
    pub fn probe(&self) -> &Rc<Probe> {
        &self.probe
    }

    /// Roughness mapping baked with the probe
    pub fn roughness_mapping(&self) -> &RoughnessMapping {
        &self.roughness
    }

    /// Mip level of this probe's blur chain for a material roughness
    pub fn roughness_to_mip(&self, roughness: f32) -> f32 {
        self.roughness.roughness_to_mip(roughness)
    }

    /// Offset from the volume centre as a fraction of the influence radius, per local axis
    fn relative_offset(&self, point: &Point3) -> Vec3 {
        let local = self.transform.to_local_direction(point.coords - self.transform.position);
        let radius = self.transform.scale.map(f32::abs) * self.influence_distance;
        local.abs().component_div(&radius)
    }

    fn edge_ratio(&self, distance_to_edge: f32) -> f32 {
        if self.falloff <= 0.0 {
            if distance_to_edge > 0.0 { 1.0 } else { 0.0 }
        } else {
            distance_to_edge / self.falloff
        }
    }
}

impl InfluenceVolume for ReflectionProbeVolume {
    fn bounds(&self) -> AABB {
        self.bounds.get_or_compute(|| {
            let influence = Mat4::new_scaling(self.influence_distance);
            AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(1.0))
                .transformed(&(self.transform.to_matrix() * influence))
        })
    }

    fn global_ratio(&self, point: &Point3) -> f32 {
        if !self.bounds().contains_point(point) {
            return 0.0;
        }
        let relative = self.relative_offset(point);
        let ratio = match self.influence_type {
            InfluenceType::Box => relative
                .iter()
                .map(|&axis| self.edge_ratio(1.0 - axis).min(1.0))
                .fold(1.0, f32::min),
            InfluenceType::Ellipsoid => self.edge_ratio(1.0 - relative.norm()),
        };
        saturate(ratio)
    }

    fn surrounding_probes(
        &self,
        _point: &Point3,
        weight: f32,
        out: &mut QueryBuffer<ProbeSample>,
        offset: usize,
    ) -> usize {
        out.write(offset, ProbeSample::new(Rc::clone(&self.probe), weight));
        1
    }

    fn probe_count(&self) -> usize {
        1
    }

    fn fallback_probe(env: &GlobalEnvVolume) -> &Rc<Probe> {
        env.reflection_probe()
    }
}
