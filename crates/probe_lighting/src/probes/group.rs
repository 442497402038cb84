//! Volume groups
//!
//! A group blends every same-kind volume overlapping a query point. It is the
//! only place where weights from different volumes are combined: each member
//! reports a raw falloff ratio, the group normalizes the ratios, and every
//! volume then distributes its normalized share over its own probes.
//!
//! Normalization rule: ratios are divided by their sum, except that with a
//! fallback configured the divisor is floored at 1. Any mass missing below
//! 1 is then handed to the fallback probe, so the final weights always sum
//! to 1 when anything contributes.

use std::rc::Rc;

use crate::foundation::math::Point3;
use crate::spatial::AABB;

use super::buffer::{ProbeSample, QueryBuffer, VolumeWeight};
use super::global_env::GlobalEnvVolume;
use super::reflection::ReflectionProbeVolume;
use super::volume::{BoundsCache, InfluenceVolume};

/// Remaining weight below which no fallback entry is emitted
const FALLBACK_WEIGHT_EPSILON: f32 = 1e-6;

/// Collection of same-kind probe volumes with an optional fallback
///
/// Output order follows insertion order; overlapping volumes with equal
/// ratios are not reordered.
#[derive(Debug)]
pub struct ProbeVolumeGroup<T> {
    volumes: Vec<Rc<T>>,
    bounds: BoundsCache,
    fallback: Option<Rc<GlobalEnvVolume>>,
}

impl<T> Default for ProbeVolumeGroup<T> {
    fn default() -> Self {
        Self {
            volumes: Vec::new(),
            bounds: BoundsCache::default(),
            fallback: None,
        }
    }
}

impl<T: InfluenceVolume> ProbeVolumeGroup<T> {
    /// Create an empty group without fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty group that falls back to `fallback`
    pub fn with_fallback(fallback: Rc<GlobalEnvVolume>) -> Self {
        Self {
            fallback: Some(fallback),
            ..Self::default()
        }
    }

    /// Register a volume; returns false if this exact volume is already a member
    pub fn add_volume(&mut self, volume: Rc<T>) -> bool {
        if self.contains(&volume) {
            log::warn!("Ignoring duplicate probe volume registration");
            return false;
        }
        self.volumes.push(volume);
        self.bounds.mark_dirty();
        log::debug!("Probe volume group now holds {} volumes", self.volumes.len());
        true
    }

    /// Unregister a volume; returns false if it was not a member
    pub fn remove_volume(&mut self, volume: &Rc<T>) -> bool {
        let Some(index) = self.volumes.iter().position(|v| Rc::ptr_eq(v, volume)) else {
            return false;
        };
        self.volumes.remove(index);
        self.bounds.mark_dirty();
        log::debug!("Probe volume group now holds {} volumes", self.volumes.len());
        true
    }

    /// Remove every volume
    pub fn clear(&mut self) {
        self.volumes.clear();
        self.bounds.mark_dirty();
    }

    /// Returns true if this exact volume is a member
    pub fn contains(&self, volume: &Rc<T>) -> bool {
        self.volumes.iter().any(|v| Rc::ptr_eq(v, volume))
    }

    /// Number of member volumes
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Returns true if the group has no volumes
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Member at `index`, as referenced by [`VolumeWeight::volume`]
    pub fn volume(&self, index: usize) -> Option<&Rc<T>> {
        self.volumes.get(index)
    }

    /// Members in insertion order
    pub fn volumes(&self) -> &[Rc<T>] {
        &self.volumes
    }

    /// Set or clear the fallback environment
    pub fn set_fallback(&mut self, fallback: Option<Rc<GlobalEnvVolume>>) {
        self.fallback = fallback;
    }

    /// Fallback environment, if any
    pub fn fallback(&self) -> Option<&Rc<GlobalEnvVolume>> {
        self.fallback.as_ref()
    }

    /// Union of the member bounds, recomputed only after membership changes
    pub fn bounds(&self) -> AABB {
        self.bounds.get_or_compute(|| {
            self.volumes
                .iter()
                .fold(AABB::empty(), |bounds, volume| bounds.union(&volume.bounds()))
        })
    }

    /// Write the normalized ratio of every member influencing `point`
    ///
    /// Returns the number of entries written to `out`.
    pub fn global_ratio(&self, point: &Point3, out: &mut QueryBuffer<VolumeWeight>) -> usize {
        out.clear();
        if !self.bounds().contains_point(point) {
            return 0;
        }

        let mut written = 0;
        let mut total_ratio = 0.0;
        for (index, volume) in self.volumes.iter().enumerate() {
            let ratio = volume.global_ratio(point);
            if ratio > 0.0 {
                out.write(written, VolumeWeight { volume: index, ratio });
                written += 1;
                total_ratio += ratio;
            }
        }
        if written == 0 {
            return 0;
        }

        let divisor = if self.fallback.is_some() {
            total_ratio.max(1.0)
        } else {
            total_ratio
        };
        for entry in out.as_mut_slice() {
            entry.ratio /= divisor;
        }
        written
    }

    /// Write the weighted probes blended at `point` into `out`
    ///
    /// `scratch` receives the per-volume ratios. Returns the number of
    /// probes written; `out` is truncated to that length.
    pub fn surrounding_probes(
        &self,
        point: &Point3,
        out: &mut QueryBuffer<ProbeSample>,
        scratch: &mut QueryBuffer<VolumeWeight>,
    ) -> usize {
        self.compose(point, out, scratch, |_, _| {}, |_, _| {})
    }

    /// Shared composition with hooks over each volume's freshly written span
    /// and over the fallback entry before it is stored
    fn compose<V, F>(
        &self,
        point: &Point3,
        out: &mut QueryBuffer<ProbeSample>,
        scratch: &mut QueryBuffer<VolumeWeight>,
        mut on_volume: V,
        on_fallback: F,
    ) -> usize
    where
        V: FnMut(&T, &mut [ProbeSample]),
        F: FnOnce(&GlobalEnvVolume, &mut ProbeSample),
    {
        self.global_ratio(point, scratch);
        out.clear();

        let mut offset = 0;
        let mut total_probe_ratio = 0.0;
        for entry in scratch.iter() {
            let volume: &T = &self.volumes[entry.volume];
            let written = volume.surrounding_probes(point, entry.ratio, out, offset);
            on_volume(volume, &mut out.as_mut_slice()[offset..offset + written]);
            offset += written;
            total_probe_ratio += entry.ratio;
        }

        if let Some(env) = self.fallback.as_deref() {
            let remaining = 1.0 - total_probe_ratio;
            if remaining > FALLBACK_WEIGHT_EPSILON {
                log::trace!("Global fallback covers {:.3} of the probe weight", remaining);
                let mut sample = ProbeSample::new(Rc::clone(T::fallback_probe(env)), remaining);
                on_fallback(env, &mut sample);
                out.write(offset, sample);
                offset += 1;
            }
        }

        out.truncate(offset);
        offset
    }
}

/// Reflection group that also selects a mip level for every probe
///
/// Each entry is stamped with its own volume's roughness mapping; the
/// fallback entry uses the global environment's mapping.
#[derive(Debug, Default)]
pub struct ReflectionProbeVolumeGroup {
    group: ProbeVolumeGroup<ReflectionProbeVolume>,
}

impl ReflectionProbeVolumeGroup {
    /// Create an empty group without fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty group that falls back to `fallback`
    pub fn with_fallback(fallback: Rc<GlobalEnvVolume>) -> Self {
        Self {
            group: ProbeVolumeGroup::with_fallback(fallback),
        }
    }

    /// Underlying volume group
    pub fn group(&self) -> &ProbeVolumeGroup<ReflectionProbeVolume> {
        &self.group
    }

    /// See [`ProbeVolumeGroup::add_volume`]
    pub fn add_volume(&mut self, volume: Rc<ReflectionProbeVolume>) -> bool {
        self.group.add_volume(volume)
    }

    /// See [`ProbeVolumeGroup::remove_volume`]
    pub fn remove_volume(&mut self, volume: &Rc<ReflectionProbeVolume>) -> bool {
        self.group.remove_volume(volume)
    }

    /// See [`ProbeVolumeGroup::clear`]
    pub fn clear(&mut self) {
        self.group.clear();
    }

    /// Number of member volumes
    pub fn len(&self) -> usize {
        self.group.len()
    }

    /// Returns true if the group has no volumes
    pub fn is_empty(&self) -> bool {
        self.group.is_empty()
    }

    /// See [`ProbeVolumeGroup::set_fallback`]
    pub fn set_fallback(&mut self, fallback: Option<Rc<GlobalEnvVolume>>) {
        self.group.set_fallback(fallback);
    }

    /// See [`ProbeVolumeGroup::bounds`]
    pub fn bounds(&self) -> AABB {
        self.group.bounds()
    }

    /// See [`ProbeVolumeGroup::global_ratio`]
    pub fn global_ratio(&self, point: &Point3, out: &mut QueryBuffer<VolumeWeight>) -> usize {
        self.group.global_ratio(point, out)
    }

    /// Write the weighted reflection probes at `point`, each with the mip
    /// level selected for `roughness`
    pub fn surrounding_probes(
        &self,
        point: &Point3,
        out: &mut QueryBuffer<ProbeSample>,
        scratch: &mut QueryBuffer<VolumeWeight>,
        roughness: f32,
    ) -> usize {
        self.group.compose(
            point,
            out,
            scratch,
            |volume, written| {
                let mip_level = volume.roughness_to_mip(roughness);
                for sample in written {
                    sample.mip_level = mip_level;
                }
            },
            |env, sample| sample.mip_level = env.roughness_to_mip(roughness),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Transform, Vec3};
    use crate::probes::buffer::total_weight;
    use crate::probes::irradiance::IrradianceProbeVolume;
    use crate::probes::probe::{RoughnessMapping, TextureHandle};
    use crate::probes::reflection::InfluenceType;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn irradiance(center: Vec3, texture: u64) -> Rc<IrradianceProbeVolume> {
        Rc::new(
            IrradianceProbeVolume::new(
                "grid",
                Transform::from_position(center),
                [1, 1, 1],
                1.0,
                0.5,
                &[TextureHandle(texture)],
            )
            .expect("valid volume"),
        )
    }

    fn reflection(center: Vec3, texture: u64, mapping: RoughnessMapping) -> Rc<ReflectionProbeVolume> {
        Rc::new(
            ReflectionProbeVolume::new(
                "room",
                Transform::from_position(center),
                InfluenceType::Box,
                1.0,
                0.5,
                mapping,
                &[TextureHandle(texture)],
            )
            .expect("valid volume"),
        )
    }

    fn environment() -> Rc<GlobalEnvVolume> {
        let mapping = RoughnessMapping::new(0.0, 1.0, 10).expect("valid mapping");
        Rc::new(GlobalEnvVolume::new(Point3::origin(), TextureHandle(100), TextureHandle(200), mapping).expect("valid env"))
    }

    #[test]
    fn test_duplicate_volumes_rejected_by_identity() {
        let mut group = ProbeVolumeGroup::new();
        let volume = irradiance(Vec3::zeros(), 1);

        assert!(group.add_volume(Rc::clone(&volume)));
        assert!(!group.add_volume(Rc::clone(&volume)));
        assert!(group.add_volume(irradiance(Vec3::zeros(), 1)));
        assert_eq!(group.len(), 2);

        assert!(group.remove_volume(&volume));
        assert!(!group.remove_volume(&volume));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_bounds_follow_membership() {
        let mut group = ProbeVolumeGroup::new();
        assert!(group.bounds().is_empty());

        let left = irradiance(Vec3::new(-5.0, 0.0, 0.0), 1);
        group.add_volume(Rc::clone(&left));
        group.add_volume(irradiance(Vec3::new(5.0, 0.0, 0.0), 2));
        assert_relative_eq!(group.bounds().min.x, -7.0);
        assert_relative_eq!(group.bounds().max.x, 7.0);

        group.remove_volume(&left);
        assert_relative_eq!(group.bounds().min.x, 3.0);
    }

    #[test]
    fn test_overlapping_ratios_normalize_to_one() {
        let mut group = ProbeVolumeGroup::new();
        // Each volume reports 0.6 at the origin: 1.4 units past its core with influence 1
        group.add_volume(irradiance(Vec3::new(-1.4, 0.0, 0.0), 1));
        group.add_volume(irradiance(Vec3::new(1.4, 0.0, 0.0), 2));
        let point = Point3::origin();
        assert_relative_eq!(group.volumes()[0].global_ratio(&point), 0.6, epsilon = 1e-5);

        let mut ratios = QueryBuffer::new();
        assert_eq!(group.global_ratio(&point, &mut ratios), 2);
        assert_relative_eq!(ratios.as_slice()[0].ratio, 0.5, epsilon = 1e-6);
        assert_relative_eq!(ratios.as_slice()[1].ratio, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_lone_volume_without_fallback_normalizes_to_full_weight() {
        let mut group = ProbeVolumeGroup::new();
        group.add_volume(irradiance(Vec3::zeros(), 1));

        let mut out = QueryBuffer::new();
        let mut scratch = QueryBuffer::new();
        let point = Point3::new(1.5, 0.0, 0.0);

        // Without fallback a lone volume is normalized to full weight
        group.surrounding_probes(&point, &mut out, &mut scratch);
        assert_abs_diff_eq!(total_weight(out.as_slice()), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_fallback_fills_missing_weight() {
        let mut group = ProbeVolumeGroup::with_fallback(environment());
        group.add_volume(irradiance(Vec3::zeros(), 1));

        let mut out = QueryBuffer::new();
        let mut scratch = QueryBuffer::new();
        let written = group.surrounding_probes(&Point3::new(1.5, 0.0, 0.0), &mut out, &mut scratch);

        assert_eq!(written, 2);
        assert_relative_eq!(out.as_slice()[0].weight, 0.5, epsilon = 1e-6);
        assert_eq!(out.as_slice()[1].probe.texture, TextureHandle(100));
        assert_relative_eq!(out.as_slice()[1].weight, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_group_with_fallback_returns_fallback_only() {
        let group: ProbeVolumeGroup<IrradianceProbeVolume> = ProbeVolumeGroup::with_fallback(environment());
        let mut out = QueryBuffer::new();
        let mut scratch = QueryBuffer::new();

        for point in [Point3::origin(), Point3::new(100.0, -3.0, 7.0)] {
            assert_eq!(group.surrounding_probes(&point, &mut out, &mut scratch), 1);
            assert_eq!(out.as_slice()[0].probe.texture, TextureHandle(100));
            assert_eq!(out.as_slice()[0].weight, 1.0);
        }
    }

    #[test]
    fn test_point_outside_every_volume_without_fallback_is_empty() {
        let mut group = ProbeVolumeGroup::new();
        group.add_volume(irradiance(Vec3::zeros(), 1));
        let mut out = QueryBuffer::new();
        let mut scratch = QueryBuffer::new();

        group.surrounding_probes(&Point3::origin(), &mut out, &mut scratch);
        assert_eq!(out.len(), 1);
        assert_eq!(group.surrounding_probes(&Point3::new(50.0, 0.0, 0.0), &mut out, &mut scratch), 0);
        assert!(out.is_empty());
        assert!(scratch.is_empty());
    }

    #[test]
    fn test_equal_ratios_keep_insertion_order() {
        let mut group = ProbeVolumeGroup::new();
        group.add_volume(irradiance(Vec3::zeros(), 7));
        group.add_volume(irradiance(Vec3::zeros(), 3));
        let mut out = QueryBuffer::new();
        let mut scratch = QueryBuffer::new();

        group.surrounding_probes(&Point3::origin(), &mut out, &mut scratch);
        let textures: Vec<_> = out.iter().map(|s| s.probe.texture).collect();
        assert_eq!(textures, vec![TextureHandle(7), TextureHandle(3)]);
    }

    #[test]
    fn test_reflection_group_stamps_mip_levels() {
        let mapping = RoughnessMapping::new(0.0, 1.0, 4).expect("valid mapping");
        let mut group = ReflectionProbeVolumeGroup::with_fallback(environment());
        group.add_volume(reflection(Vec3::zeros(), 1, mapping));

        let mut out = QueryBuffer::new();
        let mut scratch = QueryBuffer::new();
        let written = group.surrounding_probes(&Point3::new(0.75, 0.0, 0.0), &mut out, &mut scratch, 0.5);

        assert_eq!(written, 2);
        assert_relative_eq!(out.as_slice()[0].mip_level, 2.0);
        assert_relative_eq!(out.as_slice()[0].weight, 0.5, epsilon = 1e-6);
        assert_eq!(out.as_slice()[1].probe.texture, TextureHandle(200));
        assert_relative_eq!(out.as_slice()[1].mip_level, 5.0);
    }
}
