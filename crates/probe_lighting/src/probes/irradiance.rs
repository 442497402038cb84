//! Irradiance probe volumes
//!
//! A regular `Rx × Ry × Rz` grid of diffuse probes laid over the volume's
//! local unit cube. Probe `(i, j, k)` sits at the centre of grid cell
//! `(i, j, k)`, and the world-to-grid matrix is offset so that the probe lands
//! exactly on grid coordinate `(i, j, k)`. Queries blend the up to eight
//! probes of the enclosing cell with trilinear weights.

use std::rc::Rc;

use crate::error::ProbeVolumeError;
use crate::foundation::math::utils::saturate;
use crate::foundation::math::{Mat4, Point3, Transform, Vec3};
use crate::spatial::AABB;

use super::buffer::{ProbeSample, QueryBuffer};
use super::global_env::GlobalEnvVolume;
use super::probe::{Probe, TextureHandle};
use super::volume::{BoundsCache, InfluenceVolume};

/// Fractions closer than this to a grid line are snapped onto it
const GRID_SNAP_EPSILON: f32 = 1e-5;

/// Grid of irradiance probes blended by trilinear interpolation
#[derive(Debug, Clone)]
pub struct IrradianceProbeVolume {
    name: String,
    transform: Transform,
    resolution: [usize; 3],
    influence_distance: f32,
    falloff: f32,
    world_to_local: Mat4,
    world_to_grid: Mat4,
    probes: Vec<Rc<Probe>>,
    bounds: BoundsCache,
}

impl IrradianceProbeVolume {
    /// Create a volume with one texture per grid cell
    ///
    /// Textures are ordered by linear probe index `i·Ry·Rz + j·Rz + k`.
    /// `influence_distance` extends the region beyond the unit cube, in local
    /// units, over which the volume fades out.
    pub fn new(
        name: impl Into<String>,
        transform: Transform,
        resolution: [usize; 3],
        influence_distance: f32,
        falloff: f32,
        textures: &[TextureHandle],
    ) -> Result<Self, ProbeVolumeError> {
        let name = name.into();
        let [rx, ry, rz] = resolution;
        if rx == 0 || ry == 0 || rz == 0 {
            return Err(ProbeVolumeError::InvalidResolution(rx, ry, rz));
        }
        if !influence_distance.is_finite() || influence_distance < 0.0 {
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
        if textures.is_empty() {
            return Err(ProbeVolumeError::MissingProbeTexture(name));
        }
        let expected = rx
            .checked_mul(ry)
            .and_then(|n| n.checked_mul(rz))
            .ok_or(ProbeVolumeError::InvalidResolution(rx, ry, rz))?;
        if textures.len() != expected {
            return Err(ProbeVolumeError::ProbeCountMismatch {
                expected,
                actual: textures.len(),
            });
        }

        let world_to_local = transform
            .inverse_matrix()
            .ok_or(ProbeVolumeError::DegenerateTransform)?;
        let extent = Vec3::new(rx as f32, ry as f32, rz as f32);
        let grid_from_local = Mat4::new_translation(&(extent * 0.5 - Vec3::repeat(0.5)))
            * Mat4::new_nonuniform_scaling(&(extent * 0.5));
        let local_from_grid = Mat4::new_translation(&(extent.map(|r| 1.0 / r) - Vec3::repeat(1.0)))
            * Mat4::new_nonuniform_scaling(&extent.map(|r| 2.0 / r));
        let grid_to_world = transform.to_matrix() * local_from_grid;

        let mut probes = Vec::with_capacity(expected);
        for i in 0..rx {
            for j in 0..ry {
                for k in 0..rz {
                    let grid = Point3::new(i as f32, j as f32, k as f32);
                    let texture = textures[i * ry * rz + j * rz + k];
                    probes.push(Rc::new(Probe::irradiance(grid_to_world.transform_point(&grid), texture)));
                }
            }
        }

        log::debug!(
            "Created irradiance volume '{}' with {}x{}x{} probes",
            name, rx, ry, rz
        );

        Ok(Self {
            name,
            transform,
            resolution,
            influence_distance,
            falloff,
            world_to_local,
            world_to_grid: grid_from_local * world_to_local,
            probes,
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

    /// Grid resolution per axis
    pub fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    /// Fade distance beyond the unit cube, in local units
    pub fn influence_distance(&self) -> f32 {
        self.influence_distance
    }

    /// Falloff fraction from the baked data
    pub fn falloff(&self) -> f32 {
        self.falloff
    }

    /// Linear index of grid probe `(i, j, k)`
    pub fn probe_index(&self, i: usize, j: usize, k: usize) -> usize {
        let [_, ry, rz] = self.resolution;
        i * ry * rz + j * rz + k
    }

    /// Grid probe `(i, j, k)`, if in range
    pub fn probe_at(&self, i: usize, j: usize, k: usize) -> Option<&Rc<Probe>> {
        let [rx, ry, rz] = self.resolution;
        if i < rx && j < ry && k < rz {
            self.probes.get(self.probe_index(i, j, k))
        } else {
            None
        }
    }

    /// All probes in linear index order
    pub fn probes(&self) -> &[Rc<Probe>] {
        &self.probes
    }

    /// Position of a world point in grid space
    pub fn grid_position(&self, point: &Point3) -> Point3 {
        self.world_to_grid.transform_point(point)
    }

    fn axis_ratio(&self, local: f32) -> f32 {
        let overshoot = local.abs() - 1.0;
        if overshoot <= 0.0 {
            1.0
        } else if self.influence_distance <= 0.0 {
            0.0
        } else {
            1.0 - saturate(overshoot / self.influence_distance)
        }
    }

    fn nearest_probe(&self, grid: &Point3) -> usize {
        let clamp = |value: f32, resolution: usize| value.round().clamp(0.0, (resolution - 1) as f32) as usize;
        let [rx, ry, rz] = self.resolution;
        self.probe_index(clamp(grid.x, rx), clamp(grid.y, ry), clamp(grid.z, rz))
    }
}

impl InfluenceVolume for IrradianceProbeVolume {
    fn bounds(&self) -> AABB {
        self.bounds.get_or_compute(|| {
            let reach = 1.0 + self.influence_distance;
            AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(reach)).transformed(&self.transform.to_matrix())
        })
    }

    fn global_ratio(&self, point: &Point3) -> f32 {
        if !self.bounds().contains_point(point) {
            return 0.0;
        }
        let local = self.world_to_local.transform_point(point);
        local.coords.iter().map(|&axis| self.axis_ratio(axis)).fold(1.0, f32::min)
    }

    fn surrounding_probes(
        &self,
        point: &Point3,
        weight: f32,
        out: &mut QueryBuffer<ProbeSample>,
        offset: usize,
    ) -> usize {
        let grid = self.grid_position(point);
        let mut base = [0_i64; 3];
        let mut frac = [0.0_f32; 3];
        for axis in 0..3 {
            let floor = grid[axis].floor();
            let mut f = grid[axis] - floor;
            let mut b = floor as i64;
            if f > 1.0 - GRID_SNAP_EPSILON {
                b += 1;
                f = 0.0;
            } else if f < GRID_SNAP_EPSILON {
                f = 0.0;
            }
            base[axis] = b;
            frac[axis] = f;
        }

        let mut written = 0;
        let mut total_ratio = 0.0;
        'corners: for corner in 0..8_usize {
            let mut index = [0_usize; 3];
            let mut ratio = 1.0;
            for axis in 0..3 {
                let step = (corner >> axis) & 1;
                let cell = base[axis] + step as i64;
                if cell < 0 || cell >= self.resolution[axis] as i64 {
                    continue 'corners;
                }
                index[axis] = cell as usize;
                ratio *= if step == 1 { frac[axis] } else { 1.0 - frac[axis] };
            }
            if ratio <= 0.0 {
                continue;
            }
            let probe = &self.probes[self.probe_index(index[0], index[1], index[2])];
            out.write(offset + written, ProbeSample::new(Rc::clone(probe), ratio));
            written += 1;
            total_ratio += ratio;
        }

        if written == 0 {
            // Deep in the falloff band no cell corner is on the grid
            let probe = &self.probes[self.nearest_probe(&grid)];
            out.write(offset, ProbeSample::new(Rc::clone(probe), weight));
            return 1;
        }

        let scale = weight / total_ratio;
        for sample in &mut out.as_mut_slice()[offset..offset + written] {
            sample.weight *= scale;
        }
        written
    }

    fn probe_count(&self) -> usize {
        self.probes.len()
    }

    fn fallback_probe(env: &GlobalEnvVolume) -> &Rc<Probe> {
        env.irradiance_probe()
    }
}
