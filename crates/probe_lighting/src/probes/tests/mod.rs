//! Cross-component tests for probe queries


use std::rc::Rc;

use crate::foundation::math::{Point3, Quat, Transform, Vec3};
use crate::probes::{
    GlobalEnvVolume, InfluenceType, IrradianceProbeVolume, ReflectionProbeVolume, RoughnessMapping,
    TextureHandle,
};

fn handles(first: u64, count: usize) -> Vec<TextureHandle> {
    (first..first + count as u64).map(TextureHandle).collect()
}

fn tilted_grid() -> Rc<IrradianceProbeVolume> {
    let transform = Transform::new(
        Vec3::new(1.0, 2.0, -1.0),
        Quat::from_euler_angles(0.3, -0.4, 0.2),
        Vec3::new(3.0, 2.0, 1.5),
    );
    Rc::new(IrradianceProbeVolume::new("tilted", transform, [3, 2, 4], 0.75, 0.5, &handles(0, 24)).expect("valid grid"))
}

fn room_reflection(influence_type: InfluenceType) -> Rc<ReflectionProbeVolume> {
    let transform = Transform::from_position_scale(Vec3::new(2.0, 2.0, 0.0), Vec3::new(3.0, 2.0, 3.0));
    let mapping = RoughnessMapping::new(0.1, 0.9, 6).expect("valid mapping");
    Rc::new(
        ReflectionProbeVolume::new("room", transform, influence_type, 1.2, 0.4, mapping, &[TextureHandle(500)])
            .expect("valid reflection volume"),
    )
}

fn global_env() -> Rc<GlobalEnvVolume> {
    let mapping = RoughnessMapping::new(0.0, 1.0, 8).expect("valid mapping");
    Rc::new(
        GlobalEnvVolume::new(Point3::new(0.0, 5.0, 0.0), TextureHandle(1000), TextureHandle(1001), mapping)
            .expect("valid environment"),
    )
}

/// Deterministic points spread over a box around the test volumes
fn sample_points() -> impl Iterator<Item = Point3> {
    (0..11).flat_map(|i| {
        (0..9).flat_map(move |j| {
            (0..7).map(move |k| {
                Point3::new(
                    -6.0 + i as f32 * 1.3,
                    -3.0 + j as f32 * 1.1,
                    -5.0 + k as f32 * 1.7,
                )
            })
        })
    })
}
