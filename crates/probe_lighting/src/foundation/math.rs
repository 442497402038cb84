//! Math utilities and types
//!
//! Provides fundamental math types for probe placement and volume space
//! conversions.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
///
/// For probe volumes the scale holds the half-extents of the volume: the
/// local-space unit cube `[-1, 1]³` maps onto the volume's core region.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and scale
    pub fn from_position_scale(position: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            scale,
            ..Default::default()
        }
    }

    /// Create a transform from all three components
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Inverse of [`Transform::to_matrix`], or `None` when any scale axis is zero
    pub fn inverse_matrix(&self) -> Option<Mat4> {
        if self.scale.iter().any(|s| s.abs() <= f32::EPSILON || !s.is_finite()) {
            return None;
        }
        self.to_matrix().try_inverse()
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.to_matrix().transform_point(&point)
    }

    /// Rotate a world-space offset into the transform's local axes (no scale)
    pub fn to_local_direction(&self, offset: Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(&offset)
    }
}

/// Math utility functions
pub mod utils {
    /// Clamp a value to the unit interval
    pub fn saturate(value: f32) -> f32 {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverse_matrix_round_trips_points() {
        let transform = Transform::new(
            Vec3::new(3.0, -2.0, 5.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            Vec3::new(2.0, 1.0, 4.0),
        );
        let inverse = transform.inverse_matrix().expect("invertible");
        let point = Point3::new(0.25, -0.5, 0.75);

        let world = transform.transform_point(point);
        let local = inverse.transform_point(&world);

        assert_relative_eq!(local, point, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_scale_has_no_inverse() {
        let transform = Transform::from_position_scale(Vec3::zeros(), Vec3::new(1.0, 0.0, 1.0));
        assert!(transform.inverse_matrix().is_none());
    }

    #[test]
    fn test_saturate_clamps() {
        assert_eq!(utils::saturate(-0.5), 0.0);
        assert_eq!(utils::saturate(0.25), 0.25);
        assert_eq!(utils::saturate(3.0), 1.0);
    }
}
