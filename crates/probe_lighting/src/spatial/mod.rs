//! Spatial primitives
//!
//! Provides the bounding volumes used to cull probe volumes before their
//! falloff functions are evaluated.

mod aabb;

pub use aabb::AABB;
