//! Error types for probe volume construction
//!
//! Every variant describes malformed baked data. They are raised while a
//! volume is being built so that bad input fails at load time; queries
//! themselves never fail.

use thiserror::Error;

/// Configuration errors raised while building probes and volumes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeVolumeError {
    /// Reflection volume influence tag is neither box nor ellipsoid
    #[error("Unknown influence type: {0:?}")]
    UnknownInfluenceType(String),

    /// Volume was constructed without any probe texture
    #[error("Probe volume {0:?} has no probe textures")]
    MissingProbeTexture(String),

    /// Texture count does not match the number of probes the volume needs
    #[error("Probe count mismatch: expected {expected} textures, got {actual}")]
    ProbeCountMismatch {
        /// Probes required by the volume layout
        expected: usize,
        /// Textures actually supplied
        actual: usize,
    },

    /// Irradiance grid has a zero-sized axis
    #[error("Invalid grid resolution {0}x{1}x{2}")]
    InvalidResolution(usize, usize, usize),

    /// Volume transform cannot be inverted
    #[error("Volume transform is degenerate (zero or non-finite scale)")]
    DegenerateTransform,

    /// Roughness range is empty or inverted
    #[error("Invalid roughness range: start {start} must be below end {end}")]
    InvalidRoughnessRange {
        /// Roughness mapped to mip 0
        start: f32,
        /// Roughness mapped to the last mip
        end: f32,
    },

    /// Influence distance or falloff outside its valid range
    #[error("Invalid {name}: {value}")]
    InvalidInfluence {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f32,
    },
}
