// nereus_core/src/error.rs

use crate::frames::FrameId;
use std::time::Duration;
use thiserror::Error;

/// Problems with the static vehicle description. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("the vehicle must have at least one thruster")]
    NoThrusters,

    #[error("thruster #{0} has an empty name")]
    EmptyName(usize),

    #[error("thruster name '{0}' is used more than once")]
    DuplicateName(String),

    #[error("thruster '{name}' has bounds [{min}, {max}]; expected min <= 0 <= max")]
    InvalidBounds { name: String, min: f64, max: f64 },

    #[error("thruster '{0}' has a zero-length thrust direction")]
    ZeroDirection(String),

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: String, value: f64 },

    #[error("{field} must be strictly positive, got {value}")]
    NonPositive { field: String, value: f64 },

    #[error("invalid solver settings: {0}")]
    Solver(String),
}

/// A malformed input event. The event is dropped; nothing else changes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} is not finite ({value})")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} = {value} is outside the accepted range of +/-{limit}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        limit: f64,
    },

    #[error("orientation quaternion has zero norm")]
    DegenerateQuaternion,
}

/// Failure to obtain the thruster mounting geometry at startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("timed out after {waited:?} waiting for transform {from} -> {to}")]
    Timeout {
        from: FrameId,
        to: FrameId,
        waited: Duration,
    },

    #[error("no frame is known for thruster '{0}'")]
    MissingFrame(String),
}

/// Umbrella error for callers that do not care which stage failed.
#[derive(Debug, Error)]
pub enum NereusError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("input error: {0}")]
    Input(#[from] InputError),
}
