// nereus_core/src/validation.rs

//! Finite/range checks shared by the vehicle description and the input events.

use crate::error::{ConfigError, InputError};
use nalgebra::Vector3;
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Magnitude limits applied to every incoming event, per component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputLimits {
    /// [m/s^2]
    #[serde(default = "default_max_linear_accel")]
    pub max_linear_accel: f64,
    /// [rad/s^2]
    #[serde(default = "default_max_angular_accel")]
    pub max_angular_accel: f64,
    /// [rad/s]
    #[serde(default = "default_max_angular_rate")]
    pub max_angular_rate: f64,
}

fn default_max_linear_accel() -> f64 {
    50.0
}
fn default_max_angular_accel() -> f64 {
    50.0
}
fn default_max_angular_rate() -> f64 {
    // A 2000 deg/s gyro saturates a bit below this.
    35.0
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_linear_accel: default_max_linear_accel(),
            max_angular_accel: default_max_angular_accel(),
            max_angular_rate: default_max_angular_rate(),
        }
    }
}

/// Checks a scalar for finiteness and `|value| <= limit`.
pub fn check_scalar<T: Float>(field: &'static str, value: T, limit: T) -> Result<(), InputError> {
    let as_f64 = value.to_f64().unwrap_or(f64::NAN);
    if !value.is_finite() {
        return Err(InputError::NonFinite {
            field,
            value: as_f64,
        });
    }
    if value.abs() > limit {
        return Err(InputError::OutOfRange {
            field,
            value: as_f64,
            limit: limit.to_f64().unwrap_or(f64::INFINITY),
        });
    }
    Ok(())
}

/// Component-wise [`check_scalar`]. `fields` names x, y and z in that order.
pub fn check_vector(
    fields: [&'static str; 3],
    value: &Vector3<f64>,
    limit: f64,
) -> Result<(), InputError> {
    for (field, component) in fields.into_iter().zip(value.iter()) {
        check_scalar(field, *component, limit)?;
    }
    Ok(())
}

/// Startup-time counterpart of [`check_scalar`] with an owned field name.
pub fn require_finite<T: Float>(field: impl Into<String>, value: T) -> Result<T, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite {
            field: field.into(),
            value: value.to_f64().unwrap_or(f64::NAN),
        })
    }
}

pub fn require_positive<T: Float>(field: impl Into<String>, value: T) -> Result<T, ConfigError> {
    let field = field.into();
    let value = require_finite(field.clone(), value)?;
    if value > T::zero() {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive {
            field,
            value: value.to_f64().unwrap_or(f64::NAN),
        })
    }
}
