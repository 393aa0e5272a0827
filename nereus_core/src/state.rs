// nereus_core/src/state.rs

use crate::error::InputError;
use crate::messages::InertialMeasurement;
use crate::validation::InputLimits;
use nalgebra::{Rotation3, UnitQuaternion, Vector3};
use std::sync::{Arc, PoisonError, RwLock};

/// The inertial snapshot a solve reads. Replaced wholesale per accepted
/// inertial event, never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    /// Body -> reference frame.
    pub orientation: UnitQuaternion<f64>,
    /// Body-frame angular velocity [rad/s].
    pub angular_velocity: Vector3<f64>,
    /// Timestamp of the inertial event that produced this state [s].
    pub timestamp: f64,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self::at_rest()
    }
}

impl VehicleState {
    /// Level and not rotating. The state before the first inertial event.
    pub fn at_rest() -> Self {
        Self {
            orientation: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
            timestamp: 0.0,
        }
    }

    /// Validates a measurement and normalizes its quaternion.
    pub fn from_measurement(
        measurement: &InertialMeasurement,
        limits: &InputLimits,
    ) -> Result<Self, InputError> {
        measurement.validate(limits)?;
        Ok(Self {
            orientation: UnitQuaternion::new_normalize(measurement.orientation),
            angular_velocity: measurement.angular_velocity,
            timestamp: measurement.timestamp,
        })
    }

    /// Orientation as a rotation matrix, for diagnostics.
    pub fn rotation_matrix(&self) -> Rotation3<f64> {
        self.orientation.to_rotation_matrix()
    }
}

/// Single-writer / many-reader holder for the latest [`VehicleState`].
///
/// The writer swaps in a fresh `Arc`; readers clone the `Arc` they see, so a
/// reader always holds one complete state, never half of two.
#[derive(Debug, Default)]
pub struct SharedVehicleState {
    inner: RwLock<Arc<VehicleState>>,
}

impl SharedVehicleState {
    pub fn new(state: VehicleState) -> Self {
        Self {
            inner: RwLock::new(Arc::new(state)),
        }
    }

    pub fn publish(&self, state: VehicleState) {
        let fresh = Arc::new(state);
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *slot = fresh;
    }

    pub fn snapshot(&self) -> Arc<VehicleState> {
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }
}
