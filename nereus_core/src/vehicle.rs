// nereus_core/src/vehicle.rs

//! Static vehicle description: mass properties and thruster geometry.
//!
//! Everything here is validated once in [`Vehicle::new`] and never changes
//! afterwards. There is no hot reload of the thruster set.

use crate::error::ConfigError;
use crate::validation::{require_finite, require_positive};
use nalgebra::{Isometry3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Stable identity of a thruster: its slot in the force vector plus its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThrusterId {
    pub index: usize,
    pub name: String,
}

impl fmt::Display for ThrusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.index)
    }
}

/// One thruster, expressed in the body frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrusterSpec {
    pub id: ThrusterId,
    /// Mounting point relative to the center of mass [m].
    pub position: Vector3<f64>,
    /// Unit direction of positive thrust.
    pub direction: Vector3<f64>,
    /// Force bounds [N]. Always `min_force <= 0 <= max_force` once validated.
    pub min_force: f64,
    pub max_force: f64,
}

impl ThrusterSpec {
    /// A thruster with symmetric bounds `[-max_force, max_force]`.
    /// The index is assigned by [`Vehicle::new`].
    pub fn new(
        name: impl Into<String>,
        position: Vector3<f64>,
        direction: Vector3<f64>,
        max_force: f64,
    ) -> Self {
        Self::with_bounds(name, position, direction, -max_force, max_force)
    }

    pub fn with_bounds(
        name: impl Into<String>,
        position: Vector3<f64>,
        direction: Vector3<f64>,
        min_force: f64,
        max_force: f64,
    ) -> Self {
        Self {
            id: ThrusterId {
                index: 0,
                name: name.into(),
            },
            position,
            direction,
            min_force,
            max_force,
        }
    }

    /// Builds a thruster from its mounting pose in the body frame.
    /// Translation is the position; the rotated +x axis is the thrust direction.
    pub fn from_pose(name: impl Into<String>, pose: &Isometry3<f64>, max_force: f64) -> Self {
        Self::new(
            name,
            pose.translation.vector,
            pose.rotation * Vector3::x(),
            max_force,
        )
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Torque per newton of thrust, `r x d`.
    pub fn torque_arm(&self) -> Vector3<f64> {
        self.position.cross(&self.direction)
    }

    pub fn contains(&self, force: f64) -> bool {
        force >= self.min_force && force <= self.max_force
    }

    fn validate(&mut self, index: usize) -> Result<(), ConfigError> {
        if self.id.name.trim().is_empty() {
            return Err(ConfigError::EmptyName(index));
        }
        let name = self.id.name.clone();
        for (axis, value) in ["x", "y", "z"].iter().zip(self.position.iter()) {
            require_finite(format!("thrusters.{name}.position.{axis}"), *value)?;
        }
        for (axis, value) in ["x", "y", "z"].iter().zip(self.direction.iter()) {
            require_finite(format!("thrusters.{name}.direction.{axis}"), *value)?;
        }
        require_finite(format!("thrusters.{name}.min_force"), self.min_force)?;
        require_finite(format!("thrusters.{name}.max_force"), self.max_force)?;
        if !(self.min_force <= 0.0 && 0.0 <= self.max_force) {
            return Err(ConfigError::InvalidBounds {
                name,
                min: self.min_force,
                max: self.max_force,
            });
        }

        let norm = self.direction.norm();
        if norm <= f64::EPSILON {
            return Err(ConfigError::ZeroDirection(name));
        }
        self.direction /= norm;
        self.id.index = index;
        Ok(())
    }
}

/// Rigid-body mass properties. Inertia is diagonal (principal axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleParameters {
    /// [kg]
    pub mass: f64,
    /// Principal moments (Ixx, Iyy, Izz) [kg*m^2].
    pub inertia: Vector3<f64>,
}

impl VehicleParameters {
    pub fn new(mass: f64, ixx: f64, iyy: f64, izz: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            mass: require_positive("vehicle.mass", mass)?,
            inertia: Vector3::new(
                require_positive("vehicle.inertia.ixx", ixx)?,
                require_positive("vehicle.inertia.iyy", iyy)?,
                require_positive("vehicle.inertia.izz", izz)?,
            ),
        })
    }

    pub fn ixx(&self) -> f64 {
        self.inertia.x
    }
    pub fn iyy(&self) -> f64 {
        self.inertia.y
    }
    pub fn izz(&self) -> f64 {
        self.inertia.z
    }
}

/// The validated, immutable vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    params: VehicleParameters,
    thrusters: Vec<ThrusterSpec>,
    imu_offset: Vector3<f64>,
}

impl Vehicle {
    /// Validates the thruster set, normalizes every direction and assigns indices
    /// in the given order.
    ///
    /// # Arguments
    /// * `params` - Mass properties, already validated by [`VehicleParameters::new`].
    /// * `thrusters` - The full thruster set. Order defines the force vector layout.
    ///
    /// # Returns
    /// The vehicle, or the first [`ConfigError`] found.
    pub fn new(params: VehicleParameters, thrusters: Vec<ThrusterSpec>) -> Result<Self, ConfigError> {
        // Parameters can be built by hand, so check them again.
        VehicleParameters::new(params.mass, params.ixx(), params.iyy(), params.izz())?;

        if thrusters.is_empty() {
            return Err(ConfigError::NoThrusters);
        }

        let mut seen = HashSet::new();
        let mut validated = Vec::with_capacity(thrusters.len());
        for (index, mut thruster) in thrusters.into_iter().enumerate() {
            thruster.validate(index)?;
            if !seen.insert(thruster.id.name.clone()) {
                return Err(ConfigError::DuplicateName(thruster.id.name));
            }
            validated.push(thruster);
        }

        Ok(Self {
            params,
            thrusters: validated,
            imu_offset: Vector3::zeros(),
        })
    }

    /// Records the IMU mounting offset. Informational only.
    pub fn with_imu_offset(mut self, offset: Vector3<f64>) -> Self {
        self.imu_offset = offset;
        self
    }

    pub fn params(&self) -> &VehicleParameters {
        &self.params
    }

    pub fn thrusters(&self) -> &[ThrusterSpec] {
        &self.thrusters
    }

    pub fn thruster_count(&self) -> usize {
        self.thrusters.len()
    }

    pub fn imu_offset(&self) -> &Vector3<f64> {
        &self.imu_offset
    }

    pub fn find(&self, name: &str) -> Option<&ThrusterSpec> {
        self.thrusters.iter().find(|t| t.name() == name)
    }
}
