// nereus_core/src/messages.rs

use crate::allocation::SolveReport;
use crate::error::InputError;
use crate::types::{Accel6, Dof};
use crate::validation::{check_scalar, check_vector, InputLimits};
use crate::vehicle::ThrusterId;
use nalgebra::{DVector, Quaternion, Vector3};
use serde::{Deserialize, Serialize};

// =========================================================================
// == Input Events ==
// =========================================================================

/// A commanded body-frame acceleration. Every accepted command triggers one solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccelCommand {
    pub timestamp: f64,
    /// (surge, sway, heave) [m/s^2]
    pub linear: Vector3<f64>,
    /// (roll, pitch, yaw) [rad/s^2]
    pub angular: Vector3<f64>,
}

impl AccelCommand {
    pub fn new(timestamp: f64, linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self {
            timestamp,
            linear,
            angular,
        }
    }

    pub fn zero(timestamp: f64) -> Self {
        Self::new(timestamp, Vector3::zeros(), Vector3::zeros())
    }

    /// Builds a command from the six channels in [`Dof`] order.
    pub fn from_channels(timestamp: f64, channels: &Accel6) -> Self {
        Self::new(
            timestamp,
            channels.fixed_rows::<3>(0).into_owned(),
            channels.fixed_rows::<3>(3).into_owned(),
        )
    }

    /// The command as a 6-vector in [`Dof`] order.
    pub fn as_vector6(&self) -> Accel6 {
        Accel6::new(
            self.linear.x,
            self.linear.y,
            self.linear.z,
            self.angular.x,
            self.angular.y,
            self.angular.z,
        )
    }

    pub fn channel(&self, dof: Dof) -> f64 {
        self.as_vector6()[dof.index()]
    }

    pub fn validate(&self, limits: &InputLimits) -> Result<(), InputError> {
        check_scalar("command.timestamp", self.timestamp, f64::MAX)?;
        check_vector(
            ["command.surge", "command.sway", "command.heave"],
            &self.linear,
            limits.max_linear_accel,
        )?;
        check_vector(
            ["command.roll", "command.pitch", "command.yaw"],
            &self.angular,
            limits.max_angular_accel,
        )
    }
}

/// A raw orientation / angular-velocity sample. The quaternion need not be
/// normalized; [`crate::state::VehicleState::from_measurement`] does that.
#[derive(Debug, Clone, PartialEq)]
pub struct InertialMeasurement {
    pub timestamp: f64,
    pub orientation: Quaternion<f64>,
    /// Body frame [rad/s].
    pub angular_velocity: Vector3<f64>,
}

impl InertialMeasurement {
    pub fn new(timestamp: f64, orientation: Quaternion<f64>, angular_velocity: Vector3<f64>) -> Self {
        Self {
            timestamp,
            orientation,
            angular_velocity,
        }
    }

    pub fn validate(&self, limits: &InputLimits) -> Result<(), InputError> {
        check_scalar("inertial.timestamp", self.timestamp, f64::MAX)?;
        for (field, value) in ["inertial.qw", "inertial.qx", "inertial.qy", "inertial.qz"]
            .into_iter()
            .zip([self.orientation.w, self.orientation.i, self.orientation.j, self.orientation.k])
        {
            check_scalar(field, value, f64::MAX)?;
        }
        if self.orientation.norm() <= f64::EPSILON {
            return Err(InputError::DegenerateQuaternion);
        }
        check_vector(
            ["inertial.wx", "inertial.wy", "inertial.wz"],
            &self.angular_velocity,
            limits.max_angular_rate,
        )
    }
}

/// Everything the dispatch loop consumes, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Inertial(InertialMeasurement),
    Command(AccelCommand),
    Shutdown,
}

impl InputEvent {
    pub fn timestamp(&self) -> Option<f64> {
        match self {
            InputEvent::Inertial(m) => Some(m.timestamp),
            InputEvent::Command(c) => Some(c.timestamp),
            InputEvent::Shutdown => None,
        }
    }
}

// =========================================================================
// == Output ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrusterForce {
    pub id: ThrusterId,
    /// [N]
    pub force: f64,
}

/// The only externally visible product of the allocator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThrustSolution {
    /// When the solution was produced [s].
    pub timestamp: f64,
    /// Frame the forces are expressed in.
    pub frame_id: String,
    /// One entry per thruster, in index order.
    pub forces: Vec<ThrusterForce>,
    pub report: SolveReport,
}

impl ThrustSolution {
    pub fn force(&self, name: &str) -> Option<f64> {
        self.forces
            .iter()
            .find(|f| f.id.name == name)
            .map(|f| f.force)
    }

    pub fn force_vector(&self) -> DVector<f64> {
        DVector::from_iterator(self.forces.len(), self.forces.iter().map(|f| f.force))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.forces.iter().map(|f| (f.id.name.as_str(), f.force))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_channels_follow_dof_order() {
        let cmd = AccelCommand::new(0.0, Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(cmd.as_vector6(), Accel6::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
        assert_eq!(cmd.channel(Dof::Pitch), 5.0);
        assert_eq!(AccelCommand::from_channels(0.0, &cmd.as_vector6()), cmd);
    }

    #[test]
    fn malformed_commands_are_rejected() {
        let limits = InputLimits::default();
        let mut cmd = AccelCommand::zero(1.0);
        assert!(cmd.validate(&limits).is_ok());

        cmd.angular.z = f64::NAN;
        assert!(matches!(
            cmd.validate(&limits),
            Err(InputError::NonFinite { field: "command.yaw", .. })
        ));

        let cmd = AccelCommand::new(f64::INFINITY, Vector3::zeros(), Vector3::zeros());
        assert!(cmd.validate(&limits).is_err());

        let cmd = AccelCommand::new(0.0, Vector3::new(1e6, 0.0, 0.0), Vector3::zeros());
        assert!(matches!(
            cmd.validate(&limits),
            Err(InputError::OutOfRange { field: "command.surge", .. })
        ));
    }

    #[test]
    fn malformed_measurements_are_rejected() {
        let limits = InputLimits::default();
        let zero_q = InertialMeasurement::new(0.0, Quaternion::new(0.0, 0.0, 0.0, 0.0), Vector3::zeros());
        assert_eq!(zero_q.validate(&limits), Err(InputError::DegenerateQuaternion));

        let nan_q = InertialMeasurement::new(0.0, Quaternion::new(f64::NAN, 0.0, 0.0, 0.0), Vector3::zeros());
        assert!(matches!(nan_q.validate(&limits), Err(InputError::NonFinite { .. })));

        let spinning = InertialMeasurement::new(0.0, Quaternion::identity(), Vector3::new(0.0, 0.0, 1e3));
        assert!(matches!(
            spinning.validate(&limits),
            Err(InputError::OutOfRange { field: "inertial.wz", .. })
        ));
    }
}
