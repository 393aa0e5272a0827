// nereus_core/src/models/dynamics.rs

use crate::messages::AccelCommand;
use crate::state::VehicleState;
use crate::types::Accel6;
use crate::vehicle::{ThrusterSpec, Vehicle, VehicleParameters};
use dyn_clone::DynClone;
use nalgebra::{DMatrix, DVector, Vector3};
use std::fmt::Debug;

/// Perturbation used by the finite-difference Jacobian.
const JACOBIAN_EPSILON: f64 = 1e-7;

/// Maps a candidate thruster-force vector to body-frame acceleration.
///
/// This is the seam between the vehicle physics and the allocators. An
/// allocator only sees this trait, so it works for any model that can report
/// its thrusters and evaluate an acceleration.
pub trait AccelerationModel: DynClone + Debug + Send + Sync {
    /// The thruster set, in force-vector order.
    fn thrusters(&self) -> &[ThrusterSpec];

    /// Modeled body-frame acceleration for `forces` given the inertial snapshot.
    ///
    /// # Arguments
    /// * `forces` - One force per thruster [N].
    /// * `state` - The snapshot whose angular velocity drives the gyroscopic terms.
    ///
    /// # Returns
    /// Acceleration in [`crate::types::Dof`] order.
    fn acceleration(&self, forces: &DVector<f64>, state: &VehicleState) -> Accel6;

    fn thruster_count(&self) -> usize {
        self.thrusters().len()
    }

    fn lower_bounds(&self) -> DVector<f64> {
        DVector::from_iterator(self.thruster_count(), self.thrusters().iter().map(|t| t.min_force))
    }

    fn upper_bounds(&self) -> DVector<f64> {
        DVector::from_iterator(self.thruster_count(), self.thrusters().iter().map(|t| t.max_force))
    }

    /// Modeled minus commanded, per channel.
    fn residuals(&self, forces: &DVector<f64>, command: &AccelCommand, state: &VehicleState) -> Accel6 {
        self.acceleration(forces, state) - command.as_vector6()
    }

    /// d(acceleration)/d(forces), 6 x N.
    ///
    /// Default is a forward finite difference. Models that know their Jacobian
    /// in closed form should override this.
    fn calculate_jacobian(&self, forces: &DVector<f64>, state: &VehicleState) -> DMatrix<f64> {
        let n = forces.len();
        let base = self.acceleration(forces, state);
        let mut jacobian = DMatrix::zeros(6, n);
        let mut perturbed = forces.clone();
        for j in 0..n {
            perturbed[j] += JACOBIAN_EPSILON;
            let column = (self.acceleration(&perturbed, state) - base) / JACOBIAN_EPSILON;
            jacobian.set_column(j, &column);
            perturbed[j] = forces[j];
        }
        jacobian
    }

    /// The 6 x N effectiveness matrix `B` of `acc(f) = B f + c`.
    fn effectiveness(&self, state: &VehicleState) -> DMatrix<f64> {
        self.calculate_jacobian(&DVector::zeros(self.thruster_count()), state)
    }

    /// The force-independent part `c` of `acc(f) = B f + c`.
    fn bias(&self, state: &VehicleState) -> Accel6 {
        self.acceleration(&DVector::zeros(self.thruster_count()), state)
    }
}
dyn_clone::clone_trait_object!(AccelerationModel);

// --- Rigid Body Model ---
// Thrusters are ideal point forces on a rigid body with diagonal inertia.
// Linear: a = sum(f_i d_i) / m. Angular: Euler's equations solved for the
// angular acceleration, with the gyroscopic coupling moved into the bias.
#[derive(Debug, Clone)]
pub struct RigidBodyModel {
    vehicle: Vehicle,
    /// Column i: [d_i / m ; (r_i x d_i) ./ I]. Fixed at construction.
    effectiveness: DMatrix<f64>,
}

impl RigidBodyModel {
    pub fn new(vehicle: Vehicle) -> Self {
        let params = *vehicle.params();
        let mut effectiveness = DMatrix::zeros(6, vehicle.thruster_count());
        for (j, thruster) in vehicle.thrusters().iter().enumerate() {
            let linear = thruster.direction / params.mass;
            let angular = thruster.torque_arm().component_div(&params.inertia);
            effectiveness.fixed_view_mut::<3, 1>(0, j).copy_from(&linear);
            effectiveness.fixed_view_mut::<3, 1>(3, j).copy_from(&angular);
        }
        Self {
            vehicle,
            effectiveness,
        }
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn effectiveness_matrix(&self) -> &DMatrix<f64> {
        &self.effectiveness
    }

    /// Gyroscopic angular acceleration for a body-frame rate `w`:
    /// roll (Iyy - Izz) wy wz / Ixx, pitch (Izz - Ixx) wx wz / Iyy,
    /// yaw (Ixx - Iyy) wx wy / Izz.
    pub fn gyroscopic_acceleration(params: &VehicleParameters, w: &Vector3<f64>) -> Vector3<f64> {
        let (ixx, iyy, izz) = (params.ixx(), params.iyy(), params.izz());
        Vector3::new(
            (iyy - izz) * w.y * w.z / ixx,
            (izz - ixx) * w.x * w.z / iyy,
            (ixx - iyy) * w.x * w.y / izz,
        )
    }
}

impl AccelerationModel for RigidBodyModel {
    fn thrusters(&self) -> &[ThrusterSpec] {
        self.vehicle.thrusters()
    }

    fn acceleration(&self, forces: &DVector<f64>, state: &VehicleState) -> Accel6 {
        debug_assert_eq!(forces.len(), self.vehicle.thruster_count());
        let driven = &self.effectiveness * forces;
        Accel6::from_column_slice(driven.as_slice()) + self.bias(state)
    }

    fn calculate_jacobian(&self, _forces: &DVector<f64>, _state: &VehicleState) -> DMatrix<f64> {
        self.effectiveness.clone()
    }

    fn effectiveness(&self, _state: &VehicleState) -> DMatrix<f64> {
        self.effectiveness.clone()
    }

    fn bias(&self, state: &VehicleState) -> Accel6 {
        let gyro = Self::gyroscopic_acceleration(self.vehicle.params(), &state.angular_velocity);
        Accel6::new(0.0, 0.0, 0.0, gyro.x, gyro.y, gyro.z)
    }
}
