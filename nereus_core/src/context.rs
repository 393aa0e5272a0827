// nereus_core/src/context.rs

use crate::allocation::ThrustAllocator;
use crate::error::InputError;
use crate::messages::{AccelCommand, InertialMeasurement, ThrustSolution, ThrusterForce};
use crate::models::dynamics::AccelerationModel;
use crate::state::VehicleState;
use crate::validation::InputLimits;
use tracing::{debug, warn};

/// Frame the published forces are expressed in.
pub const DEFAULT_SOLUTION_FRAME: &str = "base_link";

/// Running counters, mostly for logs at shutdown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ContextStats {
    pub solves: u64,
    pub saturated_solves: u64,
    pub unconverged_solves: u64,
    pub rejected_inertial: u64,
    pub rejected_commands: u64,
}

// This struct holds everything the control loop needs between events: the
// model and allocator built at startup, plus the latest accepted state,
// command and solution. Handlers take `&mut self`; nothing is global.
#[derive(Debug, Clone)]
pub struct AllocationContext {
    model: Box<dyn AccelerationModel>,
    allocator: Box<dyn ThrustAllocator>,
    limits: InputLimits,
    frame_id: String,
    state: VehicleState,
    command: Option<AccelCommand>,
    solution: Option<ThrustSolution>,
    stats: ContextStats,
}

impl AllocationContext {
    pub fn new(model: Box<dyn AccelerationModel>, allocator: Box<dyn ThrustAllocator>) -> Self {
        Self {
            model,
            allocator,
            limits: InputLimits::default(),
            frame_id: DEFAULT_SOLUTION_FRAME.to_string(),
            state: VehicleState::at_rest(),
            command: None,
            solution: None,
            stats: ContextStats::default(),
        }
    }

    pub fn with_limits(mut self, limits: InputLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_frame_id(mut self, frame_id: impl Into<String>) -> Self {
        self.frame_id = frame_id.into();
        self
    }

    /// Replaces the vehicle state with a validated, normalized measurement.
    /// A rejected measurement leaves the previous state untouched.
    pub fn on_inertial(&mut self, measurement: &InertialMeasurement) -> Result<&VehicleState, InputError> {
        match VehicleState::from_measurement(measurement, &self.limits) {
            Ok(state) => {
                self.state = state;
                Ok(&self.state)
            }
            Err(e) => {
                self.stats.rejected_inertial += 1;
                warn!("Discarding inertial event at t={}: {}", measurement.timestamp, e);
                Err(e)
            }
        }
    }

    /// Stores the command and solves for it against the current state.
    ///
    /// # Arguments
    /// * `command` - The new acceleration command.
    /// * `produced_at` - Timestamp stamped on the resulting solution.
    ///
    /// # Returns
    /// The fresh solution, or the validation error. On error the previous
    /// command and solution are kept.
    pub fn on_command(
        &mut self,
        command: &AccelCommand,
        produced_at: f64,
    ) -> Result<&ThrustSolution, InputError> {
        if let Err(e) = command.validate(&self.limits) {
            self.stats.rejected_commands += 1;
            warn!("Discarding command at t={}: {}", command.timestamp, e);
            return Err(e);
        }

        let solution = self.solve(command, &self.state, produced_at);
        self.stats.solves += 1;
        if solution.report.is_saturated() {
            self.stats.saturated_solves += 1;
            warn!(
                saturated = ?solution.report.saturated,
                residual = solution.report.residual_norm(),
                "Command saturates thrusters; publishing the least-squares solution."
            );
        }
        if !solution.report.converged {
            self.stats.unconverged_solves += 1;
        }

        self.command = Some(command.clone());
        Ok(self.solution.insert(solution))
    }

    /// One stateless solve. Does not touch the stored command or solution.
    pub fn solve(&self, command: &AccelCommand, state: &VehicleState, produced_at: f64) -> ThrustSolution {
        let allocation = self.allocator.allocate(self.model.as_ref(), command, state);
        debug!("Solved command at t={}: {}", command.timestamp, allocation.report);

        let forces = self
            .model
            .thrusters()
            .iter()
            .zip(allocation.forces.iter())
            .map(|(thruster, force)| ThrusterForce {
                id: thruster.id.clone(),
                force: *force,
            })
            .collect();

        ThrustSolution {
            timestamp: produced_at,
            frame_id: self.frame_id.clone(),
            forces,
            report: allocation.report,
        }
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn command(&self) -> Option<&AccelCommand> {
        self.command.as_ref()
    }

    pub fn latest_solution(&self) -> Option<&ThrustSolution> {
        self.solution.as_ref()
    }

    pub fn model(&self) -> &dyn AccelerationModel {
        self.model.as_ref()
    }

    pub fn allocator(&self) -> &dyn ThrustAllocator {
        self.allocator.as_ref()
    }

    pub fn limits(&self) -> &InputLimits {
        &self.limits
    }

    pub fn stats(&self) -> ContextStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::active_set::ActiveSetAllocator;
    use crate::models::dynamics::RigidBodyModel;
    use crate::vehicle::{ThrusterSpec, Vehicle, VehicleParameters};
    use approx::assert_relative_eq;
    use nalgebra::{Quaternion, Vector3};

    fn context() -> AllocationContext {
        let params = VehicleParameters::new(10.0, 1.0, 1.0, 1.0).unwrap();
        let thrusters = vec![
            ThrusterSpec::new("port", Vector3::new(0.0, 0.2, 0.0), Vector3::x(), 50.0),
            ThrusterSpec::new("stbd", Vector3::new(0.0, -0.2, 0.0), Vector3::x(), 50.0),
        ];
        let model = RigidBodyModel::new(Vehicle::new(params, thrusters).unwrap());
        AllocationContext::new(Box::new(model), Box::new(ActiveSetAllocator::default()))
    }

    #[test]
    fn command_produces_a_stamped_solution_in_thruster_order() {
        let mut ctx = context();
        let cmd = AccelCommand::new(1.0, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros());
        let solution = ctx.on_command(&cmd, 42.0).unwrap().clone();

        assert_eq!(solution.timestamp, 42.0);
        assert_eq!(solution.frame_id, "base_link");
        assert_eq!(solution.forces[0].id.name, "port");
        assert_relative_eq!(solution.force("port").unwrap(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(solution.force("stbd").unwrap(), 5.0, epsilon = 1e-9);
        assert_eq!(ctx.command(), Some(&cmd));
        assert_eq!(ctx.stats().solves, 1);
    }

    #[test]
    fn rejected_events_leave_the_last_valid_values_in_place() {
        let mut ctx = context();
        let good_imu = InertialMeasurement::new(1.0, Quaternion::identity(), Vector3::new(0.0, 0.0, 0.1));
        ctx.on_inertial(&good_imu).unwrap();
        let good_cmd = AccelCommand::new(1.0, Vector3::new(0.5, 0.0, 0.0), Vector3::zeros());
        ctx.on_command(&good_cmd, 1.0).unwrap();
        let before = ctx.latest_solution().cloned();
        let state_before = ctx.state().clone();

        let bad_imu = InertialMeasurement::new(2.0, Quaternion::new(0.0, 0.0, 0.0, 0.0), Vector3::zeros());
        assert_eq!(ctx.on_inertial(&bad_imu), Err(InputError::DegenerateQuaternion));
        let bad_cmd = AccelCommand::new(2.0, Vector3::new(f64::NAN, 0.0, 0.0), Vector3::zeros());
        assert!(ctx.on_command(&bad_cmd, 2.0).is_err());

        assert_eq!(ctx.state(), &state_before);
        assert_eq!(ctx.command(), Some(&good_cmd));
        assert_eq!(ctx.latest_solution().cloned(), before);
        let stats = ctx.stats();
        assert_eq!((stats.rejected_inertial, stats.rejected_commands), (1, 1));
    }

    #[test]
    fn saturation_is_counted_not_raised() {
        let mut ctx = context();
        let cmd = AccelCommand::new(0.0, Vector3::new(20.0, 0.0, 0.0), Vector3::zeros());
        let solution = ctx.on_command(&cmd, 0.0).unwrap();
        assert_eq!(solution.report.saturated, vec![0, 1]);
        assert_relative_eq!(solution.report.modeled[0], 10.0, epsilon = 1e-9);
        assert_eq!(ctx.stats().saturated_solves, 1);
    }
}
