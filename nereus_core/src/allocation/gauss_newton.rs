// nereus_core/src/allocation/gauss_newton.rs

use super::least_squares::{project, PseudoInverse};
use super::{Allocation, SolveReport, SolverSettings, ThrustAllocator};
use crate::messages::AccelCommand;
use crate::models::dynamics::AccelerationModel;
use crate::state::VehicleState;
use nalgebra::DVector;
use tracing::{debug, warn};

const DAMPING_DECREASE: f64 = 0.3;
const DAMPING_INCREASE: f64 = 10.0;
const MIN_DAMPING: f64 = 1e-15;

// --- Projected Levenberg-Marquardt ---
// General nonlinear least squares on the model's residuals, started at zero
// force. Each trial step is the damped least-squares step
// dx = -(JᵀJ + mu I)⁻¹ Jᵀr taken through the SVD of J, so it never moves the
// forces along the null space of J. The step is projected onto the force
// bounds and kept only if it lowers the cost.
#[derive(Debug, Clone, Default)]
pub struct GaussNewtonAllocator {
    pub settings: SolverSettings,
}

impl GaussNewtonAllocator {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }
}

/// Largest gradient component that still has room to move inside the box.
fn projected_gradient_norm(
    gradient: &DVector<f64>,
    x: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) -> f64 {
    gradient
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let blocked = (x[i] <= lower[i] && *g > 0.0) || (x[i] >= upper[i] && *g < 0.0);
            if blocked {
                0.0
            } else {
                g.abs()
            }
        })
        .fold(0.0, f64::max)
}

impl ThrustAllocator for GaussNewtonAllocator {
    fn name(&self) -> &'static str {
        "gauss_newton"
    }

    fn allocate(
        &self,
        model: &dyn AccelerationModel,
        command: &AccelCommand,
        state: &VehicleState,
    ) -> Allocation {
        let n = model.thruster_count();
        let lower = model.lower_bounds();
        let upper = model.upper_bounds();
        let tol = self.settings.tolerance;

        let mut x = DVector::<f64>::zeros(n);
        let mut residual = model.residuals(&x, command, state);
        let mut cost = residual.norm_squared();
        let mut damping: Option<f64> = None;
        let mut stop_gradient: Option<f64> = None;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.settings.max_iterations {
            iterations += 1;

            let jacobian = model.calculate_jacobian(&x, state);
            let r = DVector::from_column_slice(residual.as_slice());
            let gradient = jacobian.tr_mul(&r);
            let stop = *stop_gradient.get_or_insert_with(|| tol * (1.0 + gradient.amax()));
            if projected_gradient_norm(&gradient, &x, &lower, &upper) <= stop {
                converged = true;
                break;
            }

            let mu = *damping.get_or_insert_with(|| {
                let largest = jacobian.column_iter().map(|c| c.norm_squared()).fold(0.0, f64::max);
                self.settings.initial_damping * (1.0 + largest)
            });
            let Some(inverse) = PseudoInverse::damped(&jacobian, mu) else {
                // A zero Jacobian cannot move the cost.
                converged = true;
                break;
            };
            let step = -inverse.apply(&r);

            let candidate = project(&(&x + &step), &lower, &upper);
            let moved = (&candidate - &x).amax();
            let candidate_residual = model.residuals(&candidate, command, state);
            let candidate_cost = candidate_residual.norm_squared();

            if candidate_cost < cost {
                x = candidate;
                residual = candidate_residual;
                cost = candidate_cost;
                damping = Some((mu * DAMPING_DECREASE).max(MIN_DAMPING));
            } else {
                damping = Some(mu * DAMPING_INCREASE);
            }

            // Steps this small no longer change the answer.
            if moved <= tol * (1.0 + x.amax()) {
                converged = true;
                break;
            }
        }

        let report = SolveReport::evaluate(self.name(), model, &x, command, state, iterations, converged);
        if !report.converged {
            warn!(
                iterations = report.iterations,
                cost = report.cost,
                "Gauss-Newton solve did not converge; returning the best point found."
            );
        } else {
            debug!(iterations = report.iterations, cost = report.cost, "Gauss-Newton solve finished.");
        }

        Allocation { forces: x, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dynamics::RigidBodyModel;
    use crate::reference::{reference_vehicle_with_limit, REFERENCE_MASS};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use nalgebra::Vector3;

    #[test]
    fn projected_gradient_ignores_components_pushing_against_a_bound() {
        let lo = DVector::from_element(3, -1.0);
        let hi = DVector::from_element(3, 1.0);
        let x = DVector::from_vec(vec![-1.0, 1.0, 0.0]);

        let g = DVector::from_vec(vec![5.0, -5.0, 0.25]);
        assert_eq!(projected_gradient_norm(&g, &x, &lo, &hi), 0.25);

        let g = DVector::from_vec(vec![-5.0, 0.0, 0.0]);
        assert_eq!(projected_gradient_norm(&g, &x, &lo, &hi), 5.0);
    }

    #[test]
    fn redundant_thrusters_get_the_minimum_norm_split() {
        // Sway and heave thrusters can cancel each other; none of them should move.
        let model = RigidBodyModel::new(reference_vehicle_with_limit(20.0).unwrap());
        let command = AccelCommand::new(0.0, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros());
        let out = GaussNewtonAllocator::default().allocate(&model, &command, &VehicleState::at_rest());

        assert!(out.report.converged);
        for j in 0..4 {
            assert_relative_eq!(out.forces[j], REFERENCE_MASS / 4.0, epsilon = 1e-9);
        }
        for j in 4..10 {
            assert_abs_diff_eq!(out.forces[j], 0.0, epsilon = 1e-9);
        }
    }
}
