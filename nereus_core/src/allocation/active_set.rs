// nereus_core/src/allocation/active_set.rs

use super::least_squares::min_norm_solve;
use super::{Allocation, SolveReport, SolverSettings, ThrustAllocator};
use crate::messages::AccelCommand;
use crate::models::dynamics::AccelerationModel;
use crate::state::VehicleState;
use nalgebra::{DMatrix, DVector};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Relative slack when deciding that a variable has reached a bound.
const BOUND_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Free,
    Lower,
    Upper,
}

/// Outcome of [`bounded_least_squares`].
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedSolution {
    pub x: DVector<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimizes `|a x - b|^2` subject to `lower <= x <= upper`.
///
/// A two-sided active-set method started at `x = 0`, which must be feasible.
/// Each free-variable subproblem is solved with the SVD pseudo-inverse, so when
/// no bound is active the answer is the minimum-norm solution.
///
/// # Arguments
/// * `a` - The m x n system matrix.
/// * `b` - The m-vector target.
/// * `lower`, `upper` - Per-variable bounds with `lower <= 0 <= upper`.
/// * `settings` - Iteration cap and optimality tolerance.
///
/// # Returns
/// The best feasible point found. `converged` is false when the iteration cap
/// was hit or the free variables are not stationary at the returned point.
pub fn bounded_least_squares(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
    settings: &SolverSettings,
) -> BoundedSolution {
    let n = a.ncols();
    let mut x = DVector::<f64>::zeros(n);
    // Zero-width bounds are pinned for good.
    let mut status: Vec<Bound> = (0..n)
        .map(|j| if upper[j] > lower[j] { Bound::Free } else { Bound::Lower })
        .collect();
    let bound_tol = |j: usize| BOUND_TOLERANCE * (1.0 + upper[j] - lower[j]);
    let gradient_tol = settings.tolerance * (1.0 + a.tr_mul(b).amax());

    // Variables freed by the KKT step that could not move at all. They stay
    // pinned until some other variable makes progress.
    let mut stuck: HashSet<usize> = HashSet::new();
    let mut last_freed: Option<usize> = None;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < settings.max_iterations {
        iterations += 1;

        let free: Vec<usize> = (0..n).filter(|&j| status[j] == Bound::Free).collect();
        if !free.is_empty() {
            // Move the pinned variables to the right-hand side.
            let mut rhs = b.clone();
            for j in (0..n).filter(|&j| status[j] != Bound::Free && x[j] != 0.0) {
                rhs.axpy(-x[j], &a.column(j), 1.0);
            }
            let z = min_norm_solve(&a.select_columns(&free), &rhs);

            let mut alpha = 1.0_f64;
            let mut blocking = None;
            for (k, &j) in free.iter().enumerate() {
                let step = z[k] - x[j];
                let limit = if z[k] > upper[j] {
                    (upper[j] - x[j]) / step
                } else if z[k] < lower[j] {
                    (lower[j] - x[j]) / step
                } else {
                    continue;
                };
                if blocking.is_none() || limit < alpha {
                    alpha = limit.clamp(0.0, 1.0);
                    blocking = Some(j);
                }
            }

            match blocking {
                None => {
                    for (k, &j) in free.iter().enumerate() {
                        x[j] = z[k];
                    }
                }
                Some(blocked) => {
                    for (k, &j) in free.iter().enumerate() {
                        x[j] += alpha * (z[k] - x[j]);
                    }
                    for &j in &free {
                        if j == blocked || x[j] <= lower[j] + bound_tol(j) || x[j] >= upper[j] - bound_tol(j) {
                            if (x[j] - lower[j]).abs() <= (upper[j] - x[j]).abs() {
                                x[j] = lower[j];
                                status[j] = Bound::Lower;
                            } else {
                                x[j] = upper[j];
                                status[j] = Bound::Upper;
                            }
                        }
                    }
                    if alpha > 0.0 {
                        stuck.clear();
                    } else if last_freed == Some(blocked) {
                        stuck.insert(blocked);
                    }
                    continue;
                }
            }
        }

        // Optimality check on the pinned variables: one is worth releasing
        // when the gradient points into the feasible interval.
        let gradient = a.tr_mul(&(a * &x - b));
        let mut release = None;
        let mut worst = gradient_tol;
        for j in 0..n {
            if upper[j] <= lower[j] || stuck.contains(&j) {
                continue;
            }
            let violation = match status[j] {
                Bound::Free => continue,
                Bound::Lower => -gradient[j],
                Bound::Upper => gradient[j],
            };
            if violation > worst {
                worst = violation;
                release = Some(j);
            }
        }

        match release {
            None => {
                // The free variables must be stationary too.
                let stationary = (0..n)
                    .filter(|&j| status[j] == Bound::Free)
                    .all(|j| gradient[j].abs() <= gradient_tol);
                converged = stationary;
                break;
            }
            Some(j) => {
                status[j] = Bound::Free;
                last_freed = Some(j);
            }
        }
    }

    BoundedSolution {
        x,
        iterations,
        converged,
    }
}

// --- Active Set Allocator ---
// The model is affine in the forces, acc(f) = B f + c, so the whole solve is
// one bounded linear least-squares problem: min |B f - (command - c)|^2.
#[derive(Debug, Clone, Default)]
pub struct ActiveSetAllocator {
    pub settings: SolverSettings,
}

impl ActiveSetAllocator {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }
}

impl ThrustAllocator for ActiveSetAllocator {
    fn name(&self) -> &'static str {
        "active_set"
    }

    fn allocate(
        &self,
        model: &dyn AccelerationModel,
        command: &AccelCommand,
        state: &VehicleState,
    ) -> Allocation {
        let effectiveness = model.effectiveness(state);
        let target = command.as_vector6() - model.bias(state);
        let target = DVector::from_column_slice(target.as_slice());

        let solution = bounded_least_squares(
            &effectiveness,
            &target,
            &model.lower_bounds(),
            &model.upper_bounds(),
            &self.settings,
        );

        let report = SolveReport::evaluate(
            self.name(),
            model,
            &solution.x,
            command,
            state,
            solution.iterations,
            solution.converged,
        );
        if !report.converged {
            warn!(
                iterations = report.iterations,
                cost = report.cost,
                "Active-set solve did not converge; returning the best point found."
            );
        } else {
            debug!(iterations = report.iterations, cost = report.cost, "Active-set solve finished.");
        }

        Allocation {
            forces: solution.x,
            report,
        }
    }
}
