// nereus_core/src/allocation/mod.rs

//! Bounded least-squares thrust allocation.
//!
//! An allocator receives a command, a state snapshot and the model, and returns
//! one force per thruster inside that thruster's bounds. It carries no state
//! from one call to the next, so identical inputs give identical outputs.

pub mod active_set;
pub mod gauss_newton;
pub(crate) mod least_squares;

use crate::error::ConfigError;
use crate::messages::AccelCommand;
use crate::models::dynamics::AccelerationModel;
use crate::state::VehicleState;
use crate::types::{Accel6, Dof};
use active_set::ActiveSetAllocator;
use dyn_clone::DynClone;
use gauss_newton::GaussNewtonAllocator;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Relative tolerance for deciding that a force sits on one of its bounds.
const SATURATION_TOLERANCE: f64 = 1e-9;

// --- The Allocator Contract ---
pub trait ThrustAllocator: DynClone + Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Solves for the force vector whose modeled acceleration best matches `command`.
    ///
    /// Saturation and running out of iterations are reported through
    /// [`SolveReport`], never as errors.
    fn allocate(
        &self,
        model: &dyn AccelerationModel,
        command: &AccelCommand,
        state: &VehicleState,
    ) -> Allocation;
}
dyn_clone::clone_trait_object!(ThrustAllocator);

/// Raw result of one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub forces: DVector<f64>,
    pub report: SolveReport,
}

/// Diagnostics of one solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveReport {
    pub solver: &'static str,
    pub iterations: usize,
    pub converged: bool,
    /// Sum of squared residuals.
    pub cost: f64,
    /// Modeled acceleration at the returned forces.
    pub modeled: Accel6,
    /// Modeled minus commanded.
    pub residual: Accel6,
    /// Indices of thrusters sitting on a non-zero bound.
    pub saturated: Vec<usize>,
}

impl SolveReport {
    /// Evaluates the model at `forces` and fills in everything but the solver bookkeeping.
    pub fn evaluate(
        solver: &'static str,
        model: &dyn AccelerationModel,
        forces: &DVector<f64>,
        command: &AccelCommand,
        state: &VehicleState,
        iterations: usize,
        converged: bool,
    ) -> Self {
        let modeled = model.acceleration(forces, state);
        let residual = modeled - command.as_vector6();
        let saturated = model
            .thrusters()
            .iter()
            .zip(forces.iter())
            .filter(|(t, f)| {
                let at = |bound: f64| {
                    bound != 0.0 && (**f - bound).abs() <= SATURATION_TOLERANCE * bound.abs().max(1.0)
                };
                at(t.min_force) || at(t.max_force)
            })
            .map(|(t, _)| t.id.index)
            .collect();

        Self {
            solver,
            iterations,
            converged,
            cost: residual.norm_squared(),
            modeled,
            residual,
            saturated,
        }
    }

    pub fn residual_norm(&self) -> f64 {
        self.cost.sqrt()
    }

    pub fn is_saturated(&self) -> bool {
        !self.saturated.is_empty()
    }
}

impl fmt::Display for SolveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} solver: {} iterations, converged: {}, cost: {:.3e}",
            self.solver, self.iterations, self.converged, self.cost
        )?;
        for dof in Dof::ALL {
            let unit = if dof.is_angular() { "rad/s^2" } else { "m/s^2" };
            writeln!(
                f,
                "  {:<6} modeled {:>10.5} residual {:>11.3e} {}",
                dof.name(),
                self.modeled[dof.index()],
                self.residual[dof.index()],
                unit
            )?;
        }
        write!(f, "  saturated thrusters: {:?}", self.saturated)
    }
}

// --- Configuration ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocatorKind {
    #[default]
    ActiveSet,
    GaussNewton,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Hard cap on solver iterations per solve.
    pub max_iterations: usize,
    /// Relative optimality tolerance.
    pub tolerance: f64,
    /// Initial Levenberg-Marquardt damping, relative to the largest diagonal of JᵀJ.
    pub initial_damping: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-10,
            initial_damping: 1e-9,
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Solver("max_iterations must be at least 1".into()));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ConfigError::Solver(format!(
                "tolerance must be finite and positive, got {}",
                self.tolerance
            )));
        }
        if !(self.initial_damping.is_finite() && self.initial_damping > 0.0) {
            return Err(ConfigError::Solver(format!(
                "initial_damping must be finite and positive, got {}",
                self.initial_damping
            )));
        }
        Ok(())
    }
}

/// Builds the allocator selected by configuration.
pub fn build_allocator(
    kind: AllocatorKind,
    settings: SolverSettings,
) -> Result<Box<dyn ThrustAllocator>, ConfigError> {
    settings.validate()?;
    Ok(match kind {
        AllocatorKind::ActiveSet => Box::new(ActiveSetAllocator::new(settings)),
        AllocatorKind::GaussNewton => Box::new(GaussNewtonAllocator::new(settings)),
    })
}
