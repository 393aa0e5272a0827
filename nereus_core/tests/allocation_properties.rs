// nereus_core/tests/allocation_properties.rs

use approx::{assert_abs_diff_eq, assert_relative_eq};
use nalgebra::{DMatrix, DVector, Vector3};
use nereus_core::allocation::{build_allocator, AllocatorKind, SolverSettings, ThrustAllocator};
use nereus_core::prelude::*;
use nereus_core::reference::{reference_vehicle, reference_vehicle_with_limit, REFERENCE_MASS};

// --- Helpers ---

fn allocators() -> Vec<Box<dyn ThrustAllocator>> {
    vec![
        Box::new(ActiveSetAllocator::default()),
        Box::new(GaussNewtonAllocator::default()),
    ]
}

fn spinning(w: Vector3<f64>) -> VehicleState {
    VehicleState {
        angular_velocity: w,
        ..VehicleState::at_rest()
    }
}

fn assert_within_bounds(model: &dyn AccelerationModel, forces: &DVector<f64>) {
    for (thruster, force) in model.thrusters().iter().zip(forces.iter()) {
        assert!(
            thruster.contains(*force),
            "{} = {} outside [{}, {}]",
            thruster.name(),
            force,
            thruster.min_force,
            thruster.max_force
        );
    }
}

fn assert_command_met(report: &SolveReport, command: &AccelCommand) {
    let wanted = command.as_vector6();
    for dof in Dof::ALL {
        let k = dof.index();
        assert_abs_diff_eq!(
            report.modeled[k],
            wanted[k],
            epsilon = 1e-6 * (1.0 + wanted[k].abs())
        );
    }
}

/// An irregular four-thruster vehicle small enough to enumerate every active set.
fn small_model() -> RigidBodyModel {
    let params = VehicleParameters::new(10.0, 0.8, 1.1, 0.6).unwrap();
    let thrusters = vec![
        ThrusterSpec::new("a", Vector3::new(0.3, 0.1, 0.0), Vector3::x(), 3.0),
        ThrusterSpec::new("b", Vector3::new(-0.2, -0.15, 0.05), Vector3::new(1.0, 1.0, 0.0), 2.0),
        ThrusterSpec::with_bounds("c", Vector3::new(0.1, 0.2, -0.1), Vector3::z(), -1.0, 4.0),
        ThrusterSpec::new("d", Vector3::new(-0.25, 0.0, 0.1), Vector3::new(0.0, 1.0, 0.5), 1.5),
    ];
    RigidBodyModel::new(Vehicle::new(params, thrusters).unwrap())
}

/// Minimum squared residual over every assignment of {free, lower, upper} to
/// each variable, solving the free variables by least squares.
fn brute_force_cost(model: &dyn AccelerationModel, command: &AccelCommand, state: &VehicleState) -> f64 {
    let a = model.effectiveness(state);
    let target = command.as_vector6() - model.bias(state);
    let b = DVector::from_column_slice(target.as_slice());
    let lower = model.lower_bounds();
    let upper = model.upper_bounds();
    let n = a.ncols();

    let mut best = f64::INFINITY;
    for code in 0..3usize.pow(n as u32) {
        let mut x = DVector::zeros(n);
        let mut free = Vec::new();
        let mut c = code;
        for j in 0..n {
            match c % 3 {
                0 => free.push(j),
                1 => x[j] = lower[j],
                _ => x[j] = upper[j],
            }
            c /= 3;
        }

        if !free.is_empty() {
            let mut rhs = b.clone();
            for j in (0..n).filter(|j| !free.contains(j)) {
                rhs -= a.column(j) * x[j];
            }
            let sub: DMatrix<f64> = a.select_columns(&free);
            let z = sub.svd(true, true).solve(&rhs, 1e-12).unwrap();
            for (k, &j) in free.iter().enumerate() {
                x[j] = z[k];
            }
        }

        let feasible = (0..n).all(|j| x[j] >= lower[j] - 1e-9 && x[j] <= upper[j] + 1e-9);
        if feasible {
            best = best.min((&a * &x - &b).norm_squared());
        }
    }
    best
}

// ==========================================================================
// == Feasible commands ==
// ==========================================================================

#[test]
fn feasible_commands_are_met_on_every_channel() {
    let model = RigidBodyModel::new(reference_vehicle_with_limit(50.0).unwrap());
    let cases = [
        (
            AccelCommand::new(0.0, Vector3::new(0.2, -0.1, 0.15), Vector3::new(0.3, -0.2, 0.25)),
            spinning(Vector3::new(0.1, -0.2, 0.3)),
        ),
        (
            AccelCommand::new(0.0, Vector3::new(-0.4, 0.0, 0.0), Vector3::new(0.0, 0.0, -0.5)),
            VehicleState::at_rest(),
        ),
        (
            AccelCommand::new(0.0, Vector3::new(0.0, 0.05, -0.3), Vector3::new(-0.1, 0.4, 0.0)),
            spinning(Vector3::new(-0.5, 0.0, 0.2)),
        ),
    ];

    for allocator in allocators() {
        for (command, state) in &cases {
            let out = allocator.allocate(&model, command, state);
            assert!(out.report.converged, "{} did not converge", allocator.name());
            assert_within_bounds(&model, &out.forces);
            assert_command_met(&out.report, command);
        }
    }
}

#[test]
fn identical_inputs_give_identical_outputs() {
    let model = RigidBodyModel::new(reference_vehicle().unwrap());
    let command = AccelCommand::new(3.0, Vector3::new(0.7, -0.3, 0.2), Vector3::new(0.1, 0.5, -0.2));
    let state = spinning(Vector3::new(0.2, 0.1, -0.4));

    for allocator in allocators() {
        let first = allocator.allocate(&model, &command, &state);
        let again = allocator.clone().allocate(&model, &command, &state);
        assert_eq!(first.forces, again.forces);
        assert_eq!(first.report, again.report);
    }
}

#[test]
fn zero_command_at_rest_gives_zero_forces() {
    let model = RigidBodyModel::new(reference_vehicle().unwrap());
    for allocator in allocators() {
        let out = allocator.allocate(&model, &AccelCommand::zero(0.0), &VehicleState::at_rest());
        assert_eq!(out.forces, DVector::zeros(10));
        assert_eq!(out.report.residual, Accel6::zeros());
        assert!(out.report.converged);
    }
}

// ==========================================================================
// == Saturation ==
// ==========================================================================

#[test]
fn saturating_commands_reach_the_brute_force_minimum() {
    let model = small_model();
    let cases = [
        (
            AccelCommand::new(0.0, Vector3::new(2.0, -1.0, 1.0), Vector3::new(0.5, -0.3, 0.8)),
            VehicleState::at_rest(),
        ),
        (
            AccelCommand::new(0.0, Vector3::new(-0.5, 0.6, -0.4), Vector3::new(-1.0, 0.2, 0.0)),
            spinning(Vector3::new(0.4, -0.3, 0.6)),
        ),
        (
            AccelCommand::new(0.0, Vector3::new(0.9, 0.9, 0.9), Vector3::zeros()),
            VehicleState::at_rest(),
        ),
    ];

    let allocator = ActiveSetAllocator::default();
    for (command, state) in &cases {
        let out = allocator.allocate(&model, command, state);
        let best = brute_force_cost(&model, command, state);

        assert!(out.report.converged);
        assert_within_bounds(&model, &out.forces);
        assert_relative_eq!(out.report.cost, best, epsilon = 1e-10, max_relative = 1e-8);
    }
}

#[test]
fn gauss_newton_stays_bounded_and_improves_on_zero_when_saturated() {
    let model = small_model();
    let command = AccelCommand::new(0.0, Vector3::new(2.0, -1.0, 1.0), Vector3::new(0.5, -0.3, 0.8));
    let state = VehicleState::at_rest();

    let out = GaussNewtonAllocator::default().allocate(&model, &command, &state);
    let zero_cost = command.as_vector6().norm_squared();
    let best = brute_force_cost(&model, &command, &state);

    assert_within_bounds(&model, &out.forces);
    assert!(out.report.cost < zero_cost);
    assert!(out.report.cost >= best - 1e-12);
}

#[test]
fn iteration_cap_returns_an_unconverged_bounded_point() {
    let model = RigidBodyModel::new(reference_vehicle().unwrap());
    let command = AccelCommand::new(0.0, Vector3::new(3.0, -2.0, 2.0), Vector3::new(4.0, -3.0, 5.0));
    let settings = SolverSettings {
        max_iterations: 1,
        ..SolverSettings::default()
    };

    for kind in [AllocatorKind::ActiveSet, AllocatorKind::GaussNewton] {
        let allocator = build_allocator(kind, settings).unwrap();
        let out = allocator.allocate(&model, &command, &VehicleState::at_rest());
        assert!(!out.report.converged);
        assert_eq!(out.report.iterations, 1);
        assert_within_bounds(&model, &out.forces);
    }
}

// ==========================================================================
// == Geometry ==
// ==========================================================================

#[test]
fn symmetric_thrusters_share_the_load() {
    let params = VehicleParameters::new(20.0, 1.0, 1.0, 1.0).unwrap();
    let thrusters = vec![
        ThrusterSpec::new("surge_port", Vector3::new(0.0, 0.3, 0.0), Vector3::x(), 10.0),
        ThrusterSpec::new("surge_stbd", Vector3::new(0.0, -0.3, 0.0), Vector3::x(), 10.0),
        ThrusterSpec::new("heave_fwd", Vector3::new(0.3, 0.0, 0.0), Vector3::z(), 10.0),
        ThrusterSpec::new("heave_aft", Vector3::new(-0.3, 0.0, 0.0), Vector3::z(), 10.0),
    ];
    let model = RigidBodyModel::new(Vehicle::new(params, thrusters).unwrap());
    let command = AccelCommand::new(0.0, Vector3::new(0.5, 0.0, -0.25), Vector3::zeros());

    for allocator in allocators() {
        let f = allocator.allocate(&model, &command, &VehicleState::at_rest()).forces;
        assert_relative_eq!(f[0], f[1], epsilon = 1e-9);
        assert_relative_eq!(f[2], f[3], epsilon = 1e-9);
        assert_relative_eq!(f[0], 5.0, epsilon = 1e-6);
        assert_relative_eq!(f[2], -2.5, epsilon = 1e-6);
    }
}

#[test]
fn reference_surge_uses_only_the_surge_thrusters() {
    let model = RigidBodyModel::new(reference_vehicle_with_limit(20.0).unwrap());
    let command = AccelCommand::new(0.0, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros());

    for allocator in allocators() {
        let out = allocator.allocate(&model, &command, &VehicleState::at_rest());
        for j in 0..4 {
            assert_relative_eq!(out.forces[j], REFERENCE_MASS / 4.0, epsilon = 1e-6);
            assert_abs_diff_eq!(out.forces[j], out.forces[0], epsilon = 1e-9);
        }
        for j in 4..10 {
            assert_abs_diff_eq!(out.forces[j], 0.0, epsilon = 1e-9);
        }
        assert_relative_eq!(out.report.modeled[Dof::Surge.index()], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out.report.residual, Accel6::zeros(), epsilon = 1e-9);
        assert!(!out.report.is_saturated());
    }
}

#[test]
fn reference_surge_at_the_stock_limit_saturates_cleanly() {
    let model = RigidBodyModel::new(reference_vehicle().unwrap());
    let command = AccelCommand::new(0.0, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros());
    let out = ActiveSetAllocator::default().allocate(&model, &command, &VehicleState::at_rest());

    assert!(out.report.converged);
    for j in 0..4 {
        assert_relative_eq!(out.forces[j], 5.0, epsilon = 1e-12);
    }
    for j in 4..10 {
        assert_abs_diff_eq!(out.forces[j], 0.0, epsilon = 1e-9);
    }
    assert_eq!(out.report.saturated, vec![0, 1, 2, 3]);

    let reachable = 20.0 / REFERENCE_MASS;
    assert_relative_eq!(out.report.modeled[Dof::Surge.index()], reachable, epsilon = 1e-12);
    assert_relative_eq!(out.report.cost, (1.0 - reachable).powi(2), epsilon = 1e-12);
}

#[test]
fn gyroscopic_bias_is_cancelled_by_the_thrusters() {
    let model = RigidBodyModel::new(reference_vehicle_with_limit(50.0).unwrap());
    let state = spinning(Vector3::new(0.3, 0.0, 0.5));
    let bias = model.bias(&state);

    // (Izz - Ixx) wx wz / Iyy with Izz < Ixx: pitch is pushed nose-down.
    assert!(bias[Dof::Pitch.index()] < 0.0);
    assert_eq!(bias[Dof::Roll.index()], 0.0);
    assert_eq!(bias[Dof::Yaw.index()], 0.0);

    for allocator in allocators() {
        let out = allocator.allocate(&model, &AccelCommand::zero(0.0), &state);
        assert_abs_diff_eq!(out.report.modeled, Accel6::zeros(), epsilon = 1e-9);
        assert!(out.forces.amax() > 0.0);
    }
}
