// nereus_core/src/reference.rs

//! The reference vehicle: ten thrusters on an asymmetric frame.
//!
//! Mass properties and force limits are the vehicle's measured values. The
//! layout puts four surge thrusters at the stern corners, two sway thrusters
//! fore and aft of the center of mass, and four heave thrusters near the
//! corners of the frame.

use crate::error::ConfigError;
use crate::vehicle::{ThrusterSpec, Vehicle, VehicleParameters};
use nalgebra::Vector3;

/// [kg]
pub const REFERENCE_MASS: f64 = 34.479_409_50;
/// [kg*m^2]
pub const REFERENCE_IXX: f64 = 1.335;
pub const REFERENCE_IYY: f64 = 1.501;
pub const REFERENCE_IZZ: f64 = 0.6189;
/// Symmetric per-thruster limit [N].
pub const REFERENCE_MAX_THRUST: f64 = 5.0;

/// Thruster names in force-vector order.
pub const REFERENCE_THRUSTER_NAMES: [&str; 10] = [
    "surge_port_hi",
    "surge_stbd_hi",
    "surge_port_lo",
    "surge_stbd_lo",
    "sway_fwd",
    "sway_aft",
    "heave_port_fwd",
    "heave_stbd_fwd",
    "heave_port_aft",
    "heave_stbd_aft",
];

pub const REFERENCE_IMU_NAME: &str = "imu_one";

pub fn reference_parameters() -> Result<VehicleParameters, ConfigError> {
    VehicleParameters::new(REFERENCE_MASS, REFERENCE_IXX, REFERENCE_IYY, REFERENCE_IZZ)
}

/// The ten thrusters as (name, position, direction). x forward, y port, z up.
pub fn reference_layout() -> [(&'static str, Vector3<f64>, Vector3<f64>); 10] {
    let [sph, ssh, spl, ssl, swf, swa, hpf, hsf, hpa, hsa] = REFERENCE_THRUSTER_NAMES;
    [
        (sph, Vector3::new(-0.20, 0.25, 0.10), Vector3::x()),
        (ssh, Vector3::new(-0.20, -0.25, 0.10), Vector3::x()),
        (spl, Vector3::new(-0.20, 0.25, -0.10), Vector3::x()),
        (ssl, Vector3::new(-0.20, -0.25, -0.10), Vector3::x()),
        (swf, Vector3::new(0.35, 0.0, 0.02), Vector3::y()),
        (swa, Vector3::new(-0.30, 0.0, 0.02), Vector3::y()),
        (hpf, Vector3::new(0.28, 0.18, 0.0), Vector3::z()),
        (hsf, Vector3::new(0.28, -0.18, 0.0), Vector3::z()),
        (hpa, Vector3::new(-0.32, 0.18, 0.0), Vector3::z()),
        (hsa, Vector3::new(-0.32, -0.18, 0.0), Vector3::z()),
    ]
}

/// IMU mounting point relative to the center of mass [m].
pub fn reference_imu_offset() -> Vector3<f64> {
    Vector3::new(0.05, 0.0, 0.08)
}

pub fn reference_thrusters(max_force: f64) -> Vec<ThrusterSpec> {
    reference_layout()
        .into_iter()
        .map(|(name, position, direction)| ThrusterSpec::new(name, position, direction, max_force))
        .collect()
}

/// The reference vehicle with every thruster limited to `max_force`.
pub fn reference_vehicle_with_limit(max_force: f64) -> Result<Vehicle, ConfigError> {
    Ok(Vehicle::new(reference_parameters()?, reference_thrusters(max_force))?
        .with_imu_offset(reference_imu_offset()))
}

pub fn reference_vehicle() -> Result<Vehicle, ConfigError> {
    reference_vehicle_with_limit(REFERENCE_MAX_THRUST)
}
