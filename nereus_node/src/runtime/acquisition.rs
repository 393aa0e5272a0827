// nereus_node/src/runtime/acquisition.rs

//! Startup acquisition of the thruster mounting geometry.
//!
//! Every frame is waited for with its own bounded timeout. This runs once,
//! before the dispatch loop starts; a timeout is fatal.

use crate::config::NodeConfig;
use nalgebra::{Isometry3, Vector3};
use nereus_core::error::{ConfigError, GeometryError, NereusError};
use nereus_core::prelude::{FrameId, TfProvider, ThrusterSpec, Vehicle, VehicleParameters};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionPolicy {
    /// Budget per frame.
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl AcquisitionPolicy {
    pub fn from_config(config: &NodeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            timeout: config.acquisition.timeout()?,
            poll_interval: config.acquisition.poll_interval(),
        })
    }
}

/// What to look up: thruster frames in force-vector order, plus the IMU.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRequest {
    pub thrusters: Vec<(String, f64)>,
    pub imu: String,
}

impl GeometryRequest {
    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            thrusters: config
                .thrusters
                .iter()
                .map(|t| (t.name.clone(), config.max_thrust_for(t)))
                .collect(),
            imu: config.imu.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredGeometry {
    pub thrusters: Vec<ThrusterSpec>,
    pub imu_offset: Vector3<f64>,
}

/// Polls `tf` until the transform appears or the policy's timeout runs out.
pub fn wait_for_transform(
    tf: &dyn TfProvider,
    from: &FrameId,
    to: &FrameId,
    policy: &AcquisitionPolicy,
) -> Result<Isometry3<f64>, GeometryError> {
    let start = Instant::now();
    loop {
        if let Some(pose) = tf.get_transform(from, to) {
            debug!("Found transform {} -> {} after {:?}", from, to, start.elapsed());
            return Ok(pose);
        }
        let waited = start.elapsed();
        if waited >= policy.timeout {
            return Err(GeometryError::Timeout {
                from: from.clone(),
                to: to.clone(),
                waited,
            });
        }
        thread::sleep(policy.poll_interval.min(policy.timeout - waited));
    }
}

/// Looks up every requested frame relative to the body frame.
///
/// # Arguments
/// * `tf` - The transform source.
/// * `request` - Thruster names (with their force limits) and the IMU name.
/// * `policy` - Per-frame timeout and polling interval.
///
/// # Returns
/// Thruster specs in request order and the IMU mounting offset, or the first
/// lookup that timed out.
pub fn acquire_geometry(
    tf: &dyn TfProvider,
    request: &GeometryRequest,
    policy: &AcquisitionPolicy,
) -> Result<AcquiredGeometry, GeometryError> {
    let body = FrameId::Body;
    let mut thrusters = Vec::with_capacity(request.thrusters.len());

    for (name, max_force) in &request.thrusters {
        if name.trim().is_empty() {
            return Err(GeometryError::MissingFrame(name.clone()));
        }
        let frame = FrameId::Thruster(name.clone());
        let pose = wait_for_transform(tf, &body, &frame, policy)?;
        let spec = ThrusterSpec::from_pose(name.clone(), &pose, *max_force);
        info!(
            "{}: position [{:.3}, {:.3}, {:.3}] m, direction [{:.3}, {:.3}, {:.3}], limit {} N",
            frame,
            spec.position.x,
            spec.position.y,
            spec.position.z,
            spec.direction.x,
            spec.direction.y,
            spec.direction.z,
            max_force
        );
        thrusters.push(spec);
    }

    let imu = FrameId::Sensor(request.imu.clone());
    let imu_offset = wait_for_transform(tf, &body, &imu, policy)?.translation.vector;
    info!(
        "{}: offset [{:.3}, {:.3}, {:.3}] m",
        imu, imu_offset.x, imu_offset.y, imu_offset.z
    );

    Ok(AcquiredGeometry {
        thrusters,
        imu_offset,
    })
}

/// Acquires the geometry and assembles the validated [`Vehicle`] from it.
///
/// Fails with [`NereusError::Geometry`] when a frame never shows up and with
/// [`NereusError::Config`] when the acquired poses break a vehicle invariant.
pub fn acquire_vehicle(
    tf: &dyn TfProvider,
    request: &GeometryRequest,
    policy: &AcquisitionPolicy,
    params: VehicleParameters,
) -> Result<Vehicle, NereusError> {
    let geometry = acquire_geometry(tf, request, policy)?;
    let vehicle = Vehicle::new(params, geometry.thrusters)?.with_imu_offset(geometry.imu_offset);
    Ok(vehicle)
}
