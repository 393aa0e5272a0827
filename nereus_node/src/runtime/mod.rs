// nereus_node/src/runtime/mod.rs

//! Startup and the steady-state event loop.

pub mod acquisition;
pub mod clock;
pub mod dispatch;
pub mod sink;
pub mod transforms;

use crate::config::NodeConfig;
use acquisition::{acquire_vehicle, AcquisitionPolicy, GeometryRequest};
use anyhow::Context;
use nereus_core::allocation::build_allocator;
use nereus_core::context::AllocationContext;
use nereus_core::models::dynamics::RigidBodyModel;
use nereus_core::prelude::TfProvider;
use tracing::info;

/// Defines the major phases of the node's lifecycle.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum NodePhase {
    /// Loading and validating the configuration.
    #[default]
    Configuring,
    /// Waiting on the transform source for every thruster frame.
    AcquiringGeometry,
    /// Consuming input events.
    Running,
    /// Shutdown received or every producer hung up.
    Stopped,
}

/// Runs the startup phases and returns the context the dispatch loop will own.
///
/// # Arguments
/// * `config` - The resolved node configuration.
/// * `tf` - The transform source to read thruster mounting poses from.
///
/// # Returns
/// A ready [`AllocationContext`], or the first configuration or geometry error.
pub fn build_context(config: &NodeConfig, tf: &dyn TfProvider) -> anyhow::Result<AllocationContext> {
    info!("Phase: {:?}", NodePhase::Configuring);
    let params = config
        .vehicle
        .parameters()
        .context("invalid [vehicle] section")?;
    let policy = AcquisitionPolicy::from_config(config).context("invalid [acquisition] section")?;
    let allocator = build_allocator(config.solver.kind, config.solver.settings())
        .context("invalid [solver] section")?;

    info!("Phase: {:?}", NodePhase::AcquiringGeometry);
    let request = GeometryRequest::from_config(config);
    let vehicle = acquire_vehicle(tf, &request, &policy, params).with_context(|| {
        let names: Vec<&str> = request.thrusters.iter().map(|(n, _)| n.as_str()).collect();
        format!("failed to assemble the vehicle from thruster frames {names:?}")
    })?;
    info!(
        "Vehicle ready: {} thrusters, mass {} kg, inertia [{}, {}, {}], solver {}",
        vehicle.thruster_count(),
        vehicle.params().mass,
        vehicle.params().ixx(),
        vehicle.params().iyy(),
        vehicle.params().izz(),
        allocator.name()
    );

    Ok(
        AllocationContext::new(Box::new(RigidBodyModel::new(vehicle)), allocator)
            .with_limits(config.input)
            .with_frame_id(config.vehicle.frame_id.clone()),
    )
}
