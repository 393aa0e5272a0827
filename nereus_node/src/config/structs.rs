// nereus_node/src/config/structs.rs

use super::serde_helpers;
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use nereus_core::allocation::{AllocatorKind, SolverSettings};
use nereus_core::context::DEFAULT_SOLUTION_FRAME;
use nereus_core::error::ConfigError;
use nereus_core::reference;
use nereus_core::validation::{require_positive, InputLimits};
use nereus_core::vehicle::VehicleParameters;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::Duration;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # NodeConfig
/// Everything the node needs at startup. Every section is optional; a missing
/// section falls back to the reference vehicle's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct NodeConfig {
    #[serde(default)]
    pub vehicle: VehicleConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    // The TOML has `[[thrusters]]`, which becomes a Vec of ThrusterConfig structs.
    #[serde(default = "default_thrusters")]
    pub thrusters: Vec<ThrusterConfig>,

    #[serde(default)]
    pub imu: ImuConfig,

    #[serde(default)]
    pub input: InputLimits,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    #[serde(default)]
    pub scenario: ScenarioConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            vehicle: VehicleConfig::default(),
            limits: LimitsConfig::default(),
            thrusters: default_thrusters(),
            imu: ImuConfig::default(),
            input: InputLimits::default(),
            solver: SolverConfig::default(),
            acquisition: AcquisitionConfig::default(),
            scenario: ScenarioConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Force limit for a thruster: its own override, else the vehicle-wide limit.
    pub fn max_thrust_for(&self, thruster: &ThrusterConfig) -> f64 {
        thruster.max_thrust.unwrap_or(self.limits.max_thrust)
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleConfig {
    /// [kg]
    pub mass: f64,
    /// Principal moments [Ixx, Iyy, Izz] in kg*m^2.
    pub inertia: [f64; 3],
    /// Frame id stamped on every published solution.
    #[serde(default = "default_base_link")]
    pub frame_id: String,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            mass: reference::REFERENCE_MASS,
            inertia: [
                reference::REFERENCE_IXX,
                reference::REFERENCE_IYY,
                reference::REFERENCE_IZZ,
            ],
            frame_id: default_base_link(),
        }
    }
}

impl VehicleConfig {
    pub fn parameters(&self) -> Result<VehicleParameters, ConfigError> {
        let [ixx, iyy, izz] = self.inertia;
        VehicleParameters::new(self.mass, ixx, iyy, izz)
    }
}

fn default_base_link() -> String {
    DEFAULT_SOLUTION_FRAME.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Symmetric per-thruster limit [N].
    pub max_thrust: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_thrust: reference::REFERENCE_MAX_THRUST,
        }
    }
}

/// One thruster's mounting pose in the body frame. The thruster pushes along
/// the +x axis of its rotated frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThrusterConfig {
    pub name: String,

    #[serde(with = "serde_helpers::vec3_from_array")]
    pub position: Vector3<f64>,

    /// Roll, pitch, yaw in degrees.
    #[serde(with = "serde_helpers::quat_from_euler_deg", default)]
    pub orientation: UnitQuaternion<f64>,

    /// Overrides `[limits] max_thrust` for this thruster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_thrust: Option<f64>,
}

impl ThrusterConfig {
    pub fn pose(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation)
    }
}

fn default_thrusters() -> Vec<ThrusterConfig> {
    reference::reference_layout()
        .into_iter()
        .map(|(name, position, direction)| ThrusterConfig {
            name: name.to_string(),
            position,
            orientation: UnitQuaternion::rotation_between(&Vector3::x(), &direction)
                .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI)),
            max_thrust: None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImuConfig {
    pub name: String,
    /// Mounting point relative to the center of mass [m].
    #[serde(with = "serde_helpers::vec3_from_array", default)]
    pub offset: Vector3<f64>,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            name: reference::REFERENCE_IMU_NAME.to_string(),
            offset: reference::reference_imu_offset(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverConfig {
    #[serde(default)]
    pub kind: AllocatorKind,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_initial_damping")]
    pub initial_damping: f64,
}

fn default_max_iterations() -> usize {
    SolverSettings::default().max_iterations
}
fn default_tolerance() -> f64 {
    SolverSettings::default().tolerance
}
fn default_initial_damping() -> f64 {
    SolverSettings::default().initial_damping
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: AllocatorKind::default(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            initial_damping: default_initial_damping(),
        }
    }
}

impl SolverConfig {
    pub fn settings(&self) -> SolverSettings {
        SolverSettings {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            initial_damping: self.initial_damping,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcquisitionConfig {
    /// How long to wait for each frame before giving up [s].
    #[serde(default = "default_acquisition_timeout")]
    pub timeout_seconds: f64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_acquisition_timeout() -> f64 {
    10.0
}
fn default_poll_interval() -> u64 {
    50
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_acquisition_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl AcquisitionConfig {
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        let seconds = require_positive("acquisition.timeout_seconds", self.timeout_seconds)?;
        Duration::try_from_secs_f64(seconds).map_err(|_| ConfigError::NonFinite {
            field: "acquisition.timeout_seconds".into(),
            value: seconds,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// =========================================================================
// == Synthetic Scenario ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Optional seed for the pseudo-random number generator for determinism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Inertial and command event rate [Hz].
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,
    /// Length of the run [s].
    #[serde(default = "default_duration")]
    pub duration_seconds: f64,
    /// Pace events in wall-clock time instead of emitting them back to back.
    #[serde(default)]
    pub realtime: bool,
    /// True body rate of the simulated vehicle [rad/s].
    #[serde(with = "serde_helpers::vec3_from_array", default)]
    pub angular_velocity: Vector3<f64>,
    /// Per-axis gyro white-noise standard deviation [rad/s].
    #[serde(default = "default_gyro_noise")]
    pub gyro_noise_stddev: [f64; 3],
    /// Piecewise-constant command script; each entry holds until the next.
    #[serde(default = "default_script")]
    pub commands: Vec<ScriptedCommand>,
}

fn default_rate_hz() -> f64 {
    20.0
}
fn default_duration() -> f64 {
    5.0
}
fn default_gyro_noise() -> [f64; 3] {
    [0.002; 3]
}

fn default_script() -> Vec<ScriptedCommand> {
    vec![
        ScriptedCommand::new(0.0, [0.0; 3], [0.0; 3]),
        ScriptedCommand::new(1.0, [0.3, 0.0, 0.0], [0.0; 3]),
        ScriptedCommand::new(2.0, [0.0, 0.0, -0.2], [0.0, 0.0, 0.5]),
        ScriptedCommand::new(3.0, [1.0, 0.0, 0.0], [0.0; 3]),
        ScriptedCommand::new(4.0, [0.0; 3], [0.0; 3]),
    ]
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: None,
            rate_hz: default_rate_hz(),
            duration_seconds: default_duration(),
            realtime: false,
            angular_velocity: Vector3::zeros(),
            gyro_noise_stddev: default_gyro_noise(),
            commands: default_script(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedCommand {
    /// Start time [s].
    pub at: f64,
    /// (surge, sway, heave) [m/s^2]
    #[serde(with = "serde_helpers::vec3_from_array", default)]
    pub linear: Vector3<f64>,
    /// (roll, pitch, yaw) [rad/s^2]
    #[serde(with = "serde_helpers::vec3_from_array", default)]
    pub angular: Vector3<f64>,
}

impl ScriptedCommand {
    pub fn new(at: f64, linear: [f64; 3], angular: [f64; 3]) -> Self {
        Self {
            at,
            linear: Vector3::from(linear),
            angular: Vector3::from(angular),
        }
    }
}
