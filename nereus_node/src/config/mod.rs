// nereus_node/src/config/mod.rs

//! Loading and dumping of the node configuration.
//!
//! Layers, lowest priority first: built-in reference vehicle, the TOML file
//! given on the command line, then `NEREUS_`-prefixed environment variables
//! (`NEREUS_SOLVER__KIND=gauss_newton` sets `[solver] kind`).

pub mod serde_helpers;
pub mod structs;

use anyhow::Context;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;
use tracing::info;

pub use structs::{
    AcquisitionConfig, ImuConfig, LimitsConfig, NodeConfig, ScenarioConfig, ScriptedCommand,
    SolverConfig, ThrusterConfig, VehicleConfig,
};

pub const ENV_PREFIX: &str = "NEREUS_";

/// Defaults plus the optional TOML file, without the environment layer.
pub fn file_figment(path: Option<&Path>) -> Figment {
    let figment = Figment::from(Serialized::defaults(NodeConfig::default()));
    match path {
        Some(path) => figment.merge(Toml::file(path)),
        None => figment,
    }
}

/// Builds the full layered figment without extracting it.
pub fn figment(path: Option<&Path>) -> Figment {
    file_figment(path).merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Loads every layer, environment overrides included.
pub fn load(path: Option<&Path>) -> anyhow::Result<NodeConfig> {
    extract(figment(path), path)
}

/// Loads the defaults and the file only; `NEREUS_*` variables are ignored.
pub fn load_file(path: Option<&Path>) -> anyhow::Result<NodeConfig> {
    extract(file_figment(path), path)
}

fn extract(figment: Figment, path: Option<&Path>) -> anyhow::Result<NodeConfig> {
    match path {
        Some(p) => {
            info!("Loading vehicle configuration from: {}", p.display());
            // Toml::file silently yields nothing for a missing file.
            anyhow::ensure!(p.is_file(), "configuration file {} does not exist", p.display());
        }
        None => info!("No configuration file given; using the reference vehicle."),
    }

    figment.extract().with_context(|| match path {
        Some(p) => format!("failed to load configuration from {}", p.display()),
        None => "failed to load the default configuration".to_string(),
    })
}

/// Parses a configuration from a TOML string, on top of the built-in defaults.
pub fn from_toml_str(toml: &str) -> anyhow::Result<NodeConfig> {
    Figment::from(Serialized::defaults(NodeConfig::default()))
        .merge(Toml::string(toml))
        .extract()
        .context("failed to parse configuration")
}

/// The resolved configuration, rendered back to TOML.
pub fn to_toml(config: &NodeConfig) -> anyhow::Result<String> {
    toml::to_string_pretty(config).context("failed to render configuration as TOML")
}
