// nereus_node/src/cli.rs

use crate::config::NodeConfig;
use clap::Parser;
use std::path::PathBuf;

/// Nereus: thrust allocation for a multi-thruster underwater vehicle.
///
/// Loads the vehicle description, acquires the thruster geometry and then
/// turns acceleration commands into per-thruster forces.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The vehicle TOML file. The built-in reference vehicle is used when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Drive the loop with the synthetic scenario from the `[scenario]` section.
    #[arg(long, default_value_t = false)]
    pub scenario: bool,

    /// Seed for the scenario's random number generator.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Scenario length in seconds.
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Log the full solve report with every published solution.
    #[arg(long, default_value_t = false)]
    pub report: bool,

    /// Print the resolved configuration as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Applies the flags that shadow configuration values.
    pub fn apply_overrides(&self, config: &mut NodeConfig) {
        if let Some(seed) = self.seed {
            config.scenario.seed = Some(seed);
        }
        if let Some(duration) = self.duration {
            config.scenario.duration_seconds = duration;
        }
    }
}
