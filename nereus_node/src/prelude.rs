// nereus_node/src/prelude.rs

// Re-export everything from the core library's prelude.
pub use nereus_core::prelude::*;

// --- Node-specific exports ---
pub use crate::cli::Cli;
pub use crate::config::NodeConfig;
pub use crate::runtime::acquisition::{acquire_geometry, AcquisitionPolicy, GeometryRequest};
pub use crate::runtime::build_context;
pub use crate::runtime::clock::Stamping;
pub use crate::runtime::dispatch::{EventLoop, LoopSummary};
pub use crate::runtime::sink::{ChannelSink, LogSink, SolutionSink};
pub use crate::runtime::transforms::StaticTfTree;
pub use crate::runtime::NodePhase;
pub use crate::scenario::ScenarioSource;
