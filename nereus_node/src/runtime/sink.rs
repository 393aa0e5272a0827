// nereus_node/src/runtime/sink.rs

use anyhow::anyhow;
use nereus_core::messages::ThrustSolution;
use std::sync::mpsc::Sender;
use tracing::info;

/// Where published solutions go. Transport and framing live behind this trait.
pub trait SolutionSink {
    fn publish(&mut self, solution: &ThrustSolution) -> anyhow::Result<()>;
}

/// Writes every solution to the log. With `report` set, the full solve report
/// is logged too.
#[derive(Debug, Default, Clone)]
pub struct LogSink {
    pub report: bool,
}

impl LogSink {
    pub fn new(report: bool) -> Self {
        Self { report }
    }
}

impl SolutionSink for LogSink {
    fn publish(&mut self, solution: &ThrustSolution) -> anyhow::Result<()> {
        let forces = solution
            .iter()
            .map(|(name, force)| format!("{name}={force:+.3}"))
            .collect::<Vec<_>>()
            .join(" ");
        info!("[{}] t={:.3} {}", solution.frame_id, solution.timestamp, forces);
        if self.report {
            info!("{}", solution.report);
        }
        Ok(())
    }
}

/// Forwards solutions to another thread.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<ThrustSolution>,
}

impl ChannelSink {
    pub fn new(sender: Sender<ThrustSolution>) -> Self {
        Self { sender }
    }
}

impl SolutionSink for ChannelSink {
    fn publish(&mut self, solution: &ThrustSolution) -> anyhow::Result<()> {
        self.sender
            .send(solution.clone())
            .map_err(|_| anyhow!("solution receiver has hung up"))
    }
}

/// Keeps everything in memory.
impl SolutionSink for Vec<ThrustSolution> {
    fn publish(&mut self, solution: &ThrustSolution) -> anyhow::Result<()> {
        self.push(solution.clone());
        Ok(())
    }
}
