// nereus_node/src/runtime/dispatch.rs

use super::clock::Stamping;
use super::sink::SolutionSink;
use super::NodePhase;
use nereus_core::context::AllocationContext;
use nereus_core::messages::InputEvent;
use std::ops::ControlFlow;
use std::sync::mpsc::Receiver;
use tracing::{debug, error, info};

/// Counters for one run of the loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub events: u64,
    pub inertial: u64,
    pub commands: u64,
    pub published: u64,
    pub rejected: u64,
    pub publish_failures: u64,
}

// The single consumer of input events. Events are handled strictly one at a
// time in arrival order; each command solves against whatever state the
// inertial events before it left behind.
pub struct EventLoop<S: SolutionSink> {
    context: AllocationContext,
    sink: S,
    stamping: Stamping,
    phase: NodePhase,
    summary: LoopSummary,
}

impl<S: SolutionSink> EventLoop<S> {
    pub fn new(context: AllocationContext, sink: S) -> Self {
        Self {
            context,
            sink,
            stamping: Stamping::default(),
            phase: NodePhase::Running,
            summary: LoopSummary::default(),
        }
    }

    pub fn with_stamping(mut self, stamping: Stamping) -> Self {
        self.stamping = stamping;
        self
    }

    /// Handles one event. `Break` means the loop should stop.
    pub fn handle(&mut self, event: InputEvent) -> ControlFlow<()> {
        if self.phase == NodePhase::Stopped {
            return ControlFlow::Break(());
        }
        self.summary.events += 1;
        let received = event.timestamp();

        match event {
            InputEvent::Inertial(measurement) => {
                self.summary.inertial += 1;
                if self.context.on_inertial(&measurement).is_err() {
                    self.summary.rejected += 1;
                    debug!(timestamp = ?received, "Dropped inertial sample.");
                }
            }
            InputEvent::Command(command) => {
                self.summary.commands += 1;
                let produced_at = self.stamping.stamp(&command);
                match self.context.on_command(&command, produced_at) {
                    Ok(solution) => match self.sink.publish(solution) {
                        Ok(()) => self.summary.published += 1,
                        Err(e) => {
                            self.summary.publish_failures += 1;
                            error!("Failed to publish thrust solution: {:#}", e);
                        }
                    },
                    Err(_) => {
                        self.summary.rejected += 1;
                        debug!(timestamp = ?received, "Dropped command.");
                    }
                }
            }
            InputEvent::Shutdown => {
                info!("Shutdown requested.");
                self.phase = NodePhase::Stopped;
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Consumes events until `Shutdown` arrives or every sender is gone.
    pub fn run(&mut self, events: &Receiver<InputEvent>) -> LoopSummary {
        info!("Dispatch loop running.");
        for event in events.iter() {
            if self.handle(event).is_break() {
                break;
            }
        }
        if self.phase != NodePhase::Stopped {
            debug!("All event producers disconnected.");
            self.phase = NodePhase::Stopped;
        }

        let stats = self.context.stats();
        info!(
            "Dispatch loop stopped: {} events, {} solutions published, {} rejected, {} saturated solves, {} unconverged solves.",
            self.summary.events,
            self.summary.published,
            self.summary.rejected,
            stats.saturated_solves,
            stats.unconverged_solves
        );
        self.summary
    }

    pub fn context(&self) -> &AllocationContext {
        &self.context
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn phase(&self) -> NodePhase {
        self.phase
    }

    pub fn summary(&self) -> LoopSummary {
        self.summary
    }
}
