// nereus_node/src/runtime/clock.rs

use nereus_core::messages::AccelCommand;
use std::time::{SystemTime, UNIX_EPOCH};

/// How a solution gets its production timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stamping {
    /// Seconds since the Unix epoch when the solve finished.
    #[default]
    WallClock,
    /// The triggering command's own timestamp. Makes replays reproducible.
    EventTime,
}

impl Stamping {
    pub fn stamp(&self, command: &AccelCommand) -> f64 {
        match self {
            Stamping::WallClock => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or_default(),
            Stamping::EventTime => command.timestamp,
        }
    }
}
