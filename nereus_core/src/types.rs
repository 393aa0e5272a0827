// nereus_core/src/types.rs

use crate::frames::FrameId;
use nalgebra::{Isometry3, Vector6};
use std::fmt;

// --- Core Type Aliases ---
/// Body-frame acceleration, rows ordered [surge, sway, heave, roll, pitch, yaw].
pub type Accel6 = Vector6<f64>;

/// The six acceleration channels. `index()` is the row used by every `Accel6`
/// and by the rows of the effectiveness matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dof {
    Surge,
    Sway,
    Heave,
    Roll,
    Pitch,
    Yaw,
}

impl Dof {
    pub const ALL: [Dof; 6] = [
        Dof::Surge,
        Dof::Sway,
        Dof::Heave,
        Dof::Roll,
        Dof::Pitch,
        Dof::Yaw,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_angular(self) -> bool {
        matches!(self, Dof::Roll | Dof::Pitch | Dof::Yaw)
    }

    pub fn name(self) -> &'static str {
        match self {
            Dof::Surge => "surge",
            Dof::Sway => "sway",
            Dof::Heave => "heave",
            Dof::Roll => "roll",
            Dof::Pitch => "pitch",
            Dof::Yaw => "yaw",
        }
    }
}

impl fmt::Display for Dof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// --- Core Trait for Transform Lookups ---
// Whatever owns the vehicle's transform tree implements this; the startup
// geometry acquisition only ever talks to it through this trait.
pub trait TfProvider {
    /// Gets the pose of `to_frame` expressed in `from_frame`.
    fn get_transform(&self, from_frame: &FrameId, to_frame: &FrameId) -> Option<Isometry3<f64>>;
}
