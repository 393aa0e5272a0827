// nereus_core/src/frames.rs

use std::fmt;

/// A unique, hashable identifier for any coordinate frame on the vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameId {
    /// The body frame. Origin at the center of mass, x forward, y port, z up.
    Body,
    /// The mounting frame of a thruster, identified by thruster name.
    /// The thruster pushes along this frame's +x axis.
    Thruster(String),
    /// The mounting frame of a sensor, identified by sensor name.
    Sensor(String),
}

impl FrameId {
    /// The conventional link name of the frame in a transform tree,
    /// e.g. `base_link` or `surge_port_hi_link`.
    pub fn link_name(&self) -> String {
        match self {
            FrameId::Body => "base_link".to_string(),
            FrameId::Thruster(name) | FrameId::Sensor(name) => format!("{name}_link"),
        }
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.link_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_names_follow_the_transform_tree_convention() {
        assert_eq!(FrameId::Body.link_name(), "base_link");
        assert_eq!(
            FrameId::Thruster("sway_fwd".into()).to_string(),
            "/sway_fwd_link"
        );
        assert_eq!(FrameId::Sensor("imu_one".into()).link_name(), "imu_one_link");
    }
}
