// nereus_node/src/runtime/transforms.rs

use crate::config::NodeConfig;
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use nereus_core::prelude::{FrameId, TfProvider};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

// =========================================================================
// == Static TF Tree ==
// =========================================================================

/// A transform tree of rigidly mounted frames, each stored as its pose in the
/// body frame. Frames can be added after construction, which is how a
/// publisher that comes up late looks to the acquisition phase.
#[derive(Debug, Default)]
pub struct StaticTfTree {
    transforms_to_body: RwLock<HashMap<FrameId, Isometry3<f64>>>,
}

impl StaticTfTree {
    pub fn new() -> Self {
        let tree = Self::default();
        tree.insert(FrameId::Body, Isometry3::identity());
        tree
    }

    /// Publishes every thruster pose and the IMU mount from the configuration.
    pub fn from_config(config: &NodeConfig) -> Self {
        let tree = Self::new();
        for thruster in &config.thrusters {
            tree.insert(FrameId::Thruster(thruster.name.clone()), thruster.pose());
        }
        tree.insert(
            FrameId::Sensor(config.imu.name.clone()),
            Isometry3::from_parts(Translation3::from(config.imu.offset), UnitQuaternion::identity()),
        );
        tree
    }

    pub fn insert(&self, frame: FrameId, pose_in_body: Isometry3<f64>) {
        self.transforms_to_body
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(frame, pose_in_body);
    }

    pub fn remove(&self, frame: &FrameId) -> Option<Isometry3<f64>> {
        self.transforms_to_body
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(frame)
    }

    pub fn len(&self) -> usize {
        self.transforms_to_body
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TfProvider for StaticTfTree {
    fn get_transform(&self, from_frame: &FrameId, to_frame: &FrameId) -> Option<Isometry3<f64>> {
        let transforms = self
            .transforms_to_body
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let pose_from_body = transforms.get(from_frame)?;
        let pose_to_body = transforms.get(to_frame)?;

        // T_from_to = (T_body_from)^-1 * T_body_to
        Some(pose_from_body.inverse() * pose_to_body)
    }
}
