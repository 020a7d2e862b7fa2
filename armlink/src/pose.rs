//! Pose data model shared by the codec, the transformer and the client.

pub mod codec;

pub use codec::{DecodeError, ServerStatus, WireMessage, decode, decode_pose, encode};

use serde::{Deserialize, Serialize};
use std::fmt;

/// One tracked arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limb {
    Left,
    Right,
}

impl Limb {
    /// Both limbs, left first.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    /// Stable index for per-limb arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

impl fmt::Display for Limb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// A 3D landmark in the producer's world space.
///
/// `visibility` is the estimator's confidence. It is not used by the
/// transform but is carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Point3 {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    #[must_use]
    pub const fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
            && self.visibility.is_none_or(f32::is_finite)
    }
}

/// Shoulder and wrist of one arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimbPose {
    pub shoulder: Point3,
    pub wrist: Point3,
}

impl LimbPose {
    #[must_use]
    pub const fn new(shoulder: Point3, wrist: Point3) -> Self {
        Self { shoulder, wrist }
    }
}

/// One pose sample as sent by the producer.
///
/// A limb is `None` when the producer is not currently tracking it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseMessage {
    /// Seconds since the Unix epoch on the sender's clock.
    pub timestamp: f64,
    #[serde(default)]
    pub left_arm: Option<LimbPose>,
    #[serde(default)]
    pub right_arm: Option<LimbPose>,
}

impl PoseMessage {
    #[must_use]
    pub const fn new(timestamp: f64) -> Self {
        Self {
            timestamp,
            left_arm: None,
            right_arm: None,
        }
    }

    #[must_use]
    pub fn with_limb(mut self, limb: Limb, pose: LimbPose) -> Self {
        match limb {
            Limb::Left => self.left_arm = Some(pose),
            Limb::Right => self.right_arm = Some(pose),
        }
        self
    }

    #[must_use]
    pub fn limb(&self, limb: Limb) -> Option<&LimbPose> {
        match limb {
            Limb::Left => self.left_arm.as_ref(),
            Limb::Right => self.right_arm.as_ref(),
        }
    }
}
