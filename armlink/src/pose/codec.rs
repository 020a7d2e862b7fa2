//! JSON wire codec for producer frames.
//!
//! # Wire format
//!
//! Every WebSocket text frame carries one UTF-8 JSON object. Pose frames:
//!
//! ```text
//! { "timestamp": <f64 seconds since epoch, sender clock>,
//!   "left_arm":  { "shoulder": {"x":f,"y":f,"z":f,"visibility":f}, "wrist": {...} } | null,
//!   "right_arm": { ... } | null }
//! ```
//!
//! The producer also sends a one-off `{"status": "connected"}` greeting right
//! after the handshake. It decodes to [`WireMessage::Status`].
//!
//! Decoding is pure. Latency is derived by the caller from
//! [`PoseMessage::timestamp`] and its own receive time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{Limb, PoseMessage};

/// Non-pose control frame sent by the producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
}

/// Any frame the producer may send.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    Pose(PoseMessage),
    Status(ServerStatus),
}

/// Error decoding a frame payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Invalid JSON, wrong field types, missing timestamp or non-finite numbers.
    #[error("malformed frame: {0}")]
    Malformed(String),
    /// A well-formed frame that is not a pose sample.
    #[error("frame is not a pose sample")]
    NotPose,
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

/// Decodes one text frame.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] if the payload is not a pose or status
/// object. Absent or `null` limbs are not errors.
pub fn decode(raw: &str) -> Result<WireMessage, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;

    let (is_pose, is_status) = match &value {
        Value::Object(fields) => (
            fields.contains_key("timestamp"),
            fields.get("status").is_some_and(Value::is_string),
        ),
        _ => return Err(DecodeError::Malformed("expected a JSON object".into())),
    };

    if is_pose {
        let msg: PoseMessage = serde_json::from_value(value)?;
        validate(&msg)?;
        Ok(WireMessage::Pose(msg))
    } else if is_status {
        Ok(WireMessage::Status(serde_json::from_value(value)?))
    } else {
        Err(DecodeError::Malformed("missing field `timestamp`".into()))
    }
}

/// Decodes one text frame that must be a pose sample.
///
/// # Errors
///
/// As [`decode`], plus [`DecodeError::NotPose`] for status frames.
pub fn decode_pose(raw: &str) -> Result<PoseMessage, DecodeError> {
    match decode(raw)? {
        WireMessage::Pose(msg) => Ok(msg),
        WireMessage::Status(_) => Err(DecodeError::NotPose),
    }
}

/// Encodes a pose sample into its wire form. Absent limbs become `null`.
///
/// # Errors
///
/// Propagates serializer failures; none are expected for finite samples.
pub fn encode(msg: &PoseMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

// Large JSON numbers saturate to infinity when narrowed to f32.
fn validate(msg: &PoseMessage) -> Result<(), DecodeError> {
    if !msg.timestamp.is_finite() {
        return Err(DecodeError::Malformed("timestamp is not finite".into()));
    }
    for limb in Limb::ALL {
        if let Some(pose) = msg.limb(limb) {
            if !pose.shoulder.is_finite() || !pose.wrist.is_finite() {
                return Err(DecodeError::Malformed(format!(
                    "{limb} arm has non-finite coordinates"
                )));
            }
        }
    }
    Ok(())
}
