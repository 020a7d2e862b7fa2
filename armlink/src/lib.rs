//! Resilient streaming client for live arm-pose data.
//!
//! A pose producer (camera + landmark estimator) publishes shoulder and wrist
//! positions for both arms over a WebSocket. [`PoseClient`] keeps a single
//! background session connected to it, decodes every frame, converts each
//! limb into a unit direction and publishes the result as a snapshot that a
//! render loop can read at its own cadence.
//!
//! ```text
//!  producer ──ws──> session thread ──decode──> transform ──> LimbTargets (ArcSwap)
//!                         │                                      │
//!                         └──> StatusSnapshot (ArcSwap)          └──> consumer: step() / limb_direction()
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use armlink::{ClientConfig, Limb, PoseClient};
//!
//! let config = ClientConfig::new("ws://127.0.0.1:8765".parse()?);
//! let client = PoseClient::new(config)?;
//! client.start()?;
//!
//! // once per render tick
//! let dir = client.step(Limb::Left, Duration::from_millis(16));
//! println!("{} {:?} {:?}", client.connection_state(), client.latency_ms(), dir);
//!
//! client.stop();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod net;
pub mod pose;
pub mod smoother;
pub mod status;
pub mod transform;

mod trace;

pub use client::{ClientConfig, ClientError, ClientStats, PoseClient};
pub use pose::{Limb, LimbPose, Point3, PoseMessage};
pub use status::{ConnectionState, StatusSnapshot};
pub use trace::init_tracing;
pub use transform::{AxisPolicy, UnitVector3};
