//! Connection status reporting.
//!
//! The session thread is the only writer. Readers pull a [`StatusSnapshot`]
//! at their own cadence; every write swaps in a whole new snapshot, so a
//! reader never sees a state from one update paired with a latency from
//! another.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::trace::info;

/// Lifecycle state of a [`PoseClient`](crate::PoseClient) connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Connect or transport failure, with a human-readable reason.
    Error(String),
}

impl ConnectionState {
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
            Self::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

/// Point-in-time view of the connection for display layers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusSnapshot {
    pub state: ConnectionState,
    /// Receive time minus sender timestamp of the last pose, in milliseconds.
    ///
    /// `None` until a pose arrives on the current connection. May be negative
    /// when the sender's clock runs ahead of ours.
    pub latency_ms: Option<f64>,
}

/// Single-writer holder of the current [`StatusSnapshot`].
#[derive(Debug, Default)]
pub struct StatusReporter {
    current: ArcSwap<StatusSnapshot>,
}

impl StatusReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::clone(&self.current.load())
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.current.load().state.clone()
    }

    #[must_use]
    pub fn latency_ms(&self) -> Option<f64> {
        self.current.load().latency_ms
    }

    /// Publishes a state transition.
    ///
    /// Latency belongs to a live connection, so it is cleared whenever the
    /// new state is not [`ConnectionState::Connected`].
    pub(crate) fn set_state(&self, state: ConnectionState) {
        let previous = self.current.load();
        if previous.state == state {
            return;
        }
        info!(from = %previous.state, to = %state, "connection state changed");

        let latency_ms = if state.is_connected() {
            previous.latency_ms
        } else {
            None
        };
        self.current.store(Arc::new(StatusSnapshot { state, latency_ms }));
    }

    pub(crate) fn set_latency(&self, latency_ms: f64) {
        let previous = self.current.load();
        self.current.store(Arc::new(StatusSnapshot {
            state: previous.state.clone(),
            latency_ms: Some(latency_ms),
        }));
    }
}
