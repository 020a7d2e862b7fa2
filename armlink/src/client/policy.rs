//! Reconnect decisions.
//!
//! Every way a connection can end is classified into a [`FailureKind`], and
//! [`decide`] is the single place that turns a kind into "retry" or "halt".
//! Decode errors never end a connection and never reach this module.

use std::time::Duration;

use crate::status::ConnectionState;

/// Why a connection attempt or an open connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The socket could not be opened (bad address, refused, DNS, handshake).
    Connect,
    /// Read/write failure on an open connection.
    Transport,
    /// The peer closed the connection.
    Closed,
    /// No data within the stale threshold on an open connection.
    Stale,
    /// The caller asked the client to stop.
    Shutdown,
}

/// A finished connection together with its human-readable cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub reason: String,
}

impl Failure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    /// State to publish once this failure has torn the connection down.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        match self.kind {
            FailureKind::Connect | FailureKind::Transport => {
                ConnectionState::Error(self.reason.clone())
            }
            FailureKind::Closed | FailureKind::Stale | FailureKind::Shutdown => {
                ConnectionState::Disconnected
            }
        }
    }
}

/// What the session does after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Wait, then connect again.
    RetryAfter(Duration),
    /// Leave the session loop.
    Halt,
}

/// Retry policy: every failure except a requested shutdown is retried after
/// a fixed `delay` when `auto_reconnect` is set.
#[must_use]
pub const fn decide(kind: FailureKind, auto_reconnect: bool, delay: Duration) -> ReconnectDecision {
    match kind {
        FailureKind::Shutdown => ReconnectDecision::Halt,
        FailureKind::Connect | FailureKind::Transport | FailureKind::Closed | FailureKind::Stale => {
            if auto_reconnect {
                ReconnectDecision::RetryAfter(delay)
            } else {
                ReconnectDecision::Halt
            }
        }
    }
}
