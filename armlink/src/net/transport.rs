//! Transport abstraction used by the session loop.

use std::io;
use std::time::Duration;

use thiserror::Error;

use super::Endpoint;

/// Transport-level failure.
///
/// The session maps the first two variants to a connect failure and the rest
/// to a mid-stream failure; both surface as `ConnectionState::Error`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint could not be reached (DNS, refused, timeout).
    #[error("cannot connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },
    /// TCP connected but the WebSocket upgrade failed.
    #[error("websocket handshake with {endpoint} failed: {reason}")]
    Handshake { endpoint: String, reason: String },
    /// Read or write failure on an open connection.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The peer violated the WebSocket protocol.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// One inbound message, reduced to what the session cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// The peer closed the connection (close frame or clean EOF).
    Close,
    /// Binary, ping/pong or other frames with no pose payload.
    Other,
}

/// An open, message-oriented connection.
pub trait FrameSource: Send {
    /// Waits at most `timeout` for the next frame.
    ///
    /// Returns `Ok(None)` when the timeout elapses without a frame.
    ///
    /// # Errors
    ///
    /// Any error means the connection is unusable.
    fn recv(&mut self, timeout: Duration) -> Result<Option<Frame>, TransportError>;

    /// Best-effort normal closure. Never blocks longer than the write timeout.
    fn close(&mut self);
}

/// Opens connections to an [`Endpoint`].
pub trait Transport: Send + Sync + 'static {
    type Connection: FrameSource + 'static;

    /// Connects and completes any protocol handshake within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] or [`TransportError::Handshake`].
    fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<Self::Connection, TransportError>;
}
