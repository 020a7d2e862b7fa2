//! Blocking WebSocket transport built on `tungstenite`.

use std::borrow::Cow;
use std::io::{self, ErrorKind};
use std::net::TcpStream;
use std::time::Duration;

use minstant::Instant;
use tungstenite::protocol::CloseFrame;
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::{Message, WebSocket};

use super::{Endpoint, Frame, FrameSource, Transport, TransportError};
use crate::trace::{debug, trace};

/// Sockets reject a zero read timeout, so shorter waits are rounded up.
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Connects with `TcpStream::connect_timeout` and a client handshake.
///
/// The connect timeout is one budget shared by every resolved address and
/// the handshake, so a connect never blocks much longer than `timeout`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsTransport;

impl Transport for WsTransport {
    type Connection = WsConnection;

    fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<WsConnection, TransportError> {
        let connect_error = |reason: String| TransportError::Connect {
            endpoint: endpoint.to_string(),
            reason,
        };

        let deadline = Instant::now() + timeout;
        let remaining = || {
            deadline
                .checked_duration_since(Instant::now())
                .filter(|d| !d.is_zero())
        };

        let addrs = endpoint.resolve().map_err(|e| connect_error(e.to_string()))?;
        let mut last_error = None;
        let mut stream = None;
        for addr in addrs {
            let Some(budget) = remaining() else {
                debug!(%addr, "connect budget exhausted");
                break;
            };
            match TcpStream::connect_timeout(&addr, budget) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    debug!(%addr, error = %e, "tcp connect failed");
                    last_error = Some(e);
                }
            }
        }
        let stream = stream.ok_or_else(|| {
            connect_error(last_error.map_or_else(|| "no address reachable in time".into(), |e| e.to_string()))
        })?;

        let handshake_budget = remaining().unwrap_or(MIN_READ_TIMEOUT);
        let configure = |s: &TcpStream| -> io::Result<()> {
            s.set_nodelay(true)?;
            s.set_read_timeout(Some(handshake_budget))?;
            s.set_write_timeout(Some(handshake_budget))
        };
        configure(&stream).map_err(|e| connect_error(e.to_string()))?;

        let (socket, _response) = tungstenite::client(endpoint.url().as_str(), stream).map_err(|e| {
            TransportError::Handshake {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        })?;
        debug!(%endpoint, "websocket handshake complete");

        Ok(WsConnection { socket })
    }
}

/// An open client WebSocket.
pub struct WsConnection {
    socket: WebSocket<TcpStream>,
}

impl WsConnection {
    /// Wraps an already-upgraded socket.
    #[must_use]
    pub const fn from_socket(socket: WebSocket<TcpStream>) -> Self {
        Self { socket }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

impl FrameSource for WsConnection {
    fn recv(&mut self, timeout: Duration) -> Result<Option<Frame>, TransportError> {
        self.socket
            .get_ref()
            .set_read_timeout(Some(timeout.max(MIN_READ_TIMEOUT)))?;

        match self.socket.read() {
            Ok(Message::Text(text)) => Ok(Some(Frame::Text(text))),
            Ok(Message::Close(_frame)) => {
                trace!(frame = ?_frame, "close frame received");
                // Sends the queued close reply.
                let _ = self.socket.flush();
                Ok(Some(Frame::Close))
            }
            Ok(_) => Ok(Some(Frame::Other)),
            Err(tungstenite::Error::Io(e)) if is_timeout(&e) => Ok(None),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(Some(Frame::Close))
            }
            Err(tungstenite::Error::Io(e)) => Err(TransportError::Io(e)),
            Err(e) => Err(TransportError::Protocol(e.to_string())),
        }
    }

    fn close(&mut self) {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: Cow::Borrowed(""),
        };
        if let Err(e) = self.socket.close(Some(frame)) {
            debug!(error = %e, "close frame not sent");
        }
        let _ = self.socket.flush();
    }
}
