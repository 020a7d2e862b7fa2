//! Network transport for the pose stream.
//!
//! The session loop only sees the [`Transport`] and [`FrameSource`] traits.
//! [`WsTransport`] is the production implementation: a blocking `tungstenite`
//! WebSocket over a `std::net::TcpStream`, read with bounded timeouts so the
//! caller can run its watchdog and observe shutdown between frames.

pub mod endpoint;
pub mod transport;
pub mod websocket;

pub use endpoint::{Endpoint, EndpointError};
pub use transport::{Frame, FrameSource, Transport, TransportError};
pub use websocket::{WsConnection, WsTransport};
