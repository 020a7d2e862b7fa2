//! WebSocket endpoint addresses.
//!
//! Parsed from `ws://host[:port][/path]`. Host names are resolved lazily on
//! every connect attempt, so a producer that changes address behind a DNS
//! name is picked up on reconnect.

use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use thiserror::Error;

/// Port used when the address omits one.
pub const DEFAULT_WS_PORT: u16 = 80;

/// Error parsing an endpoint address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("missing scheme in `{0}` (expected ws://host:port)")]
    MissingScheme(String),
    #[error("unsupported scheme `{0}` (only ws is supported)")]
    UnsupportedScheme(String),
    #[error("missing host in `{0}`")]
    MissingHost(String),
    #[error("invalid port `{0}`")]
    InvalidPort(String),
}

/// A WebSocket server address (host + port + request path).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
    path: String,
}

impl Endpoint {
    /// Creates an endpoint with the root path.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            path: "/".into(),
        }
    }

    /// Creates a loopback endpoint on the given port.
    #[must_use]
    pub fn localhost(port: u16) -> Self {
        Self::new("127.0.0.1", port)
    }

    /// Replaces the request path. A missing leading `/` is added.
    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = if path.starts_with('/') {
            path.to_owned()
        } else {
            format!("/{path}")
        };
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full `ws://` URL for the handshake request.
    #[must_use]
    pub fn url(&self) -> String {
        self.to_string()
    }

    /// Resolves the host to socket addresses.
    ///
    /// # Errors
    ///
    /// Returns the resolver error (e.g. unknown host).
    pub fn resolve(&self) -> io::Result<Vec<SocketAddr>> {
        Ok((self.host.as_str(), self.port).to_socket_addrs()?.collect())
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "ws://[{}]:{}{}", self.host, self.port, self.path)
        } else {
            write!(f, "ws://{}:{}{}", self.host, self.port, self.path)
        }
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| EndpointError::MissingScheme(s.to_owned()))?;
        if !scheme.eq_ignore_ascii_case("ws") {
            return Err(EndpointError::UnsupportedScheme(scheme.to_owned()));
        }

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };

        let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| EndpointError::MissingHost(s.to_owned()))?;
            let port = match after {
                "" => None,
                p => Some(
                    p.strip_prefix(':')
                        .ok_or_else(|| EndpointError::InvalidPort(p.to_owned()))?,
                ),
            };
            (host, port)
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };

        if host.is_empty() {
            return Err(EndpointError::MissingHost(s.to_owned()));
        }

        let port = match port {
            None => DEFAULT_WS_PORT,
            Some(p) => match p.parse::<u16>() {
                Ok(0) | Err(_) => return Err(EndpointError::InvalidPort(p.to_owned())),
                Ok(port) => port,
            },
        };

        Ok(Self::new(host, port).with_path(path))
    }
}
