//! Bind-time endpoint metadata.

use std::fmt;
use std::net::SocketAddr;

use axum::http::Version;

/// The `{interface, port}` pair a listener was bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    interface: String,
    port: u16,
}

impl Endpoint {
    pub fn new(interface: impl Into<String>, port: u16) -> Self {
        Self {
            interface: interface.into(),
            port,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.interface, self.port)
    }
}

/// HTTP protocol family a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http1,
    Http2,
}

impl Protocol {
    pub fn from_version(version: Version) -> Self {
        if version == Version::HTTP_2 {
            Protocol::Http2
        } else {
            Protocol::Http1
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http1 => "HTTP/1",
            Protocol::Http2 => "HTTP/2",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_from_socket_addr() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let endpoint = Endpoint::from(addr);
        assert_eq!(endpoint.interface(), "127.0.0.1");
        assert_eq!(endpoint.port(), 8080);
        assert_eq!(endpoint.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn protocol_from_version() {
        assert_eq!(Protocol::from_version(Version::HTTP_11), Protocol::Http1);
        assert_eq!(Protocol::from_version(Version::HTTP_10), Protocol::Http1);
        assert_eq!(Protocol::from_version(Version::HTTP_2), Protocol::Http2);
    }
}
