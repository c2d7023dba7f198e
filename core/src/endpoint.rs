//! Host specifier parsing and address lookup.

use std::net::{SocketAddr, ToSocketAddrs};

use tracing::trace;

use crate::error::WireError;

pub const DEFAULT_PORT: u16 = 80;

/// A host/port pair identifying the server. Built once per client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Split `specifier` into host and port.
    ///
    /// The host is everything before the first `:`. The suffix after it is
    /// the port; if it does not parse, port 80 is used. `explicit_port`, when
    /// given, replaces whatever the specifier embedded.
    pub fn parse(specifier: &str, explicit_port: Option<u16>) -> Self {
        let (host, embedded) = match specifier.split_once(':') {
            Some((host, suffix)) => (host, suffix.parse::<u16>().ok()),
            None => (specifier, None),
        };
        Self {
            host: host.to_string(),
            port: explicit_port.or(embedded).unwrap_or(DEFAULT_PORT),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Value for the `Host` request header.
    pub fn host_header(&self) -> String {
        if self.port == DEFAULT_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Look up every candidate address, in resolver order.
    pub fn resolve(&self) -> Result<Vec<SocketAddr>, WireError> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| WireError::Resolution {
                host: self.host.clone(),
                reason: e.to_string(),
            })?
            .collect();
        if addrs.is_empty() {
            return Err(WireError::Resolution {
                host: self.host.clone(),
                reason: "no addresses returned".to_string(),
            });
        }
        trace!(host = %self.host, count = addrs.len(), "resolved endpoint");
        Ok(addrs)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
