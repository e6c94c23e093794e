//! Server-facing node addresses.
//!
//! A node advertises itself as `conn_type://host:port`, where the connection
//! type tells peers how to talk to it on the server side. Clients never use
//! this address directly; see [`crate::endpoint`] for the mapping to the
//! client-facing socket URL.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Connection type advertised by a node.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnType {
    /// Plain TCP (`tcp://`).
    #[serde(rename = "tcp")]
    PlainTcp,
    /// TLS over TCP (`tls://`).
    Tls,
    /// PURB-encoded transport (`purb://`).
    Purb,
}

impl ConnType {
    /// Scheme prefix used in addresses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnType::PlainTcp => "tcp",
            ConnType::Tls => "tls",
            ConnType::Purb => "purb",
        }
    }
}

impl FromStr for ConnType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(ConnType::PlainTcp),
            "tls" => Ok(ConnType::Tls),
            "purb" => Ok(ConnType::Purb),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ConnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated `conn_type://host:port` address.
///
/// # Invariants
///
/// - `host` is an IPv4 literal, an IPv6 literal (stored without brackets) or a
///   DNS name
/// - a dotted-numeric host must be a valid IPv4 address, so `1000.0.0.4` is
///   rejected instead of being treated as a name
/// - the port is always present
///
/// # Example
///
/// ```rust
/// use corelib::address::{ConnType, NodeAddress};
///
/// let addr: NodeAddress = "tls://10.0.0.4:2000".parse().unwrap();
/// assert_eq!(addr.conn_type(), ConnType::Tls);
/// assert_eq!(addr.network_address(), "10.0.0.4:2000");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeAddress {
    conn_type: ConnType,
    host: String,
    port: u16,
}

impl NodeAddress {
    /// Builds an address from already validated parts.
    pub fn new(conn_type: ConnType, host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();
        let shown = format!("{}://{}:{}", conn_type, host, port);
        validate_host(&host).map_err(|reason| invalid(&shown, reason))?;
        Ok(Self {
            conn_type,
            host,
            port,
        })
    }

    /// Parses `conn_type://host:port`.
    pub fn parse(input: &str) -> Result<Self> {
        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| invalid(input, "missing `://` separator"))?;
        let conn_type = scheme
            .parse::<ConnType>()
            .map_err(|_| invalid(input, "unknown connection type"))?;

        let (host, port) = split_host_port(rest).ok_or_else(|| invalid(input, "missing port"))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| invalid(input, "port is not in 0..=65535"))?;
        validate_host(host).map_err(|reason| invalid(input, reason))?;

        Ok(Self {
            conn_type,
            host: host.to_string(),
            port,
        })
    }

    pub fn conn_type(&self) -> ConnType {
        self.conn_type
    }

    /// Host without IPv6 brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, bracketing IPv6 hosts.
    pub fn network_address(&self) -> String {
        format!("{}:{}", bracketed(&self.host), self.port)
    }
}

impl FromStr for NodeAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NodeAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<NodeAddress> for String {
    fn from(addr: NodeAddress) -> Self {
        addr.to_string()
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.conn_type, self.network_address())
    }
}

/// Wraps IPv6 literals in brackets so they can be followed by `:port`.
pub(crate) fn bracketed(host: &str) -> String {
    if host.contains(':') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

fn invalid(address: &str, reason: &'static str) -> Error {
    Error::InvalidAddress {
        address: address.to_string(),
        reason,
    }
}

fn split_host_port(rest: &str) -> Option<(&str, &str)> {
    if let Some(inner) = rest.strip_prefix('[') {
        let (host, tail) = inner.split_once(']')?;
        let port = tail.strip_prefix(':')?;
        return Some((host, port));
    }
    let (host, port) = rest.rsplit_once(':')?;
    if host.contains(':') {
        // unbracketed IPv6
        return None;
    }
    Some((host, port))
}

fn validate_host(host: &str) -> std::result::Result<(), &'static str> {
    if host.is_empty() {
        return Err("empty host");
    }
    if host.contains(':') {
        return host
            .parse::<Ipv6Addr>()
            .map(|_| ())
            .map_err(|_| "invalid IPv6 host");
    }
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return host
            .parse::<Ipv4Addr>()
            .map(|_| ())
            .map_err(|_| "invalid IPv4 host");
    }
    let labels_ok = host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if labels_ok {
        Ok(())
    } else {
        Err("invalid host name")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conn_type_from_str() {
        let cases = [
            ("tcp", Some(ConnType::PlainTcp)),
            ("tls", Some(ConnType::Tls)),
            ("purb", Some(ConnType::Purb)),
            ("tcp4", None),
            ("_tls", None),
        ];
        for (input, expected) in cases {
            assert_eq!(input.parse::<ConnType>().ok(), expected, "conn type {}", input);
        }
    }

    #[test]
    fn test_valid_addresses() {
        let cases = [
            ("tls://10.0.0.4:2000", ConnType::Tls, "10.0.0.4", 2000),
            ("tcp://10.0.0.4:2000", ConnType::PlainTcp, "10.0.0.4", 2000),
            ("purb://10.0.0.4:2000", ConnType::Purb, "10.0.0.4", 2000),
            ("tls://conode.example.com:7770", ConnType::Tls, "conode.example.com", 7770),
            ("tls://[::1]:7770", ConnType::Tls, "::1", 7770),
        ];
        for (input, conn_type, host, port) in cases {
            let addr = NodeAddress::parse(input).unwrap();
            assert_eq!(addr.conn_type(), conn_type);
            assert_eq!(addr.host(), host);
            assert_eq!(addr.port(), port);
            assert_eq!(addr.to_string(), input);
        }
    }

    #[test]
    fn test_invalid_addresses() {
        let cases = [
            "tls4://10.0.0.4:2000",
            "tls://1000.0.0.4:2000",
            "tls://10.0.0.4:20000000",
            "tls://10.0.0.4:-10",
            "tlsx10.0.0.4:2000",
            "tls:10.0.0.4x2000",
            "tlsx10.0.0.4x2000",
            "tlxblurdie",
            "tls://blublublu",
            "tls://::1:2000",
        ];
        for input in cases {
            assert!(NodeAddress::parse(input).is_err(), "{} should be rejected", input);
        }
    }

    #[test]
    fn test_network_address_brackets_ipv6() {
        let addr = NodeAddress::new(ConnType::Tls, "fe80::1", 443).unwrap();
        assert_eq!(addr.network_address(), "[fe80::1]:443");
    }

    #[test]
    fn test_serde_as_string() {
        let addr = NodeAddress::parse("tls://a:1234").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"tls://a:1234\"");
        let back: NodeAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(serde_json::from_str::<NodeAddress>("\"udp://a:1\"").is_err());
    }
}
