//! Client-facing URLs of nodes.
//!
//! Nodes listen for clients on a socket endpoint that is not the address
//! they advertise to each other. Unless a node publishes an explicit URL, the
//! client endpoint is found through a deployment convention: same host, port
//! shifted by a fixed offset. The offset is configuration, not a constant
//! baked into the connection code.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::address::bracketed;
use crate::error::{Error, Result};
use crate::node::NodeDescriptor;

/// Port offset used by conode deployments (websocket = server port + 1).
pub const DEFAULT_PORT_OFFSET: i32 = 1;

/// Maps server-facing addresses to client-facing socket URLs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUrlMapping {
    /// Added to the server port to get the client port.
    pub port_offset: i32,
}

impl Default for ClientUrlMapping {
    fn default() -> Self {
        Self {
            port_offset: DEFAULT_PORT_OFFSET,
        }
    }
}

impl ClientUrlMapping {
    pub fn with_port_offset(port_offset: i32) -> Self {
        Self { port_offset }
    }

    /// Client URL of `node`.
    ///
    /// An explicit node URL wins over the port convention; `http`/`https`
    /// are rewritten to `ws`/`wss`.
    ///
    /// ```rust
    /// use corelib::endpoint::ClientUrlMapping;
    /// use corelib::node::{NodeDescriptor, PublicKey};
    ///
    /// let node = NodeDescriptor::new("tls://a:1234".parse().unwrap(), PublicKey::new(vec![1]));
    /// assert_eq!(ClientUrlMapping::default().client_url(&node).unwrap(), "ws://a:1235");
    /// ```
    pub fn client_url(&self, node: &NodeDescriptor) -> Result<String> {
        if let Some(explicit) = &node.url {
            return socket_url(explicit);
        }

        let port = node.address.port();
        let shifted = i64::from(port) + i64::from(self.port_offset);
        let client_port = u16::try_from(shifted).map_err(|_| Error::PortOutOfRange {
            port,
            offset: self.port_offset,
        })?;
        Ok(format!(
            "ws://{}:{}",
            bracketed(node.address.host()),
            client_port
        ))
    }
}

/// Normalises an explicit URL to a socket URL without trailing slashes.
pub fn socket_url(raw: &str) -> Result<String> {
    let mut url = Url::parse(raw).map_err(|e| Error::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme `{}`", other),
            })
        }
    };
    if url.scheme() != scheme {
        url.set_scheme(scheme).map_err(|_| Error::InvalidUrl {
            url: raw.to_string(),
            reason: format!("cannot switch scheme to `{}`", scheme),
        })?;
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PublicKey;

    fn node(addr: &str) -> NodeDescriptor {
        NodeDescriptor::new(addr.parse().unwrap(), PublicKey::new(vec![1]))
    }

    #[test]
    fn test_default_offset() {
        let mapping = ClientUrlMapping::default();
        assert_eq!(mapping.client_url(&node("tls://a:1234")).unwrap(), "ws://a:1235");
        assert_eq!(
            mapping.client_url(&node("tcp://10.0.0.4:2000")).unwrap(),
            "ws://10.0.0.4:2001"
        );
    }

    #[test]
    fn test_custom_offset() {
        let mapping = ClientUrlMapping::with_port_offset(-1000);
        assert_eq!(mapping.client_url(&node("tls://a:7770")).unwrap(), "ws://a:6770");
    }

    #[test]
    fn test_offset_out_of_range() {
        let mapping = ClientUrlMapping::default();
        let err = mapping.client_url(&node("tls://a:65535")).unwrap_err();
        assert!(matches!(err, Error::PortOutOfRange { port: 65535, offset: 1 }));
    }

    #[test]
    fn test_ipv6_host() {
        let mapping = ClientUrlMapping::default();
        assert_eq!(mapping.client_url(&node("tls://[::1]:7770")).unwrap(), "ws://[::1]:7771");
    }

    #[test]
    fn test_explicit_url_wins() {
        let mapping = ClientUrlMapping::default();
        let n = node("tls://a:1234").with_url("https://ismail.example.com/conode/");
        assert_eq!(
            mapping.client_url(&n).unwrap(),
            "wss://ismail.example.com/conode"
        );
        let n = node("tls://a:1234").with_url("http://b:8080");
        assert_eq!(mapping.client_url(&n).unwrap(), "ws://b:8080");
    }

    #[test]
    fn test_explicit_url_bad_scheme() {
        assert!(socket_url("ftp://a:21").is_err());
        assert!(socket_url("not a url").is_err());
    }
}
