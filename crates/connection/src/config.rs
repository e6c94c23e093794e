//! Connection configuration and the dependencies shared by connections.

use std::sync::Arc;
use std::time::Duration;

use corelib::{BincodeCodec, ClientUrlMapping, MessageCodec, Registry};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::adapter::AdapterFactory;
use crate::error::ConnectionError;

/// Default time to wait for a reply.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether the embedding process was itself reached over a secure channel.
///
/// In a secure context, plain `ws` URLs are upgraded to `wss` so the client
/// never downgrades the channel it was loaded from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityContext {
    #[default]
    Insecure,
    Secure,
}

impl SecurityContext {
    pub fn is_secure(&self) -> bool {
        matches!(self, SecurityContext::Secure)
    }
}

/// Configuration for connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Reply timeout, in milliseconds on the wire.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    pub security: SecurityContext,
    pub client_urls: ClientUrlMapping,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            security: SecurityContext::Insecure,
            client_urls: ClientUrlMapping::default(),
        }
    }
}

impl ConnectionConfig {
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Effective URL for `raw`: parsed, trailing slash removed, and `ws`
    /// upgraded to `wss` in a secure context. Other schemes are left alone.
    pub fn effective_url(&self, raw: &str) -> Result<String, ConnectionError> {
        let mut url = Url::parse(raw).map_err(|e| ConnectionError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if self.security.is_secure() && url.scheme() == "ws" {
            // keep the port the ws default implied, it is not 443
            let port = url.port_or_known_default();
            url.set_scheme("wss")
                .and_then(|_| url.set_port(port))
                .map_err(|_| ConnectionError::InvalidUrl {
                    url: raw.to_string(),
                    reason: "cannot upgrade to wss".to_string(),
                })?;
        }
        Ok(url.as_str().trim_end_matches('/').to_string())
    }
}

/// Builder for [`ConnectionConfig`].
#[derive(Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn security(mut self, security: SecurityContext) -> Self {
        self.config.security = security;
        self
    }

    pub fn client_urls(mut self, mapping: ClientUrlMapping) -> Self {
        self.config.client_urls = mapping;
        self
    }

    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}

/// Everything a connection needs besides its target: the message registry,
/// the transport factory and the configuration.
///
/// Cheap to clone; failover layers hand a clone to every attempt.
pub struct ConnectionContext<C: MessageCodec = BincodeCodec> {
    pub registry: Arc<Registry<C>>,
    pub factory: Arc<dyn AdapterFactory>,
    pub config: ConnectionConfig,
}

impl<C: MessageCodec> ConnectionContext<C> {
    pub fn new(registry: Registry<C>, factory: impl AdapterFactory + 'static) -> Self {
        Self {
            registry: Arc::new(registry),
            factory: Arc::new(factory),
            config: ConnectionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }
}

impl<C: MessageCodec> Clone for ConnectionContext<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            factory: Arc::clone(&self.factory),
            config: self.config.clone(),
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
