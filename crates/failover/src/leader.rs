//! Connection pinned to the roster leader.
//!
//! The leader is the first node of the roster. Its client URL is derived
//! once, at construction, through the context's [`corelib::ClientUrlMapping`]
//! and then goes through the usual security upgrade. There is no failover:
//! every send goes to the leader.

use std::time::Duration;

use connection::{ConnectionContext, MessageStream, SocketConnection};
use corelib::{BincodeCodec, Message, MessageCodec, NodeDescriptor, Roster};
use tracing::debug;

use crate::error::{Error, Result};

/// Connection to the first node of a roster.
pub struct LeaderConnection<C: MessageCodec = BincodeCodec> {
    leader: NodeDescriptor,
    inner: SocketConnection<C>,
}

impl<C: MessageCodec> LeaderConnection<C> {
    /// Connection to the leader of `roster`.
    ///
    /// Fails with [`Error::EmptyRoster`] when there is no node; the factory
    /// is never invoked in that case.
    pub fn new(
        roster: &Roster,
        service: impl Into<String>,
        context: ConnectionContext<C>,
    ) -> Result<Self> {
        let leader = roster.leader().ok_or(Error::EmptyRoster)?.clone();
        let url = context.config.client_urls.client_url(&leader)?;
        let inner = SocketConnection::new(&url, service, context)?;
        debug!(leader = %leader.address, url = inner.url(), "leader connection ready");
        Ok(Self { leader, inner })
    }

    pub fn leader(&self) -> &NodeDescriptor {
        &self.leader
    }

    /// Effective client URL of the leader.
    pub fn url(&self) -> &str {
        self.inner.url()
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout()
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.inner.set_timeout(timeout);
    }

    /// Sends `request` to the leader and waits for one `Resp`.
    pub async fn send<Req, Resp>(&mut self, request: &Req) -> Result<Resp>
    where
        Req: Message,
        Resp: Message,
    {
        Ok(self.inner.send::<Req, Resp>(request).await?)
    }

    /// Opens a message stream with the leader.
    pub fn send_stream<Req, Resp>(&mut self, request: &Req) -> MessageStream<Resp, C>
    where
        Req: Message,
        Resp: Message,
    {
        self.inner.send_stream::<Req, Resp>(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connection::{ConnectionConfig, Script, ScriptedFactory, SecurityContext};
    use corelib::{ClientUrlMapping, PublicKey, Registry};

    fn roster(addrs: &[&str]) -> Roster {
        addrs
            .iter()
            .map(|addr| NodeDescriptor::new(addr.parse().unwrap(), PublicKey::new(vec![1])))
            .collect()
    }

    fn context(config: ConnectionConfig) -> ConnectionContext {
        ConnectionContext::new(Registry::bincode(), ScriptedFactory::always(Script::silent()))
            .with_config(config)
    }

    #[test]
    fn test_leader_url_uses_port_offset() {
        let conn =
            LeaderConnection::new(&roster(&["tls://a:1234", "tls://b:1234"]), "", context(ConnectionConfig::default()))
                .unwrap();
        assert_eq!(conn.url(), "ws://a:1235");
        assert_eq!(conn.leader().address.host(), "a");
    }

    #[test]
    fn test_leader_url_custom_offset_and_security() {
        let config = ConnectionConfig::builder()
            .client_urls(ClientUrlMapping::with_port_offset(10))
            .security(SecurityContext::Secure)
            .build();
        let conn = LeaderConnection::new(&roster(&["tls://a:1234"]), "", context(config)).unwrap();
        assert_eq!(conn.url(), "wss://a:1244");
    }

    #[test]
    fn test_empty_roster() {
        let result = LeaderConnection::new(&Roster::default(), "", context(ConnectionConfig::default()));
        assert!(matches!(result, Err(Error::EmptyRoster)));
    }

    #[test]
    fn test_set_timeout() {
        let mut conn =
            LeaderConnection::new(&roster(&["tls://a:1234"]), "", context(ConnectionConfig::default())).unwrap();
        conn.set_timeout(Duration::from_millis(10));
        assert_eq!(conn.timeout(), Duration::from_millis(10));
    }
}
