//! Failover connection over a roster.
//!
//! # Algorithm
//!
//! 1. Order the roster's nodes with the configured [`CandidateOrder`]
//! 2. Derive each candidate's client URL and send on a fresh connection
//! 3. Return the first reply; on a node-specific failure move to the next
//! 4. Once every candidate failed, report `Exhausted` with the last error
//!
//! Attempts never overlap: each attempt's adapter is closed before the next
//! one is created. Failures that would repeat on every node (unregistered
//! types, encoding) end the send at once.

use std::sync::Arc;
use std::time::Duration;

use connection::{ConnectionContext, ConnectionError, SocketConnection};
use corelib::{BincodeCodec, Message, MessageCodec, NodeDescriptor, Roster};
use metrics::counter;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::strategy::{CandidateOrder, ListOrder};

const ATTEMPTS_METRIC: &str = "roster_connection_attempts_total";

/// Connection that fails over across the nodes of a roster.
///
/// # Example
///
/// ```rust,ignore
/// let mut conn = RosterConnection::new(roster, "Status", context);
/// conn.set_timeout(Duration::from_secs(5));
/// let reply: StatusReply = conn.send(&StatusRequest {}).await?;
/// ```
pub struct RosterConnection<C: MessageCodec = BincodeCodec> {
    roster: Roster,
    service: String,
    context: ConnectionContext<C>,
    timeout: Duration,
    order: Arc<dyn CandidateOrder>,
}

impl<C: MessageCodec> RosterConnection<C> {
    /// Failover connection to `service` on the nodes of `roster`.
    ///
    /// No network activity happens until the first send.
    pub fn new(roster: Roster, service: impl Into<String>, context: ConnectionContext<C>) -> Self {
        Self {
            roster,
            service: service.into(),
            timeout: context.config.timeout,
            context,
            order: Arc::new(ListOrder),
        }
    }

    /// Replaces the candidate ordering policy.
    pub fn with_order(mut self, order: impl CandidateOrder) -> Self {
        self.order = Arc::new(order);
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Overrides the reply timeout of every subsequent attempt.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Nodes in the order the next send will try them.
    pub fn candidates(&self) -> Vec<&NodeDescriptor> {
        self.order.candidates(&self.roster)
    }

    /// Sends `request` to each candidate in turn until one replies.
    pub async fn send<Req, Resp>(&mut self, request: &Req) -> Result<Resp>
    where
        Req: Message,
        Resp: Message,
    {
        let candidates = self.order.candidates(&self.roster);
        debug!(
            service = %self.service,
            candidates = candidates.len(),
            order = self.order.name(),
            request = Req::TYPE_NAME,
            "starting failover send"
        );

        let mut attempts = 0;
        let mut last = None;
        for node in candidates {
            attempts += 1;
            let mut conn = match self.connect(node) {
                Ok(conn) => conn,
                Err(err) => {
                    warn!(node = %node.address, error = %err, "skipping node without usable url");
                    counter!(ATTEMPTS_METRIC, "outcome" => "bad_url").increment(1);
                    last = Some(Box::new(err));
                    continue;
                }
            };

            match conn.send::<Req, Resp>(request).await {
                Ok(reply) => {
                    counter!(ATTEMPTS_METRIC, "outcome" => "success").increment(1);
                    if attempts > 1 {
                        info!(url = conn.url(), attempts, "node answered after failover");
                    }
                    return Ok(reply);
                }
                Err(err) if err.is_retryable() => {
                    warn!(url = conn.url(), error = %err, "node failed, trying next");
                    counter!(ATTEMPTS_METRIC, "outcome" => "failure").increment(1);
                    last = Some(Box::new(err));
                }
                Err(err) => {
                    counter!(ATTEMPTS_METRIC, "outcome" => "rejected").increment(1);
                    return Err(Error::Connection(err));
                }
            }
        }

        Err(Error::Exhausted { attempts, last })
    }

    fn connect(&self, node: &NodeDescriptor) -> std::result::Result<SocketConnection<C>, ConnectionError> {
        let url = self
            .context
            .config
            .client_urls
            .client_url(node)
            .map_err(|err| ConnectionError::InvalidUrl {
                url: node.address.to_string(),
                reason: err.to_string(),
            })?;
        let mut conn = SocketConnection::new(&url, self.service.clone(), self.context.clone())?;
        conn.set_timeout(self.timeout);
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connection::{Script, ScriptedFactory};
    use corelib::{PublicKey, Registry};

    fn node(addr: &str) -> NodeDescriptor {
        NodeDescriptor::new(addr.parse().unwrap(), PublicKey::new(vec![1]))
    }

    fn roster_connection(roster: Roster) -> RosterConnection {
        let context = ConnectionContext::new(
            Registry::bincode(),
            ScriptedFactory::always(Script::silent()),
        );
        RosterConnection::new(roster, "Status", context)
    }

    #[test]
    fn test_candidates_follow_roster() {
        let conn = roster_connection(Roster::new(vec![node("tls://a:1234"), node("tls://b:1234")]));
        let hosts: Vec<_> = conn.candidates().iter().map(|n| n.address.host()).collect();
        assert_eq!(hosts, vec!["a", "b"]);
    }

    #[test]
    fn test_set_timeout() {
        let mut conn = roster_connection(Roster::default());
        assert_eq!(conn.timeout(), connection::DEFAULT_TIMEOUT);
        conn.set_timeout(Duration::from_millis(50));
        assert_eq!(conn.timeout(), Duration::from_millis(50));
    }

    #[test]
    fn test_connect_uses_client_url() {
        let conn = roster_connection(Roster::new(vec![node("tls://a:1234")]));
        let socket = conn.connect(&conn.roster().as_slice()[0]).unwrap();
        assert_eq!(socket.url(), "ws://a:1235");
        assert_eq!(socket.service(), "Status");
    }

    #[test]
    fn test_connect_rejects_port_overflow() {
        let conn = roster_connection(Roster::new(vec![node("tls://a:65535")]));
        let err = conn.connect(&conn.roster().as_slice()[0]).err().unwrap();
        assert!(matches!(err, ConnectionError::InvalidUrl { .. }));
    }
}
