//! Transport adapter contract.
//!
//! The connection layer never touches sockets. It drives an adapter created
//! per exchange by an [`AdapterFactory`], writes bytes through it and reacts
//! to the events it reports. Swapping the factory swaps the transport (real
//! socket, in-memory, scripted) without touching connection logic.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;

/// Close code of a graceful shutdown. Any other code is abnormal.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Event reported by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    /// Connection is established and ready for writes.
    Open,
    /// One complete inbound message.
    Message(Bytes),
    /// Peer closed the connection.
    Close { code: u16, reason: String },
    /// Transport failure.
    Error(TransportError),
}

/// Event-driven message socket.
///
/// Each lifecycle phase (open, close, error) is reported at most once;
/// messages may repeat. Once `next_event` returns `None` the adapter has no
/// more events to give.
#[async_trait]
pub trait TransportAdapter: Send {
    /// Waits for the next event.
    async fn next_event(&mut self) -> Option<AdapterEvent>;

    /// Writes one message. Only valid after `Open`.
    async fn send(&mut self, payload: Bytes) -> Result<(), TransportError>;

    /// Closes the connection from the client side.
    async fn close(&mut self, code: u16, reason: &str);
}

/// Creates one adapter per exchange.
pub trait AdapterFactory: Send + Sync {
    fn create(&self, url: &str) -> Box<dyn TransportAdapter>;
}

impl<F> AdapterFactory for F
where
    F: Fn(&str) -> Box<dyn TransportAdapter> + Send + Sync,
{
    fn create(&self, url: &str) -> Box<dyn TransportAdapter> {
        self(url)
    }
}
