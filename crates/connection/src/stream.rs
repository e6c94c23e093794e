//! Typed message streams over one adapter.
//!
//! A [`MessageStream`] owns the adapter of one exchange and turns its raw
//! events into typed [`StreamEvent`]s. Single-shot sends and persistent
//! streams share it: a single-shot send is the first event of a stream.
//!
//! # Lifecycle
//!
//! ```text
//!   create adapter ─► Open ─► write request ─► Message* ─► Closed | Error ─► None
//!                      │                                      ▲
//!                      └──── deadline until first message ────┘
//! ```
//!
//! The stream yields zero or more `Message` events followed by exactly one
//! terminal event. Nothing is spawned: the stream only makes progress while
//! its owner awaits [`MessageStream::next`], so dropping it cancels the
//! exchange.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use corelib::{Message, MessageCodec, Registry};
use futures::Stream;
use tokio::time::{self, Instant};
use tracing::debug;

use crate::adapter::{AdapterEvent, TransportAdapter, NORMAL_CLOSURE};
use crate::error::{ConnectionError, TransportError};

/// Reason used when the caller ends a stream.
pub const CLIENT_CLOSE_REASON: &str = "closed by client";

/// One step of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent<T> {
    /// A decoded message.
    Message(T),
    /// Normal close, by the peer or by [`MessageStream::close`]. Terminal.
    Closed { code: u16, reason: String },
    /// Any failure. Terminal.
    Error(ConnectionError),
}

impl<T> StreamEvent<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Message(_))
    }
}

/// Callback form of a stream consumer.
///
/// `on_close` and `on_error` are mutually exclusive and called at most once.
pub trait StreamHandler<T> {
    fn on_message(&mut self, message: T);
    fn on_close(&mut self, code: u16, reason: &str);
    fn on_error(&mut self, error: ConnectionError);
}

enum Polled {
    Event(Option<AdapterEvent>),
    TimedOut,
}

/// Stream of typed messages from one adapter.
pub struct MessageStream<T: Message, C: MessageCodec> {
    url: String,
    adapter: Option<Box<dyn TransportAdapter>>,
    payload: Option<Bytes>,
    registry: Arc<Registry<C>>,
    timeout: Duration,
    deadline: Option<Instant>,
    failed: Option<ConnectionError>,
    client_closed: bool,
    done: bool,
    _message: PhantomData<fn() -> T>,
}

impl<T: Message, C: MessageCodec> MessageStream<T, C> {
    pub(crate) fn start(
        url: String,
        adapter: Box<dyn TransportAdapter>,
        payload: Bytes,
        registry: Arc<Registry<C>>,
        timeout: Duration,
    ) -> Self {
        Self {
            url,
            adapter: Some(adapter),
            payload: Some(payload),
            registry,
            timeout,
            // a timeout past the clock's range means no deadline
            deadline: Instant::now().checked_add(timeout),
            failed: None,
            client_closed: false,
            done: false,
            _message: PhantomData,
        }
    }

    /// Stream that never touched the network and only reports `err`.
    pub(crate) fn failed(url: String, registry: Arc<Registry<C>>, err: ConnectionError) -> Self {
        Self {
            url,
            adapter: None,
            payload: None,
            registry,
            timeout: Duration::ZERO,
            deadline: None,
            failed: Some(err),
            client_closed: false,
            done: false,
            _message: PhantomData,
        }
    }

    /// URL the adapter was opened on.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Waits for the next event; `None` once the terminal event was yielded.
    pub async fn next(&mut self) -> Option<StreamEvent<T>> {
        if self.done {
            return None;
        }
        let event = self.step().await;
        if event.is_terminal() {
            self.done = true;
        }
        Some(event)
    }

    /// Ends the stream from the caller's side.
    ///
    /// The next call to [`MessageStream::next`] yields `Closed` with
    /// [`NORMAL_CLOSURE`], unless the stream had already terminated.
    pub async fn close(&mut self) {
        if self.adapter.is_some() {
            self.shutdown(CLIENT_CLOSE_REASON).await;
            self.client_closed = true;
        }
    }

    /// Drives `handler` until the stream terminates.
    pub async fn dispatch<H: StreamHandler<T>>(mut self, handler: &mut H) {
        while let Some(event) = self.next().await {
            match event {
                StreamEvent::Message(message) => handler.on_message(message),
                StreamEvent::Closed { code, reason } => handler.on_close(code, &reason),
                StreamEvent::Error(err) => handler.on_error(err),
            }
        }
    }

    /// Adapts the stream to [`futures::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = StreamEvent<T>> {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next().await.map(|event| (event, stream))
        })
    }

    /// Waits until the reply deadline passes and reports the timeout.
    ///
    /// Used by single-shot sends when the peer closed normally without
    /// replying: that close is not an outcome of its own.
    pub(crate) async fn expire(mut self) -> ConnectionError {
        match self.deadline {
            Some(at) => time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
        self.shutdown("timeout").await;
        ConnectionError::Timeout(self.timeout)
    }

    async fn step(&mut self) -> StreamEvent<T> {
        if let Some(err) = self.failed.take() {
            return StreamEvent::Error(err);
        }

        loop {
            let deadline = self.deadline;
            let polled = {
                let adapter = match self.adapter.as_mut() {
                    Some(adapter) => adapter,
                    None if self.client_closed => {
                        return StreamEvent::Closed {
                            code: NORMAL_CLOSURE,
                            reason: CLIENT_CLOSE_REASON.to_string(),
                        }
                    }
                    None => return StreamEvent::Error(TransportError::Disconnected.into()),
                };
                match deadline {
                    Some(at) => match time::timeout_at(at, adapter.next_event()).await {
                        Ok(event) => Polled::Event(event),
                        Err(_) => Polled::TimedOut,
                    },
                    None => Polled::Event(adapter.next_event().await),
                }
            };

            match polled {
                Polled::TimedOut => {
                    debug!(url = %self.url, timeout = ?self.timeout, "no reply before deadline");
                    self.shutdown("timeout").await;
                    return StreamEvent::Error(ConnectionError::Timeout(self.timeout));
                }
                Polled::Event(None) => {
                    self.adapter = None;
                    return StreamEvent::Error(TransportError::Disconnected.into());
                }
                Polled::Event(Some(AdapterEvent::Open)) => {
                    if let Some(payload) = self.payload.take() {
                        debug!(url = %self.url, bytes = payload.len(), "connection open, sending request");
                        let sent = match self.adapter.as_mut() {
                            Some(adapter) => adapter.send(payload).await,
                            None => Err(TransportError::Disconnected),
                        };
                        if let Err(err) = sent {
                            self.shutdown("send failed").await;
                            return StreamEvent::Error(err.into());
                        }
                    }
                }
                Polled::Event(Some(AdapterEvent::Message(bytes))) => {
                    return match self.registry.decode::<T>(&bytes) {
                        Ok(message) => {
                            self.deadline = None;
                            StreamEvent::Message(message)
                        }
                        Err(err) => {
                            debug!(url = %self.url, error = %err, "undecodable reply");
                            self.shutdown("unexpected message").await;
                            StreamEvent::Error(err.into())
                        }
                    };
                }
                Polled::Event(Some(AdapterEvent::Close { code, reason })) => {
                    // peer already closed; nothing left to shut down
                    self.adapter = None;
                    debug!(url = %self.url, code, %reason, "connection closed by peer");
                    return if code == NORMAL_CLOSURE {
                        StreamEvent::Closed { code, reason }
                    } else {
                        StreamEvent::Error(ConnectionError::AbnormalClose { code, reason })
                    };
                }
                Polled::Event(Some(AdapterEvent::Error(err))) => {
                    debug!(url = %self.url, error = %err, "transport error");
                    self.shutdown("transport error").await;
                    return StreamEvent::Error(err.into());
                }
            }
        }
    }

    async fn shutdown(&mut self, reason: &str) {
        if let Some(mut adapter) = self.adapter.take() {
            adapter.close(NORMAL_CLOSURE, reason).await;
        }
    }
}
