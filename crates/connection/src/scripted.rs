//! In-memory scripted transport.
//!
//! `ScriptedAdapter` opens immediately and, once the request has been written,
//! replays a fixed script: reply messages, then an optional error, then an
//! optional close. With nothing scripted it stays silent forever, which is how
//! timeouts are exercised. A shared [`AdapterProbe`] records every adapter the
//! factory created so tests can assert on transport activity.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::adapter::{AdapterEvent, AdapterFactory, TransportAdapter};
use crate::error::TransportError;

/// Reason sent with scripted close frames.
pub const SCRIPTED_CLOSE_REASON: &str = "reason to close";

/// What a scripted peer does.
#[derive(Clone, Debug, Default)]
pub struct Script {
    refuse: Option<TransportError>,
    replies: Vec<Bytes>,
    error: Option<TransportError>,
    close: Option<(u16, String)>,
}

impl Script {
    /// A peer that accepts the connection and never answers.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Fail the connection attempt instead of opening.
    pub fn refuse(mut self, err: TransportError) -> Self {
        self.refuse = Some(err);
        self
    }

    /// Queue one reply message.
    pub fn reply(mut self, payload: impl Into<Bytes>) -> Self {
        self.replies.push(payload.into());
        self
    }

    /// Report a transport error after the replies.
    pub fn error(mut self, err: TransportError) -> Self {
        self.error = Some(err);
        self
    }

    /// Close with `code` and [`SCRIPTED_CLOSE_REASON`] after everything else.
    pub fn close(self, code: u16) -> Self {
        self.close_with(code, SCRIPTED_CLOSE_REASON)
    }

    pub fn close_with(mut self, code: u16, reason: impl Into<String>) -> Self {
        self.close = Some((code, reason.into()));
        self
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    created: Vec<String>,
    sent: Vec<(String, Bytes)>,
    client_closes: Vec<(String, u16, String)>,
    open: usize,
    max_open: usize,
}

/// Shared record of what scripted adapters did.
#[derive(Clone, Debug, Default)]
pub struct AdapterProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl AdapterProbe {
    /// URLs passed to the factory, in creation order.
    pub fn created_urls(&self) -> Vec<String> {
        self.state.lock().created.clone()
    }

    pub fn created_count(&self) -> usize {
        self.state.lock().created.len()
    }

    /// Payloads written, with the URL of the adapter that wrote them.
    pub fn sent(&self) -> Vec<(String, Bytes)> {
        self.state.lock().sent.clone()
    }

    /// Closes initiated by the client side.
    pub fn client_closes(&self) -> Vec<(String, u16, String)> {
        self.state.lock().client_closes.clone()
    }

    /// Adapters currently alive.
    pub fn open_count(&self) -> usize {
        self.state.lock().open
    }

    /// Highest number of adapters alive at the same time.
    pub fn max_open(&self) -> usize {
        self.state.lock().max_open
    }
}

/// Adapter replaying a [`Script`].
pub struct ScriptedAdapter {
    url: String,
    script: Script,
    events: VecDeque<AdapterEvent>,
    closed: bool,
    probe: AdapterProbe,
}

impl ScriptedAdapter {
    fn new(url: &str, script: Script, probe: AdapterProbe) -> Self {
        {
            let mut state = probe.state.lock();
            state.created.push(url.to_string());
            state.open += 1;
            state.max_open = state.max_open.max(state.open);
        }
        let mut events = VecDeque::new();
        match &script.refuse {
            Some(err) => events.push_back(AdapterEvent::Error(err.clone())),
            None => events.push_back(AdapterEvent::Open),
        }
        Self {
            url: url.to_string(),
            script,
            events,
            closed: false,
            probe,
        }
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.probe.state.lock().open -= 1;
        }
    }
}

#[async_trait]
impl TransportAdapter for ScriptedAdapter {
    async fn next_event(&mut self) -> Option<AdapterEvent> {
        if self.closed {
            return None;
        }
        match self.events.pop_front() {
            Some(event) => {
                if matches!(event, AdapterEvent::Close { .. }) {
                    self.release();
                }
                Some(event)
            }
            None => std::future::pending().await,
        }
    }

    async fn send(&mut self, payload: Bytes) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Disconnected);
        }
        self.probe
            .state
            .lock()
            .sent
            .push((self.url.clone(), payload));

        for reply in &self.script.replies {
            self.events.push_back(AdapterEvent::Message(reply.clone()));
        }
        if let Some(err) = &self.script.error {
            self.events.push_back(AdapterEvent::Error(err.clone()));
        }
        if let Some((code, reason)) = &self.script.close {
            self.events.push_back(AdapterEvent::Close {
                code: *code,
                reason: reason.clone(),
            });
        }
        Ok(())
    }

    async fn close(&mut self, code: u16, reason: &str) {
        if self.closed {
            return;
        }
        self.probe
            .state
            .lock()
            .client_closes
            .push((self.url.clone(), code, reason.to_string()));
        self.events.clear();
        self.release();
    }
}

impl Drop for ScriptedAdapter {
    fn drop(&mut self) {
        self.release();
    }
}

type Router = dyn Fn(&str) -> Script + Send + Sync;

/// Factory producing [`ScriptedAdapter`]s, routed by URL.
#[derive(Clone)]
pub struct ScriptedFactory {
    router: Arc<Router>,
    probe: AdapterProbe,
}

impl ScriptedFactory {
    /// Picks the script for each adapter from its URL.
    pub fn new(router: impl Fn(&str) -> Script + Send + Sync + 'static) -> Self {
        Self {
            router: Arc::new(router),
            probe: AdapterProbe::default(),
        }
    }

    /// Same script for every adapter.
    pub fn always(script: Script) -> Self {
        Self::new(move |_| script.clone())
    }

    pub fn probe(&self) -> AdapterProbe {
        self.probe.clone()
    }
}

impl AdapterFactory for ScriptedFactory {
    fn create(&self, url: &str) -> Box<dyn TransportAdapter> {
        let script = (self.router)(url);
        Box::new(ScriptedAdapter::new(url, script, self.probe.clone()))
    }
}
