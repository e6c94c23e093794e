//! Single-endpoint connection.
//!
//! A `SocketConnection` targets one URL. Every send creates a fresh adapter
//! through the context's factory, writes one request and waits for the
//! outcome. Requests go to `url/service/TYPE_NAME`.
//!
//! # Outcomes of a single-shot send
//!
//! Exactly one of these ends [`SocketConnection::send`]; the first to fire
//! wins and the others are never observed:
//!
//! 1. a message arrives and decodes: success, connection closed normally
//! 2. a message arrives and does not decode: `Decode`, connection closed
//! 3. the peer closes with a code other than 1000: `AbnormalClose`
//! 4. the adapter reports an error: `Transport`
//! 5. the deadline passes first: `Timeout`, adapter force-closed

use std::time::Duration;

use corelib::{BincodeCodec, Message, MessageCodec};
use tracing::debug;

use crate::config::ConnectionContext;
use crate::error::ConnectionError;
use crate::stream::{MessageStream, StreamEvent, StreamHandler};

/// Connection to one node.
pub struct SocketConnection<C: MessageCodec = BincodeCodec> {
    url: String,
    service: String,
    timeout: Duration,
    context: ConnectionContext<C>,
}

impl<C: MessageCodec> SocketConnection<C> {
    /// Connection to `url` for `service`.
    ///
    /// The URL is normalised immediately (see
    /// [`crate::ConnectionConfig::effective_url`]); no network activity
    /// happens until the first send.
    pub fn new(
        url: &str,
        service: impl Into<String>,
        context: ConnectionContext<C>,
    ) -> Result<Self, ConnectionError> {
        let url = context.config.effective_url(url)?;
        Ok(Self {
            url,
            service: service.into(),
            timeout: context.config.timeout,
            context,
        })
    }

    /// Effective URL of the node.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Overrides the reply timeout for subsequent sends.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Sends `request` and waits for one `Resp`.
    pub async fn send<Req, Resp>(&mut self, request: &Req) -> Result<Resp, ConnectionError>
    where
        Req: Message,
        Resp: Message,
    {
        let mut stream = self.open::<Req, Resp>(request)?;
        match stream.next().await {
            Some(StreamEvent::Message(reply)) => {
                stream.close().await;
                Ok(reply)
            }
            Some(StreamEvent::Error(err)) => Err(err),
            Some(StreamEvent::Closed { .. }) | None => Err(stream.expire().await),
        }
    }

    /// Sends `request` and keeps the connection open for a stream of `Resp`.
    ///
    /// Registration and encoding failures are reported as the stream's only
    /// event; the factory is not invoked in that case.
    pub fn send_stream<Req, Resp>(&mut self, request: &Req) -> MessageStream<Resp, C>
    where
        Req: Message,
        Resp: Message,
    {
        match self.open::<Req, Resp>(request) {
            Ok(stream) => stream,
            Err(err) => MessageStream::failed(
                self.request_url(Req::TYPE_NAME),
                self.context.registry.clone(),
                err,
            ),
        }
    }

    /// Callback form of [`SocketConnection::send_stream`].
    pub async fn send_stream_with<Req, Resp, H>(&mut self, request: &Req, handler: &mut H)
    where
        Req: Message,
        Resp: Message,
        H: StreamHandler<Resp>,
    {
        self.send_stream::<Req, Resp>(request).dispatch(handler).await
    }

    fn open<Req, Resp>(&self, request: &Req) -> Result<MessageStream<Resp, C>, ConnectionError>
    where
        Req: Message,
        Resp: Message,
    {
        let registry = &self.context.registry;
        registry.ensure_registered::<Req>()?;
        registry.ensure_registered::<Resp>()?;
        let payload = registry.encode(request)?;

        let url = self.request_url(Req::TYPE_NAME);
        debug!(%url, request = Req::TYPE_NAME, reply = Resp::TYPE_NAME, "creating adapter");
        let adapter = self.context.factory.create(&url);

        Ok(MessageStream::start(
            url,
            adapter,
            payload,
            registry.clone(),
            self.timeout,
        ))
    }

    fn request_url(&self, type_name: &str) -> String {
        let mut url = self.url.clone();
        for segment in [self.service.trim_matches('/'), type_name] {
            if !segment.is_empty() {
                url.push('/');
                url.push_str(segment);
            }
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::{Script, ScriptedFactory};
    use corelib::Registry;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Ping {
        seq: u64,
    }

    impl Message for Ping {
        const TYPE_NAME: &'static str = "Ping";
    }

    fn connection(url: &str, service: &str) -> SocketConnection {
        let context = ConnectionContext::new(
            Registry::bincode().with::<Ping>(),
            ScriptedFactory::always(Script::silent()),
        );
        SocketConnection::new(url, service, context).unwrap()
    }

    #[test]
    fn test_request_url() {
        let conn = connection("ws://a:1235/", "Status");
        assert_eq!(conn.request_url("Request"), "ws://a:1235/Status/Request");

        let conn = connection("ws://a:1235", "");
        assert_eq!(conn.request_url("Request"), "ws://a:1235/Request");

        let conn = connection("wss://host/conode", "/ByzCoin/");
        assert_eq!(conn.request_url("Get"), "wss://host/conode/ByzCoin/Get");
    }

    #[test]
    fn test_set_timeout() {
        let mut conn = connection("ws://a:1235", "svc");
        assert_eq!(conn.timeout(), Duration::from_secs(30));
        conn.set_timeout(Duration::from_millis(200));
        assert_eq!(conn.timeout(), Duration::from_millis(200));
    }

    #[test]
    fn test_invalid_url() {
        let context = ConnectionContext::new(
            Registry::bincode(),
            ScriptedFactory::always(Script::silent()),
        );
        assert!(matches!(
            SocketConnection::new("not a url", "svc", context),
            Err(ConnectionError::InvalidUrl { .. })
        ));
    }
}
