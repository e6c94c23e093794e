//! Single-endpoint connections over a pluggable message transport.
//!
//! This crate provides:
//! - The transport adapter contract and its factory
//! - One-shot request/reply exchanges with timeout and protocol-error detection
//! - Persistent typed message streams
//! - A scripted in-memory transport for tests

pub mod adapter;
pub mod config;
pub mod connection;
pub mod error;
pub mod scripted;
pub mod stream;

pub use adapter::{AdapterEvent, AdapterFactory, TransportAdapter, NORMAL_CLOSURE};
pub use config::{ConnectionConfig, ConnectionContext, SecurityContext, DEFAULT_TIMEOUT};
pub use connection::SocketConnection;
pub use error::{ConnectionError, TransportError};
pub use scripted::{AdapterProbe, Script, ScriptedFactory};
pub use stream::{MessageStream, StreamEvent, StreamHandler};
