//! The transport abstraction used by the client.

use futures::future::BoxFuture;
use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display, Formatter},
    sync::Arc,
};
use thiserror::Error;

/// A channel for sending serialized JSON RPC payloads to a node.
///
/// Request/response transports (such as HTTP) resolve `send` with the reply
/// body. Transports that deliver replies asynchronously (such as WebSockets
/// or IPC) resolve `send` with `None` once the payload is written and pass
/// every incoming message to [`crate::client::Client::receive`].
pub trait Transport: Send + Sync {
    /// Sends a payload, returning the reply for request/response transports.
    fn send(&self, payload: String) -> BoxFuture<'_, Result<Option<String>, TransportError>>;

    /// Returns `true` if the node can push subscription notifications
    /// through this transport.
    fn supports_subscriptions(&self) -> bool {
        false
    }

    /// Closes the underlying connection. Returns `false` if the transport
    /// has no connection to close.
    fn disconnect(&self) -> bool {
        false
    }
}

/// A transport failure.
#[derive(Clone, Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub Arc<dyn StdError + Send + Sync>);

impl TransportError {
    /// Wraps an underlying error.
    pub fn new<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(err))
    }

    /// Creates an error from a message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }
}

#[derive(Debug)]
struct Message(String);

impl Display for Message {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for Message {}
