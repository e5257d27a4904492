//! Client errors.

use crate::{
    abi,
    jsonrpc::{self, Id},
    transaction::{SignerError, TransactionError},
    transport::TransportError,
};
use std::sync::Arc;
use thiserror::Error;

/// An error executing a JSON RPC call.
///
/// Errors are cloneable so that a single transport failure can be reported
/// to every call that was part of the failed payload.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// Malformed caller input, detected before any I/O.
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error("ABI error: {0}")]
    Encoding(#[from] abi::Error),
    /// The node responded with a JSON RPC error object.
    #[error("node error: {0}")]
    Node(#[from] jsonrpc::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("response ID {actual:?} does not match request ID {expected}")]
    IdMismatch { expected: Id, actual: Option<Id> },
    #[error("no response for request {0}")]
    MissingResponse(Id),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Signer(#[from] SignerError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("JSON error: {0}")]
    Json(#[from] Arc<serde_json::Error>),
    #[error("connection closed")]
    Disconnected,
    #[error("request timed out")]
    Timeout,
    #[error("transport does not support subscriptions")]
    SubscriptionsNotSupported,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::from(Arc::new(err))
    }
}
