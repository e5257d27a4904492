//! Building JSON RPC request envelopes.

use super::{Id, Request, Version};
use crate::{descriptor::Descriptor, Error};
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};

/// Maps method calls to JSON RPC requests with increasing IDs.
///
/// Each mapper owns its counter, so independent clients never share ID
/// sequences.
#[derive(Debug)]
pub struct PayloadMapper {
    next: AtomicU32,
}

impl PayloadMapper {
    /// Creates a mapper whose first request has ID `first`.
    pub fn new(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// Reserves the next request ID.
    pub fn next_id(&self) -> Id {
        Id(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Builds a request for a method call.
    pub fn to_payload(&self, method: &str, params: Vec<Value>) -> Result<Request, Error> {
        if method.is_empty() {
            return Err(Error::Argument("JSON RPC method name is empty".to_owned()));
        }
        Ok(Request {
            jsonrpc: Version::V2,
            id: self.next_id(),
            method: method.to_owned(),
            params,
        })
    }

    /// Builds the requests of a batch.
    ///
    /// Parameters of every call are prepared by its descriptor before any ID
    /// is assigned, so an invalid call fails the whole batch without
    /// consuming IDs.
    pub fn to_batch_payload<'a, I>(&self, calls: I) -> Result<Vec<Request>, Error>
    where
        I: IntoIterator<Item = (&'a Descriptor, Vec<Value>)>,
    {
        let calls = calls
            .into_iter()
            .map(|(descriptor, params)| {
                if descriptor.name().is_empty() {
                    return Err(Error::Argument("JSON RPC method name is empty".to_owned()));
                }
                Ok((descriptor.name(), descriptor.prepare(params)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        calls
            .into_iter()
            .map(|(method, params)| self.to_payload(method, params))
            .collect()
    }
}

impl Default for PayloadMapper {
    fn default() -> Self {
        Self::new(1)
    }
}
