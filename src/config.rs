//! Client configuration.

use crate::types::BlockId;
use std::time::Duration;

/// Configuration options for a [`crate::client::Client`].
#[derive(Clone, Debug)]
pub struct Configuration {
    /// The ID of the first request. IDs increase by one for every request
    /// sent through the client.
    pub first_id: u32,
    /// The block parameter used by calls that take an optional block and are
    /// made without one.
    pub default_block: BlockId,
    /// The number of blocks after inclusion of a sent transaction for which
    /// confirmation events are emitted.
    pub confirmation_blocks: u64,
    /// How often to poll for transaction receipts and new blocks.
    pub polling_interval: Duration,
    /// How long to wait for a transaction receipt before giving up.
    pub polling_timeout: Duration,
    /// The maximum time to wait for a response to a request sent through a
    /// transport that delivers its responses asynchronously. Calls wait
    /// indefinitely (until the client is disconnected) when unset.
    pub request_timeout: Option<Duration>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            first_id: 1,
            default_block: BlockId::default(),
            confirmation_blocks: 24,
            polling_interval: Duration::from_secs(1),
            polling_timeout: Duration::from_secs(750),
            request_timeout: None,
        }
    }
}
