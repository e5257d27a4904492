//! Decoding contract event logs.

use crate::{
    abi::{self, coder, Abi, AbiItem, DecodedParams},
    serialization,
    types::{Address, ArrayVec, Digest, Log, U256},
};
use serde::Serialize;

/// A log decoded as an instance of a contract event.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedLog {
    /// The event name.
    pub event: String,
    /// The event topic, `None` for anonymous events.
    pub signature: Option<Digest>,
    pub address: Address,
    pub return_values: DecodedParams,
    pub log_index: Option<U256>,
    pub transaction_index: Option<U256>,
    pub transaction_hash: Option<Digest>,
    pub block_hash: Option<Digest>,
    pub block_number: Option<U256>,
    pub removed: bool,
    /// The undecoded log data and topics.
    pub raw: RawLog,
}

/// Raw log contents.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RawLog {
    #[serde(with = "serialization::bytes")]
    pub data: Vec<u8>,
    pub topics: ArrayVec<Digest, 4>,
}

/// Decodes a log emitted by `event`.
///
/// The first topic of non-anonymous events is the event signature hash and
/// is not an argument. A log with no data only decodes indexed arguments.
pub fn decode(event: &AbiItem, log: &Log) -> Result<DecodedLog, abi::Error> {
    let (signature, topics) = match log.topics.split_first() {
        Some((signature, topics)) if !event.is_anonymous() => (Some(*signature), topics),
        _ => (None, &log.topics[..]),
    };
    let data = (!log.data.is_empty()).then_some(&log.data[..]);
    let return_values = coder::decode_log(event.inputs(), data, topics)?;

    Ok(DecodedLog {
        event: event.name().to_owned(),
        signature,
        address: log.address,
        return_values,
        log_index: log.log_index,
        transaction_index: log.transaction_index,
        transaction_hash: log.transaction_hash,
        block_hash: log.block_hash,
        block_number: log.block_number,
        removed: log.removed,
        raw: RawLog {
            data: log.data.clone(),
            topics: log.topics.clone(),
        },
    })
}

/// Decodes a log with the event of a contract ABI matching its first topic.
///
/// Returns `None` if the log has no topics or the ABI has no such event.
pub fn decode_with_abi(abi: &Abi, log: &Log) -> Option<Result<DecodedLog, abi::Error>> {
    let event = abi.event_by_topic(log.topics.first()?)?;
    Some(decode(event, log))
}
