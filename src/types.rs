//! Ethereum RPC types.

use crate::serialization;
use ethprim::AsU256 as _;
use serde::{
    de::{self, Deserializer},
    ser::Serializer,
    Deserialize, Serialize,
};

pub use arrayvec::ArrayVec;
pub use ethprim::{Address, Digest, I256, U256};

/// Empty JSON RPC parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct Empty;

impl Serialize for Empty {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [(); 0].serialize(serializer)
    }
}

/// Block number or tag.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockSpec {
    /// Block by number.
    Number(U256),
    /// Block by tag.
    Tag(BlockTag),
}

impl Default for BlockSpec {
    fn default() -> Self {
        Self::Tag(Default::default())
    }
}

impl From<U256> for BlockSpec {
    fn from(number: U256) -> Self {
        Self::Number(number)
    }
}

impl From<u64> for BlockSpec {
    fn from(number: u64) -> Self {
        number.as_u256().into()
    }
}

impl From<BlockTag> for BlockSpec {
    fn from(tag: BlockTag) -> Self {
        Self::Tag(tag)
    }
}

/// Block number, tag, or block hash.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockId {
    Number(U256),
    Hash(Digest),
    Tag(BlockTag),
}

impl Default for BlockId {
    fn default() -> Self {
        Self::Tag(Default::default())
    }
}

impl From<U256> for BlockId {
    fn from(number: U256) -> Self {
        Self::Number(number)
    }
}

impl From<u64> for BlockId {
    fn from(number: u64) -> Self {
        number.as_u256().into()
    }
}

impl From<BlockTag> for BlockId {
    fn from(tag: BlockTag) -> Self {
        Self::Tag(tag)
    }
}

impl BlockId {
    /// Returns the JSON RPC representation of the block parameter.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(number) => format!("0x{number:x}").into(),
            Self::Hash(hash) => serialization::encode(&hash.0).into(),
            Self::Tag(tag) => tag.name().into(),
        }
    }
}

impl From<BlockSpec> for BlockId {
    fn from(spec: BlockSpec) -> Self {
        match spec {
            BlockSpec::Number(number) => Self::Number(number),
            BlockSpec::Tag(tag) => Self::Tag(tag),
        }
    }
}

/// Block tag.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    /// The lowest numbered block the client has available.
    Earliest,
    /// The most recent crypto-economically secure block.
    Finalized,
    /// The most recent block that is safe from re-orgs under honest majority.
    Safe,
    /// The most recent block in the canonical chain observed by the client.
    #[default]
    Latest,
    /// A sample next block built on top of [`BlockTag::Latest`].
    Pending,
}

impl BlockTag {
    /// Returns the tag for a JSON RPC block tag string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "earliest" => Some(Self::Earliest),
            "finalized" => Some(Self::Finalized),
            "safe" => Some(Self::Safe),
            "latest" => Some(Self::Latest),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }

    /// Returns the JSON RPC name of the tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Earliest => "earliest",
            Self::Finalized => "finalized",
            Self::Safe => "safe",
            Self::Latest => "latest",
            Self::Pending => "pending",
        }
    }
}

/// Whether block transactions should be hydrated.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Hydrated {
    /// Only fetch transaction hashes for blocks.
    #[default]
    No,
    /// Fetch full transaction data for blocks.
    Yes,
}

impl Serialize for Hydrated {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        matches!(self, Self::Yes).serialize(serializer)
    }
}

/// A transaction to send or simulate.
///
/// All fields are optional; the node fills in what it can for
/// `eth_sendTransaction`, `eth_call` and `eth_estimateGas`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// The recipient, `None` for contract creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// The gas limit. Receipts of transactions using all of it are reported
    /// as out of gas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// The calldata.
    #[serde(
        default,
        rename = "data",
        skip_serializing_if = "Option::is_none",
        with = "serialization::option_bytes"
    )]
    pub input: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U256>,
}

/// A value used for filtering logs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum LogFilterValue<T> {
    /// A filter that accepts all values.
    #[default]
    Any,
    /// A filter that only accepts a single value.
    Exact(T),
    /// A filter that accepts any one of the specified values.
    OneOf(Vec<T>),
}

impl<T> Serialize for LogFilterValue<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Any => serializer.serialize_none(),
            Self::Exact(value) => value.serialize(serializer),
            Self::OneOf(values) => values.serialize(serializer),
        }
    }
}

/// A filter for querying logs from a node.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_block: Option<BlockSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_block: Option<BlockSpec>,
    /// An exact block hash to query logs for, exclusive with the block
    /// range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<Digest>,
    #[serde(skip_serializing_if = "is_any")]
    pub address: LogFilterValue<Address>,
    #[serde(skip_serializing_if = "ArrayVec::is_empty")]
    pub topics: ArrayVec<LogFilterValue<Digest>, 4>,
}

fn is_any<T>(value: &LogFilterValue<T>) -> bool {
    matches!(value, LogFilterValue::Any)
}

/// An Ethereum log.
///
/// Block and transaction fields are `None` for pending logs.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Whether or not the log was removed because of a re-org.
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub log_index: Option<U256>,
    #[serde(default)]
    pub transaction_index: Option<U256>,
    #[serde(default)]
    pub transaction_hash: Option<Digest>,
    #[serde(default)]
    pub block_hash: Option<Digest>,
    #[serde(default)]
    pub block_number: Option<U256>,
    /// The address of the contract that emitted the log.
    pub address: Address,
    /// The non-indexed data emitted with the log.
    #[serde(with = "serialization::bytes")]
    pub data: Vec<u8>,
    /// The topics emitted with the log.
    pub topics: ArrayVec<Digest, 4>,
}

/// An Ethereum transaction receipt.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: Digest,
    #[serde(default)]
    pub transaction_index: Option<U256>,
    #[serde(default)]
    pub block_hash: Option<Digest>,
    #[serde(default)]
    pub block_number: Option<U256>,
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub cumulative_gas_used: U256,
    /// The amount of gas used for this specific transaction alone.
    pub gas_used: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_gas_price: Option<U256>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub logs: Vec<Log>,
    /// The transaction status. Only specified for transactions included after
    /// the Byzantium upgrade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionReceiptStatus>,
    /// Set by nodes that report gas exhaustion explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_of_gas: Option<bool>,
}

/// The status of a [`TransactionReceipt`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum TransactionReceiptStatus {
    #[serde(rename = "0x0")]
    Failure,
    #[serde(rename = "0x1")]
    Success,
}

impl<'de> Deserialize<'de> for TransactionReceiptStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Quantity(U256),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(true) => Ok(Self::Success),
            Raw::Flag(false) => Ok(Self::Failure),
            Raw::Quantity(value) if value == U256::ONE => Ok(Self::Success),
            Raw::Quantity(value) if value == U256::ZERO => Ok(Self::Failure),
            Raw::Quantity(value) => Err(de::Error::custom(format!(
                "invalid receipt status {value}"
            ))),
        }
    }
}

/// Transactions included in a block.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    /// Transaction hashes that were part of a block.
    Hash(Vec<Digest>),
    /// Full transaction objects.
    Full(Vec<serde_json::Value>),
}

impl Default for BlockTransactions {
    fn default() -> Self {
        Self::Hash(Vec::new())
    }
}

/// An Ethereum block header with its transactions.
///
/// Fields that are `null` for pending blocks are optional.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default)]
    pub hash: Option<Digest>,
    pub parent_hash: Digest,
    #[serde(default)]
    pub number: Option<U256>,
    #[serde(default)]
    pub miner: Option<Address>,
    pub gas_limit: U256,
    pub gas_used: U256,
    pub timestamp: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
    #[serde(with = "serialization::bytes")]
    pub extra_data: Vec<u8>,
    #[serde(default)]
    pub transactions: BlockTransactions,
}
