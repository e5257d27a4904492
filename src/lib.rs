//! An Ethereum JSON RPC client with a Solidity ABI coder.
//!
//! Documentation for the APIs can be found here:
//! <https://ethereum.github.io/execution-apis/>

pub mod abi;
pub mod client;
pub mod config;
pub mod descriptor;
mod error;
pub mod events;
#[cfg(feature = "http")]
pub mod http;
pub mod jsonrpc;
#[macro_use]
pub mod method;
pub mod promievent;
mod serialization;
pub mod subscription;
pub mod transaction;
pub mod transport;
pub mod types;

pub use self::{
    client::Client,
    config::Configuration,
    error::Error,
    promievent::{PromiEvent, TransactionEvent},
    subscription::Subscription,
    transport::{Transport, TransportError},
};

use self::types::*;

module! {
    /// The `eth` namespace.
    pub mod eth {
        /// Returns a list of addresses owned by client.
        pub struct Accounts as "eth_accounts"
            Empty => Vec<Address>;

        /// Returns the number of most recent block.
        pub struct BlockNumber as "eth_blockNumber"
            Empty => U256;

        /// Executes a new message call immediately without creating a
        /// transaction on the block chain.
        pub struct Call as "eth_call"
            (TransactionRequest, BlockId) => Vec<u8> [serialization::bytes];

        /// Returns the chain ID of the current network.
        pub struct ChainId as "eth_chainId"
            Empty => U256;

        /// Returns the client coinbase address.
        pub struct Coinbase as "eth_coinbase"
            Empty => Address;

        /// Generates and returns an estimate of how much gas is necessary to
        /// allow the transaction to complete.
        pub struct EstimateGas as "eth_estimateGas"
            (TransactionRequest,) => U256;

        /// Returns the current price per gas in wei.
        pub struct GasPrice as "eth_gasPrice"
            Empty => U256;

        /// Returns the balance of the account of given address.
        pub struct GetBalance as "eth_getBalance"
            (Address, BlockId) => U256;

        /// Returns information about a block by hash.
        pub struct GetBlockByHash as "eth_getBlockByHash"
            (Digest, Hydrated) => Option<Block>;

        /// Returns information about a block by number.
        pub struct GetBlockByNumber as "eth_getBlockByNumber"
            (BlockSpec, Hydrated) => Option<Block>;

        /// Returns code at a given address.
        pub struct GetCode as "eth_getCode"
            (Address, BlockId) => Vec<u8> [serialization::bytes];

        /// Returns an array of all logs matching the specified filter.
        pub struct GetLogs as "eth_getLogs"
            (LogFilter,) => Vec<Log>;

        /// Returns the value from a storage position at a given address.
        pub struct GetStorageAt as "eth_getStorageAt"
            (Address, U256, BlockId) => Digest;

        /// Returns the number of transactions sent from an address.
        pub struct GetTransactionCount as "eth_getTransactionCount"
            (Address, BlockId) => U256;

        /// Returns the receipt of a transaction by transaction hash.
        pub struct GetTransactionReceipt as "eth_getTransactionReceipt"
            (Digest,) => Option<TransactionReceipt>;

        /// Submits a raw transaction.
        pub struct SendRawTransaction as "eth_sendRawTransaction"
            (Vec<u8>,) [serialization::bytes_param] => Digest;

        /// Signs and submits a transaction.
        pub struct SendTransaction as "eth_sendTransaction"
            (TransactionRequest,) => Digest;
    }
}

module! {
    /// The `net` namespace.
    pub mod net {
        /// Returns `true` if the client is actively listening for network
        /// connections.
        pub struct Listening as "net_listening"
            Empty => bool;

        /// Returns the number of peers currently connected to the client.
        pub struct PeerCount as "net_peerCount"
            Empty => U256;

        /// Returns the current network ID.
        pub struct Version as "net_version"
            Empty => String;
    }
}

module! {
    /// The `web3` namespace.
    pub mod web3 {
        /// Returns the current client version.
        pub struct ClientVersion as "web3_clientVersion"
            Empty => String;

        /// Returns the Keccak-256 hash of the given data.
        pub struct Sha3 as "web3_sha3"
            (Vec<u8>,) [serialization::bytes_param] => Digest;
    }
}
