//! Solidity ABI encoding and decoding.
//!
//! The specification for the binary format can be found here:
//! <https://docs.soliditylang.org/en/latest/abi-spec.html>

pub mod codec;
pub mod coder;
pub mod item;
pub mod param;
pub mod token;

pub use self::{
    coder::{
        canonical_signature, decode, decode_function_output, decode_log, decode_parameters,
        encode_event_signature, encode_function_call, encode_function_signature,
        encode_parameters, DecodedParam, DecodedParams,
    },
    item::{Abi, AbiItem, ItemKind, Param, StateMutability},
    param::ParamType,
    token::Token,
};
use thiserror::Error;

/// A single 32-byte ABI word.
pub type Word = [u8; 32];

/// An ABI encoding or decoding error.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("expected {expected} values but got {actual}")]
    Arity { expected: usize, actual: usize },
    #[error("value does not fit in {0}")]
    OutOfRange(String),
    #[error("malformed ABI data: {0}")]
    MalformedData(String),
    #[error("expected a value of type {expected} but got {actual}")]
    TypeMismatch { expected: String, actual: String },
    #[error("invalid ABI type {0:?}")]
    InvalidType(String),
    #[error("invalid signature {0:?}")]
    InvalidSignature(String),
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedData(msg.into())
    }
}
