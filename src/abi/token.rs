//! Solidity ABI values.

use super::{Error, ParamType};
use crate::types::{Address, ArrayVec, I256, U256};
use serde_json::Value;

/// A Solidity ABI value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    Uint(U256),
    Int(I256),
    Address(Address),
    Bool(bool),
    FixedBytes(ArrayVec<u8, 32>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Token>),
    FixedArray(Vec<Token>),
    Tuple(Vec<Token>),
}

impl Token {
    /// Creates a fixed bytes token from a slice. Returns `None` if the slice
    /// is longer than 32 bytes.
    pub fn fixed_bytes(bytes: &[u8]) -> Option<Self> {
        ArrayVec::try_from(bytes).ok().map(Self::FixedBytes)
    }

    /// A short description of the kind of value, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Uint(_) => "uint",
            Self::Int(_) => "int",
            Self::Address(_) => "address",
            Self::Bool(_) => "bool",
            Self::FixedBytes(_) => "fixed bytes",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::FixedArray(_) => "fixed array",
            Self::Tuple(_) => "tuple",
        }
    }

    /// Builds a token of the specified type from a JSON value.
    ///
    /// Integers may be JSON numbers, decimal strings or `0x`-prefixed hex
    /// strings. Addresses and bytes are `0x`-prefixed hex strings. Arrays and
    /// tuples are JSON arrays.
    pub fn from_json(kind: &ParamType, value: &Value) -> Result<Self, Error> {
        let mismatch = || Error::TypeMismatch {
            expected: kind.to_string(),
            actual: value.to_string(),
        };

        match (kind, value) {
            (ParamType::Uint(_), Value::Number(n)) => {
                n.as_u64().map(|n| Self::Uint(U256::from(n))).ok_or_else(mismatch)
            }
            (ParamType::Uint(_), Value::String(s)) => parse_uint(s).map(Self::Uint).ok_or_else(mismatch),
            (ParamType::Int(_), Value::Number(n)) => n
                .as_i64()
                .map(I256::from)
                .or_else(|| n.as_u64().map(I256::from))
                .map(Self::Int)
                .ok_or_else(mismatch),
            (ParamType::Int(_), Value::String(s)) => parse_int(s).map(Self::Int).ok_or_else(mismatch),
            (ParamType::Address, Value::String(s)) => {
                let mut address = [0; 20];
                hex::decode_to_slice(strip_hex(s).ok_or_else(mismatch)?, &mut address)
                    .map_err(|_| mismatch())?;
                Ok(Self::Address(Address(address)))
            }
            (ParamType::Bool, Value::Bool(b)) => Ok(Self::Bool(*b)),
            (ParamType::FixedBytes(len), Value::String(s)) => {
                let bytes = decode_hex(s).ok_or_else(mismatch)?;
                if bytes.len() > *len {
                    return Err(Error::OutOfRange(kind.to_string()));
                }
                Self::fixed_bytes(&bytes).ok_or_else(mismatch)
            }
            (ParamType::Bytes, Value::String(s)) => decode_hex(s).map(Self::Bytes).ok_or_else(mismatch),
            (ParamType::String, Value::String(s)) => Ok(Self::String(s.clone())),
            (ParamType::Array(inner), Value::Array(items)) => Ok(Self::Array(
                items
                    .iter()
                    .map(|item| Self::from_json(inner, item))
                    .collect::<Result<_, _>>()?,
            )),
            (ParamType::FixedArray(inner, len), Value::Array(items)) => {
                if items.len() != *len {
                    return Err(Error::Arity {
                        expected: *len,
                        actual: items.len(),
                    });
                }
                Ok(Self::FixedArray(
                    items
                        .iter()
                        .map(|item| Self::from_json(inner, item))
                        .collect::<Result<_, _>>()?,
                ))
            }
            (ParamType::Tuple(fields), Value::Array(items)) => {
                if items.len() != fields.len() {
                    return Err(Error::Arity {
                        expected: fields.len(),
                        actual: items.len(),
                    });
                }
                Ok(Self::Tuple(
                    fields
                        .iter()
                        .zip(items)
                        .map(|(field, item)| Self::from_json(field, item))
                        .collect::<Result<_, _>>()?,
                ))
            }
            _ => Err(mismatch()),
        }
    }

    /// Renders the token as JSON. Integers are rendered as decimal strings
    /// so that no precision is lost; addresses and bytes as lowercase `0x`
    /// prefixed hex.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Uint(value) => Value::String(value.to_string()),
            Self::Int(value) => Value::String(value.to_string()),
            Self::Address(address) => Value::String(format!("0x{}", hex::encode(address.0))),
            Self::Bool(value) => Value::Bool(*value),
            Self::FixedBytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
            Self::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
            Self::String(value) => Value::String(value.clone()),
            Self::Array(items) | Self::FixedArray(items) | Self::Tuple(items) => {
                Value::Array(items.iter().map(Self::to_json).collect())
            }
        }
    }
}

impl From<U256> for Token {
    fn from(value: U256) -> Self {
        Self::Uint(value)
    }
}

impl From<I256> for Token {
    fn from(value: I256) -> Self {
        Self::Int(value)
    }
}

impl From<Address> for Token {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<bool> for Token {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

fn strip_hex(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    hex::decode(strip_hex(s)?).ok()
}

fn parse_uint(s: &str) -> Option<U256> {
    match strip_hex(s) {
        Some(hex) => U256::from_str_radix(hex, 16).ok(),
        None => U256::from_str_radix(s, 10).ok(),
    }
}

fn parse_int(s: &str) -> Option<I256> {
    match strip_hex(s) {
        Some(_) => {
            let value = parse_uint(s)?;
            (value.leading_zeros() > 0).then(|| I256::from_be_bytes(value.to_be_bytes()))
        }
        None => I256::from_str_radix(s, 10).ok(),
    }
}
