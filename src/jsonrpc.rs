//! Module containing serializable JSON RPC data types.

pub mod batch;
pub mod payload;

use serde::{
    de::{self, Deserializer},
    Deserialize, Serialize, Serializer,
};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// JSON RPC supported version.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Version {
    /// Version 2.0 of the JSON RPC specification.
    #[default]
    #[serde(rename = "2.0")]
    V2,
}

/// Request and response ID.
///
/// Note that `u32` is used. This is so it always fits in a `f64` and obeys the
/// "SHOULD NOT have fractional parts" rule from the specification. IDs are
/// assigned by the client, so responses never carry string IDs for requests
/// we sent.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct Id(pub u32);

impl Display for Id {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request object.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Request {
    pub jsonrpc: Version,
    pub id: Id,
    pub method: String,
    pub params: Vec<Value>,
}

/// Response object.
///
/// A `null` result is a valid result and is represented as
/// `Some(Value::Null)`, while a response without any `result` field has a
/// `result` of `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub jsonrpc: Version,
    pub result: Option<Value>,
    pub error: Option<Error>,
    pub id: Option<Id>,
}

impl Response {
    /// Creates a successful response.
    pub fn success(id: Id, result: Value) -> Self {
        Self {
            jsonrpc: Version::V2,
            result: Some(result),
            error: None,
            id: Some(id),
        }
    }

    /// Creates an error response.
    pub fn failure(id: Option<Id>, error: Error) -> Self {
        Self {
            jsonrpc: Version::V2,
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Returns the result carried by the response.
    pub fn into_result(self) -> Result<Value, crate::Error> {
        match (self.error, self.result) {
            (Some(error), _) => Err(crate::Error::Node(error)),
            (None, Some(result)) => Ok(result),
            (None, None) => Err(crate::Error::InvalidResponse(
                "response is missing a result".to_owned(),
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Response {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "lowercase")]
        enum Key {
            JsonRpc,
            Result,
            Error,
            Id,
            #[serde(other)]
            Other,
        }

        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = Response;

            fn expecting(&self, f: &mut Formatter) -> fmt::Result {
                f.write_str("JSON RPC response")
            }

            fn visit_map<V>(self, mut map: V) -> Result<Self::Value, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut jsonrpc = None;
                let mut result = None;
                let mut error = None;
                let mut id = None;

                while let Some(key) = map.next_key()? {
                    match key {
                        Key::JsonRpc => {
                            if jsonrpc.is_some() {
                                return Err(de::Error::duplicate_field("jsonrpc"));
                            }
                            jsonrpc = Some(map.next_value()?);
                        }
                        Key::Result => {
                            if result.is_some() {
                                return Err(de::Error::duplicate_field("result"));
                            }
                            result = Some(map.next_value::<Value>()?);
                        }
                        Key::Error => {
                            if error.is_some() {
                                return Err(de::Error::duplicate_field("error"));
                            }
                            error = map.next_value::<Option<Error>>()?;
                        }
                        Key::Id => {
                            if id.is_some() {
                                return Err(de::Error::duplicate_field("id"));
                            }
                            id = Some(map.next_value::<Option<Id>>()?);
                        }
                        Key::Other => {
                            map.next_value::<de::IgnoredAny>()?;
                        }
                    }
                }

                Ok(Response {
                    jsonrpc: jsonrpc.ok_or_else(|| de::Error::missing_field("jsonrpc"))?,
                    result,
                    error,
                    id: id.flatten(),
                })
            }
        }

        deserializer.deserialize_struct(
            "Response",
            &["jsonrpc", "result", "error", "id"],
            Visitor,
        )
    }
}

impl Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Response<'a> {
            jsonrpc: Version,
            id: Option<Id>,
            #[serde(skip_serializing_if = "Option::is_none")]
            result: Option<&'a Value>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a Error>,
        }

        Response {
            jsonrpc: self.jsonrpc,
            id: self.id,
            result: self.result.as_ref(),
            error: self.error.as_ref(),
        }
        .serialize(serializer)
    }
}

/// A subscription notification pushed by the node.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Notification {
    pub jsonrpc: Version,
    /// The subscription method, for example `eth_subscription`.
    pub method: String,
    pub params: SubscriptionItem,
}

/// The parameters of a subscription notification.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SubscriptionItem {
    /// The subscription ID returned by the `*_subscribe` call.
    pub subscription: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
}

/// Any message a node may send.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Message {
    Notification(Notification),
    Batch(Vec<Response>),
    Response(Response),
}

/// An RPC error that may be produced on a response.
#[derive(Clone, Debug, Deserialize, Error, PartialEq, Serialize)]
#[error("{code}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

/// An error code.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(from = "i32", into = "i32")]
pub enum ErrorCode {
    #[error("parse error")]
    ParseError,
    #[error("invalid request")]
    InvalidRequest,
    #[error("method not found")]
    MethodNotFound,
    #[error("invalid params")]
    InvalidParams,
    #[error("internal error")]
    InternalError,
    #[error("server error ({0})")]
    ServerError(i32),
    #[error("reserved ({0})")]
    Reserved(i32),
    #[error("{0}")]
    Other(i32),
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        #[allow(clippy::match_overlapping_arm)]
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            -32099..=-32000 => Self::ServerError(code),
            -32768..=-32000 => Self::Reserved(code),
            _ => Self::Other(code),
        }
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::ServerError(code) => code,
            ErrorCode::Reserved(code) => code,
            ErrorCode::Other(code) => code,
        }
    }
}
