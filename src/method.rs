//! Module containing concept of a typed Ethereum RPC method.

use crate::{descriptor::Descriptor, Error};
use serde::{Deserializer, Serializer};
use serde_json::Value;
use std::borrow::Cow;

/// A trait defining a typed Ethereum RPC method.
///
/// Typed methods bypass the formatting hooks of the standard descriptors:
/// parameters and results are converted with serde instead.
pub trait Method {
    type Params;
    type Result;

    fn name(&self) -> Cow<'static, str>;

    fn serialize_params<S>(value: &Self::Params, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer;

    fn deserialize_result<'de, D>(deserializer: D) -> Result<Self::Result, D::Error>
    where
        D: Deserializer<'de>;
}

/// Returns the descriptor used to execute a typed method.
pub(crate) fn descriptor<M>(method: &M) -> Descriptor
where
    M: Method,
{
    Descriptor::passthrough(method.name())
}

/// Serializes typed parameters to a JSON parameter list.
pub(crate) fn params<M>(params: &M::Params) -> Result<Vec<Value>, Error>
where
    M: Method,
{
    match M::serialize_params(params, serde_json::value::Serializer)? {
        Value::Array(params) => Ok(params),
        value => Err(Error::Argument(format!(
            "parameters must serialize to a JSON array, got {value}"
        ))),
    }
}

/// Deserializes a raw JSON result.
pub(crate) fn result<M>(value: Value) -> Result<M::Result, Error>
where
    M: Method,
{
    Ok(M::deserialize_result(value)?)
}

#[macro_export]
macro_rules! method {
    (
        $(#[$attr:meta])*
        $pub:vis struct $type:ident as $name:literal $params:ty => $result:ty;
    ) => {
        $crate::method! {
            $(#[$attr])* $pub struct $type as $name
                $params [<$params>] => $result [<$result>];
        }
    };

    (
        $(#[$attr:meta])*
        $pub:vis struct $type:ident as $name:literal
            $params:ty => $result:ty [$($resultas:tt)*];
    ) => {
        $crate::method! {
            $(#[$attr])* $pub struct $type as $name
                $params [<$params>] => $result [$($resultas)*];
        }
    };

    (
        $(#[$attr:meta])*
        $pub:vis struct $type:ident as $name:literal
            $params:ty [$($paramsas:tt)*] => $result:ty;
    ) => {
        $crate::method! {
            $(#[$attr])* $pub struct $type as $name
                $params [$($paramsas)*] => $result [<$result>];
        }
    };

    (
        $(#[$attr:meta])*
        $pub:vis struct $type:ident as $name:literal
            $params:ty [$($paramsas:tt)*] => $result:ty [$($resultas:tt)*];
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Default)]
        $pub struct $type;

        impl ::std::fmt::Debug for $type {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                f.debug_tuple(stringify!($type))
                    .field(&$name)
                    .finish()
            }
        }

        #[allow(unused_imports)]
        impl $crate::method::Method for $type {
            type Params = $params;
            type Result = $result;

            fn name(&self) -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed($name)
            }

            fn serialize_params<S>(value: &Self::Params, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                use ::serde::Serialize as _;
                $($paramsas)*::serialize(value, serializer)
            }

            fn deserialize_result<'de, D>(deserializer: D) -> Result<Self::Result, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                use ::serde::Deserialize as _;
                $($resultas)*::deserialize(deserializer)
            }
        }
    };
}

#[macro_export]
macro_rules! module {
    (
        $(#[$attr:meta])*
        $pub:vis mod $mod:ident {
            $(
                $(#[$ma:meta])*
                $mv:vis struct $mt:ident as $mn:literal
                    $mp:ty $([$($mpp:tt)*])? => $mr:ty $([$($mrr:tt)*])?;
            )*
        }
    ) => {
        $(#[$attr])*
        $pub mod $mod {
            #[allow(unused_imports)]
            use super::*;

            $(
                $crate::method! {
                    $(#[$ma])* $mv struct $mt as $mn
                        $mp $([$($mpp)*])* => $mr $([$($mrr)*])*;
                }
            )*
        }
    };
}
