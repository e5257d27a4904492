//! JSON serialization helpers for `0x`-prefixed hex data.

use serde::{de, ser::SerializeSeq as _, Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;

/// Encodes bytes as a `0x`-prefixed lowercase hex string.
pub fn encode(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decodes a `0x`-prefixed hex string.
pub fn decode<E>(s: &str) -> Result<Vec<u8>, E>
where
    E: de::Error,
{
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| E::custom("bytes missing '0x' prefix"))?;
    hex::decode(digits).map_err(E::custom)
}

/// Serialize a `[u8]`.
pub mod bytes {
    use super::*;

    #[doc(hidden)]
    pub fn serialize<T, S>(value: T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        encode(value.as_ref()).serialize(serializer)
    }

    #[doc(hidden)]
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: From<Vec<u8>>,
        D: Deserializer<'de>,
    {
        Ok(decode(&Cow::<str>::deserialize(deserializer)?)?.into())
    }
}

/// Serialize an `Option<[u8]>`.
pub mod option_bytes {
    use super::*;

    #[doc(hidden)]
    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_some(&encode(value.as_ref())),
            None => serializer.serialize_none(),
        }
    }

    #[doc(hidden)]
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: From<Vec<u8>>,
        D: Deserializer<'de>,
    {
        Option::<Cow<str>>::deserialize(deserializer)?
            .map(|hex| decode(&hex).map(T::from))
            .transpose()
    }
}

/// Serialize a single-element `(Vec<u8>,)` parameter list as `["0x..."]`.
pub mod bytes_param {
    use super::*;

    #[doc(hidden)]
    pub fn serialize<S>(value: &(Vec<u8>,), serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(1))?;
        seq.serialize_element(&encode(&value.0))?;
        seq.end()
    }
}
