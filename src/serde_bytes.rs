//! Serde helpers for wire-format JSON
//!
//! Provides the JSON conventions used by transaction documents that serde
//! does not follow out of the box: byte strings as base64, 64-bit integers
//! as decimal strings, and sign modes as protobuf enum names.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serializer};

/// Serialize/deserialize `Vec<u8>` as a standard base64 string
pub mod base64_bytes {
    use super::*;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// Serialize/deserialize `Vec<Vec<u8>>` as an array of base64 strings
pub mod base64_vec {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&STANDARD.encode(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
        items
            .iter()
            .map(|s| STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Serialize `u64` as a decimal string; accept a string or a number
pub mod u64_string {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<StringOrNumber>::deserialize(deserializer)? {
            None => Ok(0),
            Some(StringOrNumber::Number(n)) => Ok(n),
            Some(StringOrNumber::String(s)) if s.is_empty() => Ok(0),
            Some(StringOrNumber::String(s)) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Serialize an `i32` sign-mode field by its protobuf name
pub mod sign_mode {
    use super::*;
    use crate::types::SignMode;
    use serde::Serialize;

    pub fn serialize<S>(value: &i32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        SignMode::from_i32(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i32, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(SignMode::deserialize(deserializer)?.as_i32())
    }
}
