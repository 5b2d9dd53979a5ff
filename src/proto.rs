//! Transaction wire types
//!
//! Protobuf messages for the transaction envelope and sign documents. Field
//! numbers are part of the wire contract and must never change. Every type
//! also derives serde for the JSON wire form: snake_case field names, 64-bit
//! integers as strings and bytes as base64.

use prost::Message;
use serde::{Deserialize, Serialize};

use crate::types::SignMode;

// =============================================================================
// Common
// =============================================================================

/// A type URL plus the protobuf encoding of a message of that type
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    #[serde(with = "crate::serde_bytes::base64_bytes")]
    pub value: Vec<u8>,
}

impl Any {
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }

    /// Pack a message under the given type URL
    pub fn pack<M: Message>(type_url: impl Into<String>, msg: &M) -> Self {
        Self::new(type_url, msg.encode_to_vec())
    }

    /// Type URL without the leading `/`, i.e. the message's full name
    pub fn full_name(&self) -> &str {
        self.type_url
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.type_url)
    }
}

/// An amount of a single denomination; the amount is a decimal integer string
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Coin {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(string, tag = "2")]
    pub amount: String,
}

impl Coin {
    pub fn new(amount: impl ToString, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.to_string(),
        }
    }
}

// =============================================================================
// Auth Info
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Fee {
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<Coin>,
    #[prost(uint64, tag = "2")]
    #[serde(with = "crate::serde_bytes::u64_string")]
    pub gas_limit: u64,
    /// Explicit fee payer address; empty means the first signer pays
    #[prost(string, tag = "3")]
    pub payer: String,
    #[prost(string, tag = "4")]
    pub granter: String,
}

/// Compact representation of which keys of a multisig signed
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactBitArray {
    #[prost(uint32, tag = "1")]
    pub extra_bits_stored: u32,
    #[prost(bytes = "vec", tag = "2")]
    #[serde(with = "crate::serde_bytes::base64_bytes")]
    pub elems: Vec<u8>,
}

impl CompactBitArray {
    /// A zeroed bit array holding `bits` bits
    pub fn new(bits: usize) -> Self {
        Self {
            extra_bits_stored: (bits % 8) as u32,
            elems: vec![0u8; bits.div_ceil(8)],
        }
    }

    /// Number of addressable bits; 0 when the wire fields are inconsistent
    pub fn len(&self) -> usize {
        match self.extra_bits_stored {
            _ if self.elems.is_empty() => 0,
            0 => self.elems.len() * 8,
            extra if extra < 8 => (self.elems.len() - 1) * 8 + extra as usize,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        self.elems
            .get(index >> 3)
            .is_some_and(|byte| byte & (1 << (7 - (index % 8))) != 0)
    }

    /// Set a bit; returns false when the index is out of range
    pub fn set(&mut self, index: usize, value: bool) -> bool {
        if index >= self.len() {
            return false;
        }
        let Some(byte) = self.elems.get_mut(index >> 3) else {
            return false;
        };
        let mask = 1 << (7 - (index % 8));
        if value {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
        true
    }
}

/// How a signer produced its signature
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(from = "ModeInfoJson", into = "ModeInfoJson")]
pub struct ModeInfo {
    #[prost(oneof = "mode_info::Sum", tags = "1, 2")]
    pub sum: Option<mode_info::Sum>,
}

/// Nested message and enum types in `ModeInfo`.
pub mod mode_info {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Single {
        #[prost(int32, tag = "1")]
        #[serde(with = "crate::serde_bytes::sign_mode")]
        pub mode: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Multi {
        #[prost(message, optional, tag = "1")]
        pub bitarray: Option<super::CompactBitArray>,
        #[prost(message, repeated, tag = "2")]
        pub mode_infos: Vec<super::ModeInfo>,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Sum {
        #[prost(message, tag = "1")]
        Single(Single),
        #[prost(message, tag = "2")]
        Multi(Multi),
    }
}

impl ModeInfo {
    pub fn single(mode: SignMode) -> Self {
        Self {
            sum: Some(mode_info::Sum::Single(mode_info::Single {
                mode: mode.as_i32(),
            })),
        }
    }

    pub fn multi(bitarray: CompactBitArray, mode_infos: Vec<ModeInfo>) -> Self {
        Self {
            sum: Some(mode_info::Sum::Multi(mode_info::Multi {
                bitarray: Some(bitarray),
                mode_infos,
            })),
        }
    }

    /// Sign mode of a single signer, if this is single-signer info
    pub fn single_mode(&self) -> Option<SignMode> {
        match &self.sum {
            Some(mode_info::Sum::Single(single)) => Some(SignMode::from_i32(single.mode)),
            _ => None,
        }
    }
}

/// JSON shape of `ModeInfo`: exactly one of `single` or `multi` is present
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ModeInfoJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    single: Option<mode_info::Single>,
    #[serde(skip_serializing_if = "Option::is_none")]
    multi: Option<mode_info::Multi>,
}

impl From<ModeInfoJson> for ModeInfo {
    fn from(json: ModeInfoJson) -> Self {
        let sum = match (json.single, json.multi) {
            (Some(single), _) => Some(mode_info::Sum::Single(single)),
            (None, Some(multi)) => Some(mode_info::Sum::Multi(multi)),
            (None, None) => None,
        };
        Self { sum }
    }
}

impl From<ModeInfo> for ModeInfoJson {
    fn from(info: ModeInfo) -> Self {
        match info.sum {
            Some(mode_info::Sum::Single(single)) => Self {
                single: Some(single),
                multi: None,
            },
            Some(mode_info::Sum::Multi(multi)) => Self {
                single: None,
                multi: Some(multi),
            },
            None => Self::default(),
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerInfo {
    #[prost(message, optional, tag = "1")]
    pub public_key: Option<Any>,
    #[prost(message, optional, tag = "2")]
    pub mode_info: Option<ModeInfo>,
    #[prost(uint64, tag = "3")]
    #[serde(with = "crate::serde_bytes::u64_string")]
    pub sequence: u64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthInfo {
    #[prost(message, repeated, tag = "1")]
    pub signer_infos: Vec<SignerInfo>,
    #[prost(message, optional, tag = "2")]
    pub fee: Option<Fee>,
}

// =============================================================================
// Body and Envelope
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct TxBody {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
    #[prost(string, tag = "2")]
    pub memo: String,
    #[prost(uint64, tag = "3")]
    #[serde(with = "crate::serde_bytes::u64_string")]
    pub timeout_height: u64,
    #[prost(message, repeated, tag = "1023")]
    pub extension_options: Vec<Any>,
    #[prost(message, repeated, tag = "2047")]
    pub non_critical_extension_options: Vec<Any>,
}

/// Decoded transaction, the shape of the JSON wire form
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Tx {
    #[prost(message, optional, tag = "1")]
    pub body: Option<TxBody>,
    #[prost(message, optional, tag = "2")]
    pub auth_info: Option<AuthInfo>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    #[serde(with = "crate::serde_bytes::base64_vec")]
    pub signatures: Vec<Vec<u8>>,
}

/// Transmitted transaction: body and auth info as the exact signed bytes
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct TxRaw {
    #[prost(bytes = "vec", tag = "1")]
    #[serde(with = "crate::serde_bytes::base64_bytes")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    #[serde(with = "crate::serde_bytes::base64_bytes")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    #[serde(with = "crate::serde_bytes::base64_vec")]
    pub signatures: Vec<Vec<u8>>,
}

// =============================================================================
// Sign Documents
// =============================================================================

/// Document signed in `SIGN_MODE_DIRECT`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct SignDoc {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(string, tag = "3")]
    pub chain_id: String,
    #[prost(uint64, tag = "4")]
    pub account_number: u64,
}

/// Document signed in `SIGN_MODE_DIRECT_AUX`; carries no fee information
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct SignDocDirectAux {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub public_key: Option<Any>,
    #[prost(string, tag = "3")]
    pub chain_id: String,
    #[prost(uint64, tag = "4")]
    pub account_number: u64,
    #[prost(uint64, tag = "5")]
    pub sequence: u64,
}

/// Raw signature payload of a multisig signer
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct MultiSignature {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub signatures: Vec<Vec<u8>>,
}
