//! Shared types for sign-mode handling
//!
//! Data structures that cross module boundaries: the sign mode identifier,
//! per-signer metadata and the transaction view handed to handlers.

use std::fmt;
use std::str::FromStr;

use prost::Message;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{TxSignError, TxSignResult};
use crate::proto::{Any, AuthInfo, TxBody};

// =============================================================================
// Sign Mode
// =============================================================================

/// A named convention for deriving the bytes that get signed.
///
/// The wire value is an `i32`. Values without a built-in variant are carried
/// as [`SignMode::Custom`], which is how externally registered modes
/// (for example EIP-191) are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignMode {
    /// Unknown signing mode; always rejected.
    Unspecified,
    /// Protobuf `SignDoc` over the transmitted body and auth-info bytes.
    Direct,
    /// Human-readable rendering for constrained signing devices.
    Textual,
    /// `SignDocDirectAux` for auxiliary signers who do not know the fee.
    DirectAux,
    /// Historical sorted-key JSON `StdSignDoc`.
    LegacyAminoJson,
    /// Any other wire value.
    Custom(i32),
}

impl SignMode {
    /// Wire value of `SIGN_MODE_EIP_191`, which has no built-in handler.
    pub const EIP_191: i32 = 191;

    /// Map a wire value to a sign mode. Built-in values never become `Custom`.
    pub const fn from_i32(value: i32) -> Self {
        match value {
            0 => SignMode::Unspecified,
            1 => SignMode::Direct,
            2 => SignMode::Textual,
            3 => SignMode::DirectAux,
            127 => SignMode::LegacyAminoJson,
            other => SignMode::Custom(other),
        }
    }

    /// Construct a custom mode, normalizing built-in wire values.
    pub const fn custom(value: i32) -> Self {
        Self::from_i32(value)
    }

    pub const fn as_i32(self) -> i32 {
        match self {
            SignMode::Unspecified => 0,
            SignMode::Direct => 1,
            SignMode::Textual => 2,
            SignMode::DirectAux => 3,
            SignMode::LegacyAminoJson => 127,
            SignMode::Custom(value) => value,
        }
    }

    /// Protobuf enum name, when the wire value has one
    pub const fn as_str_name(self) -> Option<&'static str> {
        match self {
            SignMode::Unspecified => Some("SIGN_MODE_UNSPECIFIED"),
            SignMode::Direct => Some("SIGN_MODE_DIRECT"),
            SignMode::Textual => Some("SIGN_MODE_TEXTUAL"),
            SignMode::DirectAux => Some("SIGN_MODE_DIRECT_AUX"),
            SignMode::LegacyAminoJson => Some("SIGN_MODE_LEGACY_AMINO_JSON"),
            SignMode::Custom(Self::EIP_191) => Some("SIGN_MODE_EIP_191"),
            SignMode::Custom(_) => None,
        }
    }

    /// Parse a protobuf enum name.
    ///
    /// The `SIGN_MODE_` prefix is optional and case is ignored, so
    /// `"direct"`, `"legacy_amino_json"` and `"SIGN_MODE_TEXTUAL"` all parse.
    pub fn from_str_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase().replace('-', "_");
        let short = upper.strip_prefix("SIGN_MODE_").unwrap_or(&upper);
        match short {
            "UNSPECIFIED" => Some(SignMode::Unspecified),
            "DIRECT" => Some(SignMode::Direct),
            "TEXTUAL" => Some(SignMode::Textual),
            "DIRECT_AUX" => Some(SignMode::DirectAux),
            "LEGACY_AMINO_JSON" | "AMINO_JSON" => Some(SignMode::LegacyAminoJson),
            "EIP_191" => Some(SignMode::Custom(Self::EIP_191)),
            _ => None,
        }
    }
}

impl fmt::Display for SignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "SIGN_MODE_CUSTOM({})", self.as_i32()),
        }
    }
}

impl FromStr for SignMode {
    type Err = TxSignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(mode) = SignMode::from_str_name(s) {
            return Ok(mode);
        }
        s.trim()
            .parse::<i32>()
            .map(SignMode::from_i32)
            .map_err(|_| TxSignError::malformed(format!("unknown sign mode '{}'", s)))
    }
}

impl From<i32> for SignMode {
    fn from(value: i32) -> Self {
        SignMode::from_i32(value)
    }
}

impl From<SignMode> for i32 {
    fn from(mode: SignMode) -> Self {
        mode.as_i32()
    }
}

impl Serialize for SignMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_str_name() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_i32(self.as_i32()),
        }
    }
}

impl<'de> Deserialize<'de> for SignMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum NameOrNumber {
            Name(String),
            Number(i32),
        }

        match NameOrNumber::deserialize(deserializer)? {
            NameOrNumber::Name(name) => name.parse().map_err(serde::de::Error::custom),
            NameOrNumber::Number(value) => Ok(SignMode::from_i32(value)),
        }
    }
}

// =============================================================================
// Signer Data
// =============================================================================

/// Per-signer context needed to compute sign bytes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignerData {
    /// Display-encoded (bech32) address of the signer
    pub address: String,
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    /// Public key of the signer, if known
    pub pub_key: Option<Any>,
}

impl SignerData {
    pub fn new(address: impl Into<String>, chain_id: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            chain_id: chain_id.into(),
            ..Default::default()
        }
    }

    pub fn with_account_number(mut self, account_number: u64) -> Self {
        self.account_number = account_number;
        self
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_pub_key(mut self, pub_key: Any) -> Self {
        self.pub_key = Some(pub_key);
        self
    }
}

// =============================================================================
// Transaction Data
// =============================================================================

/// Transaction view handed to sign-mode handlers.
///
/// `body_bytes` and `auth_info_bytes` are the exact bytes that were (or will
/// be) transmitted. Handlers that sign raw bytes must use these and never
/// re-encode `body` or `auth_info`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxData {
    pub body: TxBody,
    pub auth_info: AuthInfo,
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
}

impl TxData {
    /// Build from transmitted bytes, decoding the structured view from them
    pub fn from_bytes(body_bytes: Vec<u8>, auth_info_bytes: Vec<u8>) -> TxSignResult<Self> {
        let body = TxBody::decode(body_bytes.as_slice())?;
        let auth_info = AuthInfo::decode(auth_info_bytes.as_slice())?;
        Ok(Self {
            body,
            auth_info,
            body_bytes,
            auth_info_bytes,
        })
    }

    /// Build from structured parts, encoding the bytes from them
    pub fn from_parts(body: TxBody, auth_info: AuthInfo) -> Self {
        let body_bytes = body.encode_to_vec();
        let auth_info_bytes = auth_info.encode_to_vec();
        Self {
            body,
            auth_info,
            body_bytes,
            auth_info_bytes,
        }
    }
}
