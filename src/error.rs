//! Unified error types for sign-mode handling
//!
//! Every failure in this crate is a [`TxSignError`]. Errors are always
//! returned to the caller; nothing here retries or swallows a failure.
//! Each variant maps onto a stable, serializable [`ErrorCode`] so embedders
//! can classify failures without matching on message text.

use serde::{Deserialize, Serialize};

use crate::types::SignMode;

/// Main error type for all signing, encoding and configuration operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TxSignError {
    /// A required dependency was missing when a component was constructed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No handler is registered for the requested sign mode.
    #[error("unsupported sign mode: {0}")]
    UnsupportedMode(SignMode),

    /// Signer or transaction data failed validation inside a handler.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A transaction object was not produced by this crate's builder.
    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// Serializing a wire structure failed.
    #[error("encoding error: {0}")]
    Encode(String),

    /// Deserializing a wire structure failed.
    #[error("decoding error: {0}")]
    Decode(String),

    /// An address string or byte sequence was rejected by an address codec.
    #[error("address error: {0}")]
    Address(String),

    /// The caller cancelled the signing context.
    #[error("operation cancelled")]
    Cancelled,

    /// The signing context deadline passed before the operation finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl TxSignError {
    // Convenience constructors
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn address(msg: impl Into<String>) -> Self {
        Self::Address(msg.into())
    }

    /// Classification code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration(_) => ErrorCode::Configuration,
            Self::UnsupportedMode(_) => ErrorCode::UnsupportedMode,
            Self::MalformedInput(_) => ErrorCode::MalformedInput,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::Encode(_) => ErrorCode::EncodeError,
            Self::Decode(_) => ErrorCode::DecodeError,
            Self::Address(_) => ErrorCode::InvalidAddress,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::DeadlineExceeded => ErrorCode::Timeout,
        }
    }

    /// Whether repeating the same call, unchanged, could succeed.
    ///
    /// Only context interruptions qualify; every other failure needs the
    /// caller to change its input or configuration first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Construction
    Configuration,
    UnsupportedMode,

    // Input
    MalformedInput,
    TypeMismatch,
    InvalidAddress,

    // Wire
    EncodeError,
    DecodeError,

    // Context
    Cancelled,
    Timeout,
}

/// Result type alias for sign-mode operations
pub type TxSignResult<T> = Result<T, TxSignError>;

// Conversions from common error types

impl From<prost::DecodeError> for TxSignError {
    fn from(e: prost::DecodeError) -> Self {
        TxSignError::Decode(e.to_string())
    }
}

impl From<prost::EncodeError> for TxSignError {
    fn from(e: prost::EncodeError) -> Self {
        TxSignError::Encode(e.to_string())
    }
}

impl From<serde_json::Error> for TxSignError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            TxSignError::Encode(e.to_string())
        } else {
            TxSignError::Decode(format!("JSON error: {}", e))
        }
    }
}

impl From<base64::DecodeError> for TxSignError {
    fn from(e: base64::DecodeError) -> Self {
        TxSignError::Decode(format!("base64 error: {}", e))
    }
}

impl From<bech32::Error> for TxSignError {
    fn from(e: bech32::Error) -> Self {
        TxSignError::Address(format!("bech32 error: {}", e))
    }
}
