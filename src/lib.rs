//! Transaction Sign-Mode Library
//!
//! Computes the canonical bytes a signer signs for Cosmos-style
//! transactions, under several sign modes, and provides the transaction
//! builder and wire encoders around them.
//!
//! # Architecture
//!
//! This crate provides:
//! - **signing**: Sign-mode handlers (direct, direct aux, legacy amino JSON,
//!   textual), the handler registry and the mode-to-handler map
//! - **tx**: Configuration options, the `TxConfig` facade, the transaction
//!   builder and the binary/JSON encoders
//! - **proto**: Protobuf wire types for transactions and sign documents
//! - **address**: Bech32 address codecs and process-wide prefix config
//!
//! # Determinism
//!
//! Sign bytes must be identical for identical inputs, on every call and
//! every node. Handlers never re-encode transmitted bytes they sign over.
//!
//! # Example
//!
//! ```rust,ignore
//! use tx_signmode::{ConfigOptions, SignContext, SignMode, SignerData, TxConfig};
//! use tx_signmode::address::AddressPrefixes;
//!
//! let config = TxConfig::with_options(
//!     ConfigOptions::new()
//!         .with_enabled_sign_modes([SignMode::Direct, SignMode::LegacyAminoJson])
//!         .with_address_prefixes(AddressPrefixes::default()),
//! )?;
//!
//! let mut builder = config.new_tx_builder();
//! builder.set_msgs(msgs).set_fee_amount(fee).set_gas_limit(200_000);
//! let tx = builder.get_tx();
//!
//! let signer = SignerData::new(address, "cosmoshub-4").with_sequence(0);
//! let sign_bytes = config.sign_bytes(SignMode::Direct, &SignContext::background(), &signer, &tx)?;
//! ```

pub mod address;
pub mod error;
pub mod proto;
pub mod serde_bytes;
pub mod signing;
pub mod tx;
pub mod types;
pub mod utils;

// Re-export key types for convenience
pub use error::{ErrorCode, TxSignError, TxSignResult};
pub use types::{SignMode, SignerData, TxData};

pub use signing::{
    HandlerMap, HandlerRegistry, SignContext, SignModeHandler, SigningContext, SigningOptions,
};
pub use tx::{
    ConfigOptions, SignatureData, SignatureV2, TxBuilder, TxConfig, TxConfigSettings, WrappedTx,
};
