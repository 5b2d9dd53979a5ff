//! Transaction Module
//!
//! Builds, encodes and decodes transactions, and ties them to the sign-mode
//! handlers through [`TxConfig`].

pub mod builder;
pub mod config;
pub mod encoder;
pub mod options;
pub mod signature;

pub use builder::{SdkTx, TxBuilder, WrappedTx, MAX_GAS_WANTED, MAX_MEMO_CHARACTERS};
pub use config::TxConfig;
pub use encoder::{
    JsonTxDecoder, JsonTxEncoder, ProtoTxDecoder, ProtoTxEncoder, TxDecoder, TxEncoder,
};
pub use options::{
    new_signing_handler_map, ConfigOptions, ResolvedConfig, TxConfigSettings, DEFAULT_SIGN_MODES,
};
pub use signature::{SignatureData, SignatureV2};
