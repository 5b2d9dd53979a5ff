//! Transaction encoders and decoders
//!
//! Two wire forms are supported:
//!
//! - binary: the protobuf encoding of `TxRaw`. Decoding keeps the body and
//!   auth-info bytes exactly as received.
//! - JSON: `{"body":..,"auth_info":..,"signatures":[..]}` with 64-bit
//!   integers as strings and bytes as base64. Decoding re-derives the body
//!   and auth-info bytes by protobuf encoding.

use prost::Message;

use crate::error::TxSignResult;
use crate::proto::{Tx, TxRaw};
use crate::tx::builder::{downcast_tx, SdkTx, WrappedTx};

pub trait TxEncoder: Send + Sync {
    /// # Errors
    ///
    /// Returns [`TxSignError::TypeMismatch`](crate::error::TxSignError::TypeMismatch)
    /// when `tx` was not produced by this crate.
    fn encode(&self, tx: &dyn SdkTx) -> TxSignResult<Vec<u8>>;
}

pub trait TxDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> TxSignResult<WrappedTx>;
}

/// Binary `TxRaw` encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtoTxEncoder;

impl TxEncoder for ProtoTxEncoder {
    fn encode(&self, tx: &dyn SdkTx) -> TxSignResult<Vec<u8>> {
        let tx = downcast_tx(tx)?;
        Ok(tx.to_tx_raw().encode_to_vec())
    }
}

/// Binary `TxRaw` decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtoTxDecoder;

impl TxDecoder for ProtoTxDecoder {
    fn decode(&self, bytes: &[u8]) -> TxSignResult<WrappedTx> {
        let raw = TxRaw::decode(bytes)?;
        WrappedTx::from_raw(raw)
    }
}

/// JSON `Tx` encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTxEncoder;

impl TxEncoder for JsonTxEncoder {
    fn encode(&self, tx: &dyn SdkTx) -> TxSignResult<Vec<u8>> {
        let tx = downcast_tx(tx)?;
        Ok(serde_json::to_vec(&tx.to_tx())?)
    }
}

/// JSON `Tx` decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTxDecoder;

impl TxDecoder for JsonTxDecoder {
    fn decode(&self, bytes: &[u8]) -> TxSignResult<WrappedTx> {
        let tx: Tx = serde_json::from_slice(bytes)?;
        Ok(WrappedTx::from_tx(tx))
    }
}
