//! Transaction Builder
//!
//! [`TxBuilder`] stages a transaction: messages, memo, fee, timeout and
//! signatures. It caches the protobuf encodings of the body and auth info so
//! that repeated [`TxBuilder::get_tx`] calls produce byte-identical output;
//! every setter drops the cache it affects.
//!
//! [`WrappedTx`] is the finalized, immutable transaction. It always carries
//! the exact body and auth-info bytes that are transmitted and signed, even
//! when it was decoded from bytes that a fresh encoding would not reproduce.

use std::fmt;

use prost::Message;

use crate::error::{TxSignError, TxSignResult};
use crate::proto::{Any, AuthInfo, Coin, Fee, Tx, TxBody, TxRaw};
use crate::tx::signature::SignatureV2;
use crate::types::TxData;

/// Longest memo, in characters, accepted by [`WrappedTx::validate_basic`]
pub const MAX_MEMO_CHARACTERS: usize = 256;

/// Largest gas limit accepted by [`WrappedTx::validate_basic`]
pub const MAX_GAS_WANTED: u64 = i64::MAX as u64;

// =============================================================================
// Transaction Trait
// =============================================================================

/// A transaction object handed to encoders and to
/// [`TxConfig::wrap_tx_builder`](crate::tx::TxConfig::wrap_tx_builder).
///
/// Only [`WrappedTx`] can be encoded or wrapped; other implementations are
/// rejected with [`TxSignError::TypeMismatch`].
pub trait SdkTx: Send + Sync + fmt::Debug + 'static {
    fn get_msgs(&self) -> &[Any];

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn as_any(&self) -> &dyn std::any::Any;

    fn into_any(self: Box<Self>) -> Box<dyn std::any::Any>;
}

/// Borrow `tx` as a [`WrappedTx`], failing for foreign implementations
pub(crate) fn downcast_tx(tx: &dyn SdkTx) -> TxSignResult<&WrappedTx> {
    tx.as_any()
        .downcast_ref::<WrappedTx>()
        .ok_or_else(|| type_mismatch(tx))
}

pub(crate) fn type_mismatch(tx: &dyn SdkTx) -> TxSignError {
    TxSignError::TypeMismatch {
        expected: std::any::type_name::<WrappedTx>(),
        found: tx.type_name().to_string(),
    }
}

// =============================================================================
// Wrapped Transaction
// =============================================================================

/// A finalized transaction together with its transmitted bytes
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedTx {
    body: TxBody,
    auth_info: AuthInfo,
    signatures: Vec<Vec<u8>>,
    body_bytes: Vec<u8>,
    auth_info_bytes: Vec<u8>,
}

impl WrappedTx {
    /// Decode from a [`TxRaw`], keeping its body and auth-info bytes as-is
    pub fn from_raw(raw: TxRaw) -> TxSignResult<Self> {
        let body = TxBody::decode(raw.body_bytes.as_slice())?;
        let auth_info = AuthInfo::decode(raw.auth_info_bytes.as_slice())?;
        Ok(Self {
            body,
            auth_info,
            signatures: raw.signatures,
            body_bytes: raw.body_bytes,
            auth_info_bytes: raw.auth_info_bytes,
        })
    }

    /// Build from a structured [`Tx`], deriving the bytes by encoding it
    pub fn from_tx(tx: Tx) -> Self {
        let body = tx.body.unwrap_or_default();
        let auth_info = tx.auth_info.unwrap_or_default();
        Self {
            body_bytes: body.encode_to_vec(),
            auth_info_bytes: auth_info.encode_to_vec(),
            body,
            auth_info,
            signatures: tx.signatures,
        }
    }

    pub fn body(&self) -> &TxBody {
        &self.body
    }

    pub fn auth_info(&self) -> &AuthInfo {
        &self.auth_info
    }

    /// Raw signatures, positionally aligned with the signer infos
    pub fn signatures(&self) -> &[Vec<u8>] {
        &self.signatures
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body_bytes
    }

    pub fn auth_info_bytes(&self) -> &[u8] {
        &self.auth_info_bytes
    }

    pub fn memo(&self) -> &str {
        &self.body.memo
    }

    pub fn timeout_height(&self) -> u64 {
        self.body.timeout_height
    }

    pub fn fee(&self) -> Option<&Fee> {
        self.auth_info.fee.as_ref()
    }

    pub fn gas(&self) -> u64 {
        self.fee().map_or(0, |fee| fee.gas_limit)
    }

    pub fn fee_amount(&self) -> &[Coin] {
        self.fee()
            .map(|fee| fee.amount.as_slice())
            .unwrap_or_default()
    }

    pub fn fee_payer(&self) -> Option<&str> {
        self.fee()
            .map(|fee| fee.payer.as_str())
            .filter(|payer| !payer.is_empty())
    }

    pub fn fee_granter(&self) -> Option<&str> {
        self.fee()
            .map(|fee| fee.granter.as_str())
            .filter(|granter| !granter.is_empty())
    }

    /// The view handed to sign-mode handlers
    pub fn signing_data(&self) -> TxData {
        TxData {
            body: self.body.clone(),
            auth_info: self.auth_info.clone(),
            body_bytes: self.body_bytes.clone(),
            auth_info_bytes: self.auth_info_bytes.clone(),
        }
    }

    /// Structured signatures rebuilt from signer infos and raw signatures
    pub fn get_signatures_v2(&self) -> TxSignResult<Vec<SignatureV2>> {
        self.check_alignment()?;
        self.auth_info
            .signer_infos
            .iter()
            .zip(&self.signatures)
            .map(|(info, sig)| SignatureV2::from_signer_info(info, sig.clone()))
            .collect()
    }

    pub fn to_tx_raw(&self) -> TxRaw {
        TxRaw {
            body_bytes: self.body_bytes.clone(),
            auth_info_bytes: self.auth_info_bytes.clone(),
            signatures: self.signatures.clone(),
        }
    }

    pub fn to_tx(&self) -> Tx {
        Tx {
            body: Some(self.body.clone()),
            auth_info: Some(self.auth_info.clone()),
            signatures: self.signatures.clone(),
        }
    }

    /// Stateless checks run before a transaction is broadcast
    ///
    /// # Errors
    ///
    /// Returns [`TxSignError::MalformedInput`] describing the first failed
    /// check.
    pub fn validate_basic(&self) -> TxSignResult<()> {
        let fee = self
            .fee()
            .ok_or_else(|| TxSignError::malformed("missing fee"))?;

        if fee.gas_limit > MAX_GAS_WANTED {
            return Err(TxSignError::malformed(format!(
                "invalid gas supplied; {} > {}",
                fee.gas_limit, MAX_GAS_WANTED
            )));
        }

        for coin in &fee.amount {
            let valid_amount =
                !coin.amount.is_empty() && coin.amount.bytes().all(|b| b.is_ascii_digit());
            if !valid_amount || coin.denom.is_empty() {
                return Err(TxSignError::malformed(format!(
                    "invalid fee coin: {}{}",
                    coin.amount, coin.denom
                )));
            }
        }

        let memo_len = self.body.memo.chars().count();
        if memo_len > MAX_MEMO_CHARACTERS {
            return Err(TxSignError::malformed(format!(
                "maximum number of characters is {} but received {} characters",
                MAX_MEMO_CHARACTERS, memo_len
            )));
        }

        if self.signatures.is_empty() {
            return Err(TxSignError::malformed("no signatures supplied"));
        }
        self.check_alignment()
    }

    fn check_alignment(&self) -> TxSignResult<()> {
        let infos = self.auth_info.signer_infos.len();
        if infos != self.signatures.len() {
            return Err(TxSignError::malformed(format!(
                "wrong number of signers; expected {}, got {}",
                infos,
                self.signatures.len()
            )));
        }
        Ok(())
    }
}

impl SdkTx for WrappedTx {
    fn get_msgs(&self) -> &[Any] {
        &self.body.messages
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> {
        self
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Mutable staging area for a transaction
#[derive(Debug, Clone, Default)]
pub struct TxBuilder {
    body: TxBody,
    auth_info: AuthInfo,
    signatures: Vec<Vec<u8>>,
    body_bytes: Option<Vec<u8>>,
    auth_info_bytes: Option<Vec<u8>>,
}

impl TxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(&self) -> &TxBody {
        &self.body
    }

    pub fn auth_info(&self) -> &AuthInfo {
        &self.auth_info
    }

    pub fn set_msgs(&mut self, msgs: Vec<Any>) -> &mut Self {
        self.body.messages = msgs;
        self.body_bytes = None;
        self
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) -> &mut Self {
        self.body.memo = memo.into();
        self.body_bytes = None;
        self
    }

    pub fn set_timeout_height(&mut self, height: u64) -> &mut Self {
        self.body.timeout_height = height;
        self.body_bytes = None;
        self
    }

    pub fn set_extension_options(&mut self, options: Vec<Any>) -> &mut Self {
        self.body.extension_options = options;
        self.body_bytes = None;
        self
    }

    pub fn set_non_critical_extension_options(&mut self, options: Vec<Any>) -> &mut Self {
        self.body.non_critical_extension_options = options;
        self.body_bytes = None;
        self
    }

    pub fn set_fee_amount(&mut self, amount: Vec<Coin>) -> &mut Self {
        self.fee_mut().amount = amount;
        self
    }

    pub fn set_gas_limit(&mut self, gas_limit: u64) -> &mut Self {
        self.fee_mut().gas_limit = gas_limit;
        self
    }

    pub fn set_fee_payer(&mut self, payer: impl Into<String>) -> &mut Self {
        self.fee_mut().payer = payer.into();
        self
    }

    pub fn set_fee_granter(&mut self, granter: impl Into<String>) -> &mut Self {
        self.fee_mut().granter = granter.into();
        self
    }

    /// Replace signer infos and raw signatures together, position by position
    pub fn set_signatures(&mut self, signatures: Vec<SignatureV2>) -> &mut Self {
        let (infos, raw): (Vec<_>, Vec<_>) =
            signatures.iter().map(SignatureV2::to_signer_info).unzip();
        self.auth_info.signer_infos = infos;
        self.signatures = raw;
        self.auth_info_bytes = None;
        self
    }

    fn fee_mut(&mut self) -> &mut Fee {
        self.auth_info_bytes = None;
        self.auth_info.fee.get_or_insert_with(Fee::default)
    }

    /// Finalize into a [`WrappedTx`], encoding whatever is not cached
    pub fn get_tx(&mut self) -> WrappedTx {
        let body_bytes = self
            .body_bytes
            .get_or_insert_with(|| self.body.encode_to_vec())
            .clone();
        let auth_info_bytes = self
            .auth_info_bytes
            .get_or_insert_with(|| self.auth_info.encode_to_vec())
            .clone();
        WrappedTx {
            body: self.body.clone(),
            auth_info: self.auth_info.clone(),
            signatures: self.signatures.clone(),
            body_bytes,
            auth_info_bytes,
        }
    }
}

impl From<WrappedTx> for TxBuilder {
    /// Continue from a finalized transaction, keeping its bytes until a
    /// setter invalidates them
    fn from(tx: WrappedTx) -> Self {
        Self {
            body: tx.body,
            auth_info: tx.auth_info,
            signatures: tx.signatures,
            body_bytes: Some(tx.body_bytes),
            auth_info_bytes: Some(tx.auth_info_bytes),
        }
    }
}
