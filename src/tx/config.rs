//! TxConfig facade
//!
//! [`TxConfig`] bundles the sign-mode [`HandlerMap`] with the binary and JSON
//! transaction encoders and decoders, and hands out [`TxBuilder`]s. It is
//! immutable once built and can be shared across threads.
//!
//! # Example
//!
//! ```ignore
//! use tx_signmode::tx::{ConfigOptions, TxConfig};
//! use tx_signmode::address::AddressPrefixes;
//!
//! let config = TxConfig::with_options(
//!     ConfigOptions::new().with_address_prefixes(AddressPrefixes::default()),
//! )?;
//! let mut builder = config.new_tx_builder();
//! builder.set_memo("hello").set_gas_limit(200_000);
//! let tx = builder.get_tx();
//! let bytes = config.sign_bytes(config.default_sign_mode(), &ctx, &signer, &tx)?;
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::TxSignResult;
use crate::signing::{HandlerMap, SignContext, SignModeHandler, SigningContext};
use crate::tx::builder::{type_mismatch, SdkTx, TxBuilder, WrappedTx};
use crate::tx::encoder::{
    JsonTxDecoder, JsonTxEncoder, ProtoTxDecoder, ProtoTxEncoder, TxDecoder, TxEncoder,
};
use crate::tx::options::ConfigOptions;
use crate::types::{SignMode, SignerData};
use crate::utils::logging::Redacted;

/// Transaction encoding and signing configuration
#[derive(Clone)]
pub struct TxConfig {
    handler_map: Arc<HandlerMap>,
    signing_context: Arc<SigningContext>,
    encoder: Arc<dyn TxEncoder>,
    decoder: Arc<dyn TxDecoder>,
    json_encoder: Arc<dyn TxEncoder>,
    json_decoder: Arc<dyn TxDecoder>,
}

impl TxConfig {
    /// Enable the given built-in modes plus custom handlers, using the
    /// process-wide address prefixes.
    ///
    /// # Errors
    ///
    /// Fails when a mode cannot be constructed; see [`TxConfig::with_options`].
    pub fn new(
        enabled_sign_modes: Vec<SignMode>,
        custom_sign_modes: Vec<Arc<dyn SignModeHandler>>,
    ) -> TxSignResult<Self> {
        Self::with_options(ConfigOptions {
            enabled_sign_modes,
            custom_sign_modes,
            ..Default::default()
        })
    }

    /// Resolve `options` and build the handler map.
    ///
    /// # Errors
    ///
    /// Returns [`TxSignError::Configuration`](crate::error::TxSignError::Configuration)
    /// when a handler is missing a dependency and
    /// [`TxSignError::UnsupportedMode`](crate::error::TxSignError::UnsupportedMode)
    /// when an enabled mode has no registered constructor.
    pub fn with_options(options: ConfigOptions) -> TxSignResult<Self> {
        let (handler_map, resolved) = options.build_handler_map()?;
        tracing::info!(
            default = %handler_map.default_mode(),
            modes = ?handler_map.supported_modes(),
            "tx config built"
        );
        Ok(Self::with_handler(handler_map, resolved.signing_context))
    }

    /// Use a ready-made handler map
    pub fn with_handler(handler_map: HandlerMap, signing_context: Arc<SigningContext>) -> Self {
        Self {
            handler_map: Arc::new(handler_map),
            signing_context,
            encoder: Arc::new(ProtoTxEncoder),
            decoder: Arc::new(ProtoTxDecoder),
            json_encoder: Arc::new(JsonTxEncoder),
            json_decoder: Arc::new(JsonTxDecoder),
        }
    }

    pub fn sign_mode_handler(&self) -> &HandlerMap {
        &self.handler_map
    }

    pub fn default_sign_mode(&self) -> SignMode {
        self.handler_map.default_mode()
    }

    pub fn signing_context(&self) -> &Arc<SigningContext> {
        &self.signing_context
    }

    pub fn tx_encoder(&self) -> &dyn TxEncoder {
        self.encoder.as_ref()
    }

    pub fn tx_decoder(&self) -> &dyn TxDecoder {
        self.decoder.as_ref()
    }

    pub fn tx_json_encoder(&self) -> &dyn TxEncoder {
        self.json_encoder.as_ref()
    }

    pub fn tx_json_decoder(&self) -> &dyn TxDecoder {
        self.json_decoder.as_ref()
    }

    pub fn new_tx_builder(&self) -> TxBuilder {
        TxBuilder::new()
    }

    /// Continue building from an existing transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TxSignError::TypeMismatch`](crate::error::TxSignError::TypeMismatch)
    /// when `tx` is not a [`WrappedTx`].
    pub fn wrap_tx_builder(&self, tx: Box<dyn SdkTx>) -> TxSignResult<TxBuilder> {
        let mismatch = type_mismatch(tx.as_ref());
        match tx.into_any().downcast::<WrappedTx>() {
            Ok(wrapped) => Ok(TxBuilder::from(*wrapped)),
            Err(_) => Err(mismatch),
        }
    }

    /// Compute sign bytes for `tx` with the handler for `mode`
    pub fn sign_bytes(
        &self,
        mode: SignMode,
        ctx: &SignContext,
        signer_data: &SignerData,
        tx: &WrappedTx,
    ) -> TxSignResult<Vec<u8>> {
        let bytes = self
            .handler_map
            .get_sign_bytes(mode, ctx, signer_data, &tx.signing_data())?;
        tracing::debug!(
            mode = %mode,
            len = bytes.len(),
            digest = %Redacted::bytes(&bytes),
            "sign bytes computed"
        );
        Ok(bytes)
    }
}

impl fmt::Debug for TxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxConfig")
            .field("handler_map", &self.handler_map)
            .field("signing_context", &self.signing_context)
            .finish_non_exhaustive()
    }
}
