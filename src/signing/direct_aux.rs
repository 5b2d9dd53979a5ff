//! `SIGN_MODE_DIRECT_AUX`
//!
//! For auxiliary signers (tippers, multi-party flows) who sign before the fee
//! is known. Sign bytes are the protobuf encoding of
//! `SignDocDirectAux { body_bytes, public_key, chain_id, account_number, sequence }`,
//! which carries no auth info. Because the fee is not covered, the fee payer
//! may not use this mode.

use std::fmt;
use std::sync::Arc;

use prost::Message;

use crate::error::{TxSignError, TxSignResult};
use crate::proto::SignDocDirectAux;
use crate::signing::context::SigningContext;
use crate::signing::options::TypeResolver;
use crate::signing::{SignContext, SignModeHandler};
use crate::types::{SignMode, SignerData, TxData};
use crate::utils::logging::Redacted;

/// Dependencies of [`DirectAuxHandler`]; both are required
#[derive(Clone, Default)]
pub struct DirectAuxOptions {
    pub type_resolver: Option<Arc<dyn TypeResolver>>,
    pub signing_context: Option<Arc<SigningContext>>,
}

/// Handler for [`SignMode::DirectAux`]
pub struct DirectAuxHandler {
    signing_context: Arc<SigningContext>,
}

impl DirectAuxHandler {
    /// # Errors
    ///
    /// Returns [`TxSignError::Configuration`] when the type resolver or the
    /// signing context is missing.
    pub fn new(options: DirectAuxOptions) -> TxSignResult<Self> {
        if options.type_resolver.is_none() {
            return Err(TxSignError::configuration(
                "type resolver is required for SIGN_MODE_DIRECT_AUX",
            ));
        }
        let signing_context = options.signing_context.ok_or_else(|| {
            TxSignError::configuration("signing context is required for SIGN_MODE_DIRECT_AUX")
        })?;
        Ok(Self { signing_context })
    }

    /// Build from a signing context, using its type resolver
    pub fn from_context(signing_context: Arc<SigningContext>) -> TxSignResult<Self> {
        Self::new(DirectAuxOptions {
            type_resolver: signing_context.options().type_resolver.clone(),
            signing_context: Some(signing_context),
        })
    }

    /// Raw address of the fee payer: the explicit `fee.payer`, else the
    /// first signer of the first message
    pub fn fee_payer(&self, tx_data: &TxData) -> TxSignResult<Vec<u8>> {
        let explicit = tx_data
            .auth_info
            .fee
            .as_ref()
            .map(|fee| fee.payer.as_str())
            .filter(|payer| !payer.is_empty());
        if let Some(payer) = explicit {
            return self.signing_context.address_codec().string_to_bytes(payer);
        }

        let first_msg = tx_data
            .body
            .messages
            .first()
            .ok_or_else(|| TxSignError::malformed("no signer found: transaction has no messages"))?;
        self.signing_context
            .get_signers(first_msg)?
            .into_iter()
            .next()
            .ok_or_else(|| TxSignError::malformed("no signer found for first message"))
    }
}

impl fmt::Debug for DirectAuxHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectAuxHandler").finish_non_exhaustive()
    }
}

impl SignModeHandler for DirectAuxHandler {
    fn mode(&self) -> SignMode {
        SignMode::DirectAux
    }

    fn get_sign_bytes(
        &self,
        ctx: &SignContext,
        signer_data: &SignerData,
        tx_data: &TxData,
    ) -> TxSignResult<Vec<u8>> {
        ctx.check()?;

        let fee_payer = self.fee_payer(tx_data)?;
        let signer = self
            .signing_context
            .address_codec()
            .string_to_bytes(&signer_data.address)?;
        if signer == fee_payer {
            tracing::debug!(
                signer = %Redacted::address(&signer_data.address),
                "fee payer rejected in direct aux mode"
            );
            return Err(TxSignError::malformed(format!(
                "signer {} is the fee payer, must use a full signing mode",
                signer_data.address
            )));
        }

        let doc = SignDocDirectAux {
            body_bytes: tx_data.body_bytes.clone(),
            public_key: signer_data.pub_key.clone(),
            chain_id: signer_data.chain_id.clone(),
            account_number: signer_data.account_number,
            sequence: signer_data.sequence,
        };
        Ok(doc.encode_to_vec())
    }
}
