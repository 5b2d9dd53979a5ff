//! `SIGN_MODE_DIRECT`
//!
//! Sign bytes are the protobuf encoding of
//! `SignDoc { body_bytes, auth_info_bytes, chain_id, account_number }`.
//! The body and auth-info bytes are taken verbatim from [`TxData`]; they are
//! never re-encoded from the decoded structures, so a signature stays valid
//! for exactly the bytes that are transmitted.

use prost::Message;

use crate::error::TxSignResult;
use crate::proto::SignDoc;
use crate::signing::{SignContext, SignModeHandler};
use crate::types::{SignMode, SignerData, TxData};

/// Handler for [`SignMode::Direct`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectHandler;

impl DirectHandler {
    pub fn new() -> Self {
        Self
    }

    /// Build the sign document without encoding it
    pub fn sign_doc(signer_data: &SignerData, tx_data: &TxData) -> SignDoc {
        SignDoc {
            body_bytes: tx_data.body_bytes.clone(),
            auth_info_bytes: tx_data.auth_info_bytes.clone(),
            chain_id: signer_data.chain_id.clone(),
            account_number: signer_data.account_number,
        }
    }
}

impl SignModeHandler for DirectHandler {
    fn mode(&self) -> SignMode {
        SignMode::Direct
    }

    fn get_sign_bytes(
        &self,
        ctx: &SignContext,
        signer_data: &SignerData,
        tx_data: &TxData,
    ) -> TxSignResult<Vec<u8>> {
        ctx.check()?;
        Ok(Self::sign_doc(signer_data, tx_data).encode_to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TxSignError;
    use crate::proto::{AuthInfo, Fee, TxBody};

    fn sample_tx() -> TxData {
        let body = TxBody {
            memo: "direct".to_string(),
            ..Default::default()
        };
        let auth_info = AuthInfo {
            fee: Some(Fee {
                gas_limit: 100_000,
                ..Default::default()
            }),
            ..Default::default()
        };
        TxData::from_parts(body, auth_info)
    }

    #[test]
    fn test_direct_sign_bytes_decode_to_sign_doc() {
        let tx = sample_tx();
        let signer = SignerData::new("cosmos1signer", "cosmoshub-4").with_account_number(42);
        let bytes = DirectHandler::new()
            .get_sign_bytes(&SignContext::background(), &signer, &tx)
            .unwrap();

        let doc = SignDoc::decode(bytes.as_slice()).unwrap();
        assert_eq!(doc.body_bytes, tx.body_bytes);
        assert_eq!(doc.auth_info_bytes, tx.auth_info_bytes);
        assert_eq!(doc.chain_id, "cosmoshub-4");
        assert_eq!(doc.account_number, 42);
    }

    #[test]
    fn test_direct_uses_raw_bytes_verbatim() {
        // Non-canonical encoding: memo field repeated, last one wins on decode
        let mut body_bytes = TxBody {
            memo: "first".to_string(),
            ..Default::default()
        }
        .encode_to_vec();
        body_bytes.extend_from_slice(&[0x12, 0x01, b'x']);

        let tx = TxData::from_bytes(body_bytes.clone(), vec![]).unwrap();
        assert_eq!(tx.body.memo, "x");

        let bytes = DirectHandler
            .get_sign_bytes(&SignContext::background(), &SignerData::default(), &tx)
            .unwrap();
        let doc = SignDoc::decode(bytes.as_slice()).unwrap();
        assert_eq!(doc.body_bytes, body_bytes);
        assert_ne!(doc.body_bytes, tx.body.encode_to_vec());
    }

    #[test]
    fn test_direct_is_deterministic_across_instances() {
        let tx = sample_tx();
        let signer = SignerData::new("a", "chain").with_account_number(1);
        let ctx = SignContext::background();
        let first = DirectHandler::new().get_sign_bytes(&ctx, &signer, &tx).unwrap();
        let second = DirectHandler::default().get_sign_bytes(&ctx, &signer, &tx).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_direct_honors_cancellation() {
        let ctx = SignContext::background();
        ctx.cancel();
        let err = DirectHandler
            .get_sign_bytes(&ctx, &SignerData::default(), &sample_tx())
            .unwrap_err();
        assert_eq!(err, TxSignError::Cancelled);
    }
}
