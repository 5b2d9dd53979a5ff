//! `SIGN_MODE_LEGACY_AMINO_JSON`
//!
//! Sign bytes are the canonical JSON of the historical `StdSignDoc`:
//!
//! ```text
//! {"account_number":"..","chain_id":"..","fee":{"amount":[..],"gas":".."},
//!  "memo":"..","msgs":[{"type":"..","value":{..}}],"sequence":".."}
//! ```
//!
//! Integers are strings, keys are sorted at every level and there is no
//! whitespace. `fee.payer`, `fee.granter` and `timeout_height` only appear
//! when set. Protobuf extension options have no amino representation, so
//! transactions carrying them are rejected.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{TxSignError, TxSignResult};
use crate::proto::Coin;
use crate::signing::context::SigningContext;
use crate::signing::{SignContext, SignModeHandler};
use crate::types::{SignMode, SignerData, TxData};
use crate::utils::json::to_canonical_json;

// =============================================================================
// Sign Document
// =============================================================================

/// Legacy amino sign document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StdSignDoc {
    pub account_number: String,
    pub chain_id: String,
    pub fee: StdFee,
    pub memo: String,
    pub msgs: Vec<AminoMsg>,
    pub sequence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_height: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StdFee {
    /// Always serialized, as `[]` when there is no fee amount
    pub amount: Vec<Coin>,
    pub gas: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granter: Option<String>,
}

/// A message tagged with its amino name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AminoMsg {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: serde_json::Value,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

// =============================================================================
// Handler
// =============================================================================

/// Handler for [`SignMode::LegacyAminoJson`]
pub struct AminoJsonHandler {
    signing_context: Arc<SigningContext>,
}

impl AminoJsonHandler {
    pub fn new(signing_context: Arc<SigningContext>) -> Self {
        Self { signing_context }
    }

    /// Build the sign document without serializing it
    pub fn std_sign_doc(
        &self,
        signer_data: &SignerData,
        tx_data: &TxData,
    ) -> TxSignResult<StdSignDoc> {
        let body = &tx_data.body;
        if !body.extension_options.is_empty() || !body.non_critical_extension_options.is_empty() {
            return Err(TxSignError::malformed(
                "SIGN_MODE_LEGACY_AMINO_JSON does not support protobuf extension options",
            ));
        }

        let msgs = body
            .messages
            .iter()
            .map(|msg| {
                let resolved = self.signing_context.resolve(msg)?;
                Ok(AminoMsg {
                    type_name: resolved.descriptor.amino_name().to_string(),
                    value: resolved.json,
                })
            })
            .collect::<TxSignResult<Vec<_>>>()?;

        let fee = tx_data.auth_info.fee.clone().unwrap_or_default();
        let fee = StdFee {
            amount: fee.amount,
            gas: fee.gas_limit.to_string(),
            payer: non_empty(&fee.payer),
            granter: non_empty(&fee.granter),
        };

        Ok(StdSignDoc {
            account_number: signer_data.account_number.to_string(),
            chain_id: signer_data.chain_id.clone(),
            fee,
            memo: body.memo.clone(),
            msgs,
            sequence: signer_data.sequence.to_string(),
            timeout_height: (body.timeout_height != 0).then(|| body.timeout_height.to_string()),
        })
    }
}

impl fmt::Debug for AminoJsonHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AminoJsonHandler").finish_non_exhaustive()
    }
}

impl SignModeHandler for AminoJsonHandler {
    fn mode(&self) -> SignMode {
        SignMode::LegacyAminoJson
    }

    fn get_sign_bytes(
        &self,
        ctx: &SignContext,
        signer_data: &SignerData,
        tx_data: &TxData,
    ) -> TxSignResult<Vec<u8>> {
        ctx.check()?;
        let doc = self.std_sign_doc(signer_data, tx_data)?;
        to_canonical_json(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{AddressCodec, AddressPrefixes, Bech32Codec};
    use crate::error::ErrorCode;
    use crate::proto::{Any, AuthInfo, Fee, TxBody};
    use crate::signing::options::{MessageDescriptor, SigningOptions, TypeRegistry};
    use serde::Deserialize;

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    struct MsgPing {
        #[prost(string, tag = "1")]
        sender: String,
        #[prost(uint64, tag = "2")]
        #[serde(with = "crate::serde_bytes::u64_string")]
        count: u64,
    }

    fn sender() -> String {
        Bech32Codec::new("cosmos").bytes_to_string(&[7u8; 20]).unwrap()
    }

    fn handler(amino_name: bool) -> AminoJsonHandler {
        let mut descriptor = MessageDescriptor::for_message::<MsgPing>("test.MsgPing")
            .with_signer_fields(["sender"]);
        if amino_name {
            descriptor = descriptor.with_amino_name("test/MsgPing");
        }
        let options = SigningOptions::with_prefixes(&AddressPrefixes::default())
            .with_type_registry(Arc::new(TypeRegistry::new().with(descriptor)));
        AminoJsonHandler::new(Arc::new(SigningContext::new(options).unwrap()))
    }

    fn tx(fee: Fee, timeout_height: u64) -> TxData {
        let body = TxBody {
            messages: vec![Any::pack(
                "/test.MsgPing",
                &MsgPing {
                    sender: sender(),
                    count: 2,
                },
            )],
            memo: "hello".to_string(),
            timeout_height,
            ..Default::default()
        };
        TxData::from_parts(
            body,
            AuthInfo {
                fee: Some(fee),
                ..Default::default()
            },
        )
    }

    fn signer() -> SignerData {
        SignerData::new(sender(), "test-chain")
            .with_account_number(7)
            .with_sequence(3)
    }

    #[test]
    fn test_amino_golden_bytes() {
        let fee = Fee {
            amount: vec![Coin::new(150, "uatom")],
            gas_limit: 200_000,
            ..Default::default()
        };
        let bytes = handler(true)
            .get_sign_bytes(&SignContext::background(), &signer(), &tx(fee, 0))
            .unwrap();
        let expected = format!(
            concat!(
                r#"{{"account_number":"7","chain_id":"test-chain","#,
                r#""fee":{{"amount":[{{"amount":"150","denom":"uatom"}}],"gas":"200000"}},"#,
                r#""memo":"hello","msgs":[{{"type":"test/MsgPing","value":{{"count":"2","sender":"{}"}}}}],"#,
                r#""sequence":"3"}}"#
            ),
            sender()
        );
        assert_eq!(String::from_utf8(bytes).unwrap(), expected);
    }

    #[test]
    fn test_optional_fields() {
        let payer = Bech32Codec::new("cosmos").bytes_to_string(&[1u8; 20]).unwrap();
        let fee = Fee {
            gas_limit: 1,
            payer: payer.clone(),
            granter: "granter".to_string(),
            ..Default::default()
        };
        let bytes = handler(true)
            .get_sign_bytes(&SignContext::background(), &signer(), &tx(fee, 99))
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains(&format!(
            r#""fee":{{"amount":[],"gas":"1","granter":"granter","payer":"{}"}}"#,
            payer
        )));
        assert!(text.ends_with(r#""sequence":"3","timeout_height":"99"}"#));
    }

    #[test]
    fn test_amino_name_falls_back_to_full_name() {
        let doc = handler(false)
            .std_sign_doc(&signer(), &tx(Fee::default(), 0))
            .unwrap();
        assert_eq!(doc.msgs[0].type_name, "test.MsgPing");
        assert_eq!(doc.fee.gas, "0");
    }

    #[test]
    fn test_rejects_extension_options() {
        let mut data = tx(Fee::default(), 0);
        data.body.extension_options.push(Any::new("/ext.Option", vec![]));
        let err = handler(true)
            .get_sign_bytes(&SignContext::background(), &signer(), &data)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedInput);
    }

    #[test]
    fn test_rejects_unknown_message() {
        let mut data = tx(Fee::default(), 0);
        data.body.messages.push(Any::new("/unknown.Msg", vec![]));
        let err = handler(true)
            .get_sign_bytes(&SignContext::background(), &signer(), &data)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedInput);
    }

    #[test]
    fn test_deterministic() {
        let ctx = SignContext::background();
        let data = tx(Fee::default(), 5);
        let first = handler(true).get_sign_bytes(&ctx, &signer(), &data).unwrap();
        let second = handler(true).get_sign_bytes(&ctx, &signer(), &data).unwrap();
        assert_eq!(first, second);
    }
}
