//! End-to-end tests for TxConfig: handler resolution, signing, encoding

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{address, config_options, init_tracing, msg_send, signing_options};
use prost::Message;
use tx_signmode::proto::{Coin, SignDoc, SignDocDirectAux};
use tx_signmode::signing::{CoinMetadata, CoinMetadataQuerier, Screen, SignModeHandler};
use tx_signmode::tx::{SignatureData, SignatureV2, TxBuilder, TxConfig, WrappedTx};
use tx_signmode::{
    ErrorCode, SignContext, SignMode, SignerData, TxData, TxSignError, TxSignResult,
};

/// Handler returning a fixed payload, standing in for chain-specific modes
struct FixedHandler {
    mode: SignMode,
    payload: &'static [u8],
}

impl SignModeHandler for FixedHandler {
    fn mode(&self) -> SignMode {
        self.mode
    }

    fn get_sign_bytes(
        &self,
        ctx: &SignContext,
        _signer_data: &SignerData,
        _tx_data: &TxData,
    ) -> TxSignResult<Vec<u8>> {
        ctx.check()?;
        Ok(self.payload.to_vec())
    }
}

fn atom_querier(calls: Arc<AtomicUsize>) -> Arc<dyn CoinMetadataQuerier> {
    Arc::new(
        move |_: &SignContext, denom: &str| -> TxSignResult<Option<CoinMetadata>> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok((denom == "uatom").then(|| CoinMetadata {
                base: "uatom".to_string(),
                display: "ATOM".to_string(),
                exponent: 6,
            }))
        },
    )
}

fn all_modes_config(calls: Arc<AtomicUsize>) -> TxConfig {
    TxConfig::with_options(
        config_options()
            .with_enabled_sign_modes([
                SignMode::Direct,
                SignMode::DirectAux,
                SignMode::LegacyAminoJson,
                SignMode::Textual,
            ])
            .with_coin_metadata_querier(atom_querier(calls)),
    )
    .unwrap()
}

fn send_tx(builder: &mut TxBuilder) -> WrappedTx {
    builder
        .set_msgs(vec![msg_send(1, 2, 1_500_000)])
        .set_memo("integration")
        .set_fee_amount(vec![Coin::new(2500, "uatom")])
        .set_gas_limit(200_000);
    builder.get_tx()
}

fn signer(byte: u8) -> SignerData {
    SignerData::new(address(byte), "cosmoshub-4")
        .with_account_number(12)
        .with_sequence(3)
}

#[test]
fn test_default_scenario() {
    init_tracing();
    let config = TxConfig::with_options(
        config_options().with_enabled_sign_modes([SignMode::Direct, SignMode::LegacyAminoJson]),
    )
    .unwrap();
    let map = config.sign_mode_handler();
    assert_eq!(
        map.supported_modes(),
        [SignMode::Direct, SignMode::LegacyAminoJson]
    );
    assert_eq!(map.default_mode(), SignMode::Direct);
    for mode in map.supported_modes() {
        assert_eq!(map.get(*mode).unwrap().mode(), *mode);
    }
    assert!(matches!(
        map.get(SignMode::Textual),
        Err(TxSignError::UnsupportedMode(SignMode::Textual))
    ));
}

#[test]
fn test_convenience_constructor_uses_global_prefixes() {
    init_tracing();
    let config = TxConfig::new(vec![SignMode::LegacyAminoJson, SignMode::Direct], vec![]).unwrap();
    assert_eq!(config.default_sign_mode(), SignMode::LegacyAminoJson);
    assert_eq!(config.sign_mode_handler().len(), 2);
}

#[test]
fn test_textual_requires_querier() {
    let err = TxConfig::with_options(
        config_options().with_enabled_sign_modes([SignMode::Direct, SignMode::Textual]),
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Configuration);
}

#[test]
fn test_every_mode_signs_deterministically() {
    init_tracing();
    let first = all_modes_config(Arc::default());
    let second = all_modes_config(Arc::default());
    let tx = send_tx(&mut first.new_tx_builder());
    let ctx = SignContext::background();
    let aux_signer = signer(5);

    for mode in first.sign_mode_handler().supported_modes() {
        let a = first.sign_bytes(*mode, &ctx, &aux_signer, &tx).unwrap();
        let b = first.sign_bytes(*mode, &ctx, &aux_signer, &tx).unwrap();
        let c = second.sign_bytes(*mode, &ctx, &aux_signer, &tx).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b, "{mode} differs across calls");
        assert_eq!(a, c, "{mode} differs across configs");
    }
}

#[test]
fn test_direct_and_aux_documents() {
    let config = all_modes_config(Arc::default());
    let tx = send_tx(&mut config.new_tx_builder());
    let ctx = SignContext::background();

    let direct = config
        .sign_bytes(SignMode::Direct, &ctx, &signer(1), &tx)
        .unwrap();
    let doc = SignDoc::decode(direct.as_slice()).unwrap();
    assert_eq!(doc.body_bytes, tx.body_bytes());
    assert_eq!(doc.auth_info_bytes, tx.auth_info_bytes());
    assert_eq!(doc.chain_id, "cosmoshub-4");
    assert_eq!(doc.account_number, 12);

    let aux = config
        .sign_bytes(SignMode::DirectAux, &ctx, &signer(9), &tx)
        .unwrap();
    let doc = SignDocDirectAux::decode(aux.as_slice()).unwrap();
    assert_eq!(doc.body_bytes, tx.body_bytes());
    assert_eq!(doc.sequence, 3);

    // the sender of the only message pays the fee
    let err = config
        .sign_bytes(SignMode::DirectAux, &ctx, &signer(1), &tx)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MalformedInput);
}

#[test]
fn test_amino_json_golden() {
    let config = all_modes_config(Arc::default());
    let tx = send_tx(&mut config.new_tx_builder());
    let bytes = config
        .sign_bytes(
            SignMode::LegacyAminoJson,
            &SignContext::background(),
            &signer(1),
            &tx,
        )
        .unwrap();
    let expected = format!(
        concat!(
            r#"{{"account_number":"12","chain_id":"cosmoshub-4","#,
            r#""fee":{{"amount":[{{"amount":"2500","denom":"uatom"}}],"gas":"200000"}},"#,
            r#""memo":"integration","#,
            r#""msgs":[{{"type":"cosmos-sdk/MsgSend","value":{{"#,
            r#""amount":[{{"amount":"1500000","denom":"uatom"}}],"#,
            r#""from_address":"{}","to_address":"{}"}}}}],"#,
            r#""sequence":"3"}}"#
        ),
        address(1),
        address(2)
    );
    assert_eq!(String::from_utf8(bytes).unwrap(), expected);
}

#[test]
fn test_textual_formats_coins_and_caches_metadata() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = all_modes_config(calls.clone());
    let tx = send_tx(&mut config.new_tx_builder());

    let bytes = config
        .sign_bytes(SignMode::Textual, &SignContext::background(), &signer(1), &tx)
        .unwrap();
    let screens: Vec<Screen> = serde_json::from_slice(&bytes).unwrap();

    let content = |title: &str| {
        screens
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.content.clone())
    };
    assert_eq!(content("Chain id").as_deref(), Some("cosmoshub-4"));
    assert_eq!(content("Amount").as_deref(), Some("1.5 ATOM"));
    assert_eq!(content("Fees").as_deref(), Some("0.0025 ATOM"));
    assert_eq!(content("Memo").as_deref(), Some("integration"));
    assert_eq!(content("Gas limit").as_deref(), Some("200'000"));

    let last = screens.last().unwrap();
    assert_eq!(last.title, "Hash of raw bytes");
    assert!(last.expert);
    assert_eq!(last.content.len(), 64);

    // one lookup per denom per render pass
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_textual_honours_cancellation() {
    let config = all_modes_config(Arc::default());
    let tx = send_tx(&mut config.new_tx_builder());
    let ctx = SignContext::background();
    ctx.clone().cancel();

    let err = config
        .sign_bytes(SignMode::Textual, &ctx, &signer(1), &tx)
        .unwrap_err();
    assert_eq!(err, TxSignError::Cancelled);
    assert!(err.is_retryable());
}

#[test]
fn test_custom_handler_overrides_built_in() {
    init_tracing();
    let config = TxConfig::with_options(
        config_options()
            .with_enabled_sign_modes([SignMode::Direct, SignMode::LegacyAminoJson])
            .with_custom_sign_mode(Arc::new(FixedHandler {
                mode: SignMode::Direct,
                payload: b"custom-direct",
            }))
            .with_custom_sign_mode(Arc::new(FixedHandler {
                mode: SignMode::Custom(SignMode::EIP_191),
                payload: b"eip191",
            })),
    )
    .unwrap();

    let map = config.sign_mode_handler();
    assert_eq!(
        map.supported_modes(),
        [
            SignMode::Direct,
            SignMode::LegacyAminoJson,
            SignMode::Custom(SignMode::EIP_191)
        ]
    );
    assert_eq!(map.default_mode(), SignMode::Direct);

    let tx = send_tx(&mut config.new_tx_builder());
    let ctx = SignContext::background();
    assert_eq!(
        config.sign_bytes(SignMode::Direct, &ctx, &signer(1), &tx).unwrap(),
        b"custom-direct"
    );
    assert_eq!(
        config
            .sign_bytes(SignMode::Custom(191), &ctx, &signer(1), &tx)
            .unwrap(),
        b"eip191"
    );
}

#[test]
fn test_sign_encode_decode_flow() {
    init_tracing();
    let config = all_modes_config(Arc::default());
    let mut builder = config.new_tx_builder();
    let unsigned = send_tx(&mut builder);
    let ctx = SignContext::background();
    let sign_bytes = config
        .sign_bytes(SignMode::Direct, &ctx, &signer(1), &unsigned)
        .unwrap();

    // stand-in signature over the sign bytes
    let signature: Vec<u8> = sign_bytes.iter().rev().take(64).copied().collect();
    builder.set_signatures(vec![SignatureV2::new(
        None,
        SignatureData::single(SignMode::Direct, signature.clone()),
        3,
    )]);
    let signed = builder.get_tx();
    signed.validate_basic().unwrap();
    assert_eq!(signed.body_bytes(), unsigned.body_bytes());

    let encoded = config.tx_encoder().encode(&signed).unwrap();
    let decoded = config.tx_decoder().decode(&encoded).unwrap();
    assert_eq!(decoded, signed);
    assert_eq!(decoded.signatures(), [signature]);

    // body bytes survive the binary round trip untouched
    let resigned = config
        .sign_bytes(SignMode::Direct, &ctx, &signer(1), &decoded)
        .unwrap();
    let doc = SignDoc::decode(resigned.as_slice()).unwrap();
    assert_eq!(doc.body_bytes, unsigned.body_bytes());

    let json = config.tx_json_encoder().encode(&signed).unwrap();
    let from_json = config.tx_json_decoder().decode(&json).unwrap();
    assert_eq!(from_json, signed);

    let mut wrapped = config.wrap_tx_builder(Box::new(decoded)).unwrap();
    assert_eq!(config.tx_encoder().encode(&wrapped.get_tx()).unwrap(), encoded);
}

#[test]
fn test_explicit_signing_options_need_no_prefixes() {
    let config = TxConfig::with_options(
        tx_signmode::ConfigOptions::new()
            .with_signing_options(signing_options())
            .with_enabled_sign_modes([SignMode::LegacyAminoJson]),
    )
    .unwrap();
    assert_eq!(config.default_sign_mode(), SignMode::LegacyAminoJson);
}
