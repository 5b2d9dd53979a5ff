//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Once};

use serde::{Deserialize, Serialize};
use tx_signmode::address::{AddressCodec, AddressPrefixes, Bech32Codec};
use tx_signmode::proto::{Any, Coin};
use tx_signmode::signing::{MessageDescriptor, SigningOptions, TypeRegistry};
use tx_signmode::tx::ConfigOptions;

pub const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";

/// Bank send message, as registered on a real chain
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MsgSend {
    #[prost(string, tag = "1")]
    pub from_address: String,
    #[prost(string, tag = "2")]
    pub to_address: String,
    #[prost(message, repeated, tag = "3")]
    pub amount: Vec<Coin>,
}

static TRACING: Once = Once::new();

/// Route library events to the test output; `RUST_LOG` filters them
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn address(byte: u8) -> String {
    Bech32Codec::new("cosmos")
        .bytes_to_string(&[byte; 20])
        .expect("valid address bytes")
}

pub fn registry() -> Arc<TypeRegistry> {
    Arc::new(
        TypeRegistry::new().with(
            MessageDescriptor::for_message::<MsgSend>("cosmos.bank.v1beta1.MsgSend")
                .with_amino_name("cosmos-sdk/MsgSend")
                .with_signer_fields(["from_address"]),
        ),
    )
}

pub fn signing_options() -> SigningOptions {
    SigningOptions::with_prefixes(&AddressPrefixes::default()).with_type_registry(registry())
}

/// Options with explicit prefixes and the bank registry
pub fn config_options() -> ConfigOptions {
    ConfigOptions::new()
        .with_address_prefixes(AddressPrefixes::default())
        .with_signing_options(signing_options())
}

pub fn msg_send(from: u8, to: u8, amount: u64) -> Any {
    Any::pack(
        MSG_SEND_TYPE_URL,
        &MsgSend {
            from_address: address(from),
            to_address: address(to),
            amount: vec![Coin::new(amount, "uatom")],
        },
    )
}
