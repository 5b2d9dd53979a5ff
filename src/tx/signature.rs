//! Signatures as the builder sees them
//!
//! A [`SignatureV2`] bundles a signer's public key, sequence and signature
//! data. On the wire it is split in two: the [`ModeInfo`] and sequence go into
//! the signer info in `AuthInfo`, and the raw signature bytes go into the
//! transaction's `signatures` list at the same position.

use prost::Message;

use crate::error::{TxSignError, TxSignResult};
use crate::proto::{mode_info, Any, CompactBitArray, ModeInfo, MultiSignature, SignerInfo};
use crate::types::SignMode;

/// Signature payload for one signer
#[derive(Debug, Clone, PartialEq)]
pub enum SignatureData {
    /// A single key signing in one mode
    Single { mode: SignMode, signature: Vec<u8> },
    /// A multisig; `bitarray` marks which member keys signed
    Multi {
        bitarray: CompactBitArray,
        signatures: Vec<SignatureData>,
    },
}

impl SignatureData {
    pub fn single(mode: SignMode, signature: Vec<u8>) -> Self {
        Self::Single { mode, signature }
    }

    /// Split into the wire mode info and the raw signature bytes
    pub fn to_mode_info_and_sig(&self) -> (ModeInfo, Vec<u8>) {
        match self {
            Self::Single { mode, signature } => (ModeInfo::single(*mode), signature.clone()),
            Self::Multi {
                bitarray,
                signatures,
            } => {
                let (mode_infos, sigs): (Vec<_>, Vec<_>) = signatures
                    .iter()
                    .map(SignatureData::to_mode_info_and_sig)
                    .unzip();
                let raw = MultiSignature { signatures: sigs }.encode_to_vec();
                (ModeInfo::multi(bitarray.clone(), mode_infos), raw)
            }
        }
    }

    /// Rebuild from a wire mode info and the raw signature bytes
    pub fn from_mode_info_and_sig(mode_info: &ModeInfo, signature: Vec<u8>) -> TxSignResult<Self> {
        match &mode_info.sum {
            Some(mode_info::Sum::Single(single)) => Ok(Self::Single {
                mode: SignMode::from_i32(single.mode),
                signature,
            }),
            Some(mode_info::Sum::Multi(multi)) => {
                let raw = MultiSignature::decode(signature.as_slice())?;
                if raw.signatures.len() != multi.mode_infos.len() {
                    return Err(TxSignError::malformed(format!(
                        "multisig has {} mode infos but {} signatures",
                        multi.mode_infos.len(),
                        raw.signatures.len()
                    )));
                }
                let signatures = multi
                    .mode_infos
                    .iter()
                    .zip(raw.signatures)
                    .map(|(info, sig)| Self::from_mode_info_and_sig(info, sig))
                    .collect::<TxSignResult<Vec<_>>>()?;
                Ok(Self::Multi {
                    bitarray: multi.bitarray.clone().unwrap_or_default(),
                    signatures,
                })
            }
            None => Err(TxSignError::malformed("signer info has no mode info")),
        }
    }
}

/// A signature together with the signer's public key and sequence
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureV2 {
    pub pub_key: Option<Any>,
    pub data: SignatureData,
    pub sequence: u64,
}

impl SignatureV2 {
    pub fn new(pub_key: Option<Any>, data: SignatureData, sequence: u64) -> Self {
        Self {
            pub_key,
            data,
            sequence,
        }
    }

    /// Split into the signer info and the raw signature bytes
    pub fn to_signer_info(&self) -> (SignerInfo, Vec<u8>) {
        let (mode_info, raw) = self.data.to_mode_info_and_sig();
        let info = SignerInfo {
            public_key: self.pub_key.clone(),
            mode_info: Some(mode_info),
            sequence: self.sequence,
        };
        (info, raw)
    }

    /// Rebuild from a signer info and its raw signature bytes
    pub fn from_signer_info(info: &SignerInfo, signature: Vec<u8>) -> TxSignResult<Self> {
        let mode_info = info
            .mode_info
            .as_ref()
            .ok_or_else(|| TxSignError::malformed("signer info has no mode info"))?;
        Ok(Self {
            pub_key: info.public_key.clone(),
            data: SignatureData::from_mode_info_and_sig(mode_info, signature)?,
            sequence: info.sequence,
        })
    }
}
