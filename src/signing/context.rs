//! Signing Context
//!
//! Derived, read-only view over [`SigningOptions`]. Signer field names are
//! precomputed per message type so handlers can find a message's signers
//! without consulting the resolvers on every call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::address::AddressCodec;
use crate::error::{TxSignError, TxSignResult};
use crate::proto::Any;
use crate::signing::options::{MessageDescriptor, SigningOptions};
use crate::utils::logging::Redacted;

/// A message resolved against the type registry
#[derive(Debug, Clone)]
pub struct ResolvedMessage {
    pub descriptor: MessageDescriptor,
    pub json: serde_json::Value,
}

pub struct SigningContext {
    options: SigningOptions,
    signer_fields: HashMap<String, Vec<String>>,
}

impl SigningContext {
    /// Build a context, precomputing signer fields from the file resolver.
    ///
    /// # Errors
    ///
    /// Returns [`TxSignError::Configuration`] if no file resolver is set.
    pub fn new(options: SigningOptions) -> TxSignResult<Self> {
        let file_resolver = options
            .file_resolver
            .as_ref()
            .ok_or_else(|| TxSignError::configuration("file resolver is required"))?;

        let signer_fields: HashMap<String, Vec<String>> = file_resolver
            .descriptors()
            .into_iter()
            .filter(|d| !d.signer_fields().is_empty())
            .map(|d| (d.full_name().to_string(), d.signer_fields().to_vec()))
            .collect();

        tracing::debug!(messages = signer_fields.len(), "signing context built");

        Ok(Self {
            options,
            signer_fields,
        })
    }

    pub fn options(&self) -> &SigningOptions {
        &self.options
    }

    pub fn address_codec(&self) -> &Arc<dyn AddressCodec> {
        &self.options.address_codec
    }

    pub fn validator_address_codec(&self) -> &Arc<dyn AddressCodec> {
        &self.options.validator_address_codec
    }

    pub fn has_type_resolver(&self) -> bool {
        self.options.type_resolver.is_some()
    }

    /// Ordered signer field names of a message type, if it declares any
    pub fn signer_fields(&self, full_name: &str) -> Option<&[String]> {
        self.signer_fields.get(full_name).map(Vec::as_slice)
    }

    /// Resolve a packed message and decode it to JSON
    pub fn resolve(&self, msg: &Any) -> TxSignResult<ResolvedMessage> {
        let descriptor = self.options.resolve(&msg.type_url)?;
        let json = descriptor.decode_json(&msg.value).map_err(|e| {
            TxSignError::malformed(format!("failed to decode {}: {}", msg.type_url, e))
        })?;
        Ok(ResolvedMessage { descriptor, json })
    }

    /// Raw signer addresses of a message, in signer-field order.
    ///
    /// Field values may be a single address string or a list of them. A
    /// value is decoded with the account codec first and the validator codec
    /// second.
    pub fn get_signers(&self, msg: &Any) -> TxSignResult<Vec<Vec<u8>>> {
        let resolved = self.resolve(msg)?;
        let fields = self
            .signer_fields(resolved.descriptor.full_name())
            .ok_or_else(|| {
                TxSignError::malformed(format!(
                    "message {} does not declare any signer fields",
                    resolved.descriptor.full_name()
                ))
            })?;

        let mut signers = Vec::new();
        for field in fields {
            match resolved.json.get(field) {
                Some(serde_json::Value::String(address)) => {
                    tracing::trace!(
                        field = %field,
                        value = %Redacted::field(field, address),
                        "decoding signer"
                    );
                    signers.push(self.decode_signer(address)?);
                }
                Some(serde_json::Value::Array(items)) => {
                    for item in items {
                        let address = item.as_str().ok_or_else(|| {
                            TxSignError::malformed(format!(
                                "signer field {} is not a string",
                                field
                            ))
                        })?;
                        signers.push(self.decode_signer(address)?);
                    }
                }
                _ => {
                    return Err(TxSignError::malformed(format!(
                        "signer field {} missing from {}",
                        field,
                        resolved.descriptor.full_name()
                    )))
                }
            }
        }
        Ok(signers)
    }

    fn decode_signer(&self, address: &str) -> TxSignResult<Vec<u8>> {
        self.options
            .address_codec
            .string_to_bytes(address)
            .or_else(|err| {
                self.options
                    .validator_address_codec
                    .string_to_bytes(address)
                    .map_err(|_| err)
            })
    }
}

impl fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.signer_fields.keys().collect();
        names.sort();
        f.debug_struct("SigningContext")
            .field("options", &self.options)
            .field("messages", &names)
            .finish()
    }
}
