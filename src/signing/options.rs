//! Signing Options and Message Type Resolution
//!
//! [`SigningOptions`] bundles the externally supplied capabilities every
//! handler may need: account and validator address codecs, and the resolvers
//! that map message type URLs to [`MessageDescriptor`]s.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use prost::Message;
use serde::Serialize;

use crate::address::{get_address_config, AddressCodec, AddressPrefixes};
use crate::error::{TxSignError, TxSignResult};

// =============================================================================
// Message Descriptors
// =============================================================================

/// Decodes protobuf message bytes into their JSON rendering
pub type JsonDecodeFn = Arc<dyn Fn(&[u8]) -> TxSignResult<serde_json::Value> + Send + Sync>;

/// What the signing layer needs to know about one message type
#[derive(Clone)]
pub struct MessageDescriptor {
    full_name: String,
    amino_name: Option<String>,
    signer_fields: Vec<String>,
    decode_json: JsonDecodeFn,
}

impl MessageDescriptor {
    pub fn new<F>(full_name: impl Into<String>, decode_json: F) -> Self
    where
        F: Fn(&[u8]) -> TxSignResult<serde_json::Value> + Send + Sync + 'static,
    {
        Self {
            full_name: full_name.into(),
            amino_name: None,
            signer_fields: Vec::new(),
            decode_json: Arc::new(decode_json),
        }
    }

    /// Descriptor for a prost message whose serde form is its JSON rendering
    pub fn for_message<M>(full_name: impl Into<String>) -> Self
    where
        M: Message + Default + Serialize + 'static,
    {
        Self::new(full_name, |bytes: &[u8]| {
            let msg = M::decode(bytes)?;
            Ok(serde_json::to_value(&msg)?)
        })
    }

    pub fn with_amino_name(mut self, amino_name: impl Into<String>) -> Self {
        self.amino_name = Some(amino_name.into());
        self
    }

    /// Fields whose values identify the message's signers, in order
    pub fn with_signer_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.signer_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Legacy amino name, falling back to the full name
    pub fn amino_name(&self) -> &str {
        self.amino_name.as_deref().unwrap_or(&self.full_name)
    }

    pub fn signer_fields(&self) -> &[String] {
        &self.signer_fields
    }

    pub fn decode_json(&self, bytes: &[u8]) -> TxSignResult<serde_json::Value> {
        (self.decode_json)(bytes)
    }
}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDescriptor")
            .field("full_name", &self.full_name)
            .field("amino_name", &self.amino_name)
            .field("signer_fields", &self.signer_fields)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Resolvers
// =============================================================================

/// Resolves `Any` type URLs to message descriptors
pub trait TypeResolver: Send + Sync {
    fn resolve_type_url(&self, type_url: &str) -> Option<MessageDescriptor>;
}

/// Looks up message descriptors by full name and enumerates the known set
pub trait FileResolver: Send + Sync {
    fn find_descriptor_by_name(&self, full_name: &str) -> Option<MessageDescriptor>;

    fn descriptors(&self) -> Vec<MessageDescriptor>;
}

/// In-memory registry implementing both resolver traits
#[derive(Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<String, MessageDescriptor>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor; replaces any previous one with the same name
    pub fn register(&self, descriptor: MessageDescriptor) {
        self.write().insert(descriptor.full_name.clone(), descriptor);
    }

    // Every write is a single insert, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, MessageDescriptor>> {
        self.types.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, MessageDescriptor>> {
        self.types.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with(self, descriptor: MessageDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve_type_url(&self, type_url: &str) -> Option<MessageDescriptor> {
        let full_name = type_url
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(type_url);
        self.find_descriptor_by_name(full_name)
    }
}

impl FileResolver for TypeRegistry {
    fn find_descriptor_by_name(&self, full_name: &str) -> Option<MessageDescriptor> {
        self.read().get(full_name).cloned()
    }

    fn descriptors(&self) -> Vec<MessageDescriptor> {
        let mut all: Vec<MessageDescriptor> = self.read().values().cloned().collect();
        all.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        all
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .descriptors()
            .into_iter()
            .map(|d| d.full_name)
            .collect();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

// =============================================================================
// Signing Options
// =============================================================================

/// Capabilities consumed by the signing layer; immutable once built
#[derive(Clone)]
pub struct SigningOptions {
    pub address_codec: Arc<dyn AddressCodec>,
    pub validator_address_codec: Arc<dyn AddressCodec>,
    pub type_resolver: Option<Arc<dyn TypeResolver>>,
    pub file_resolver: Option<Arc<dyn FileResolver>>,
}

impl SigningOptions {
    /// Bech32 codecs for the given prefixes and an empty type registry
    pub fn with_prefixes(prefixes: &AddressPrefixes) -> Self {
        let registry = Arc::new(TypeRegistry::new());
        Self {
            address_codec: Arc::new(prefixes.account_codec()),
            validator_address_codec: Arc::new(prefixes.validator_codec()),
            type_resolver: Some(registry.clone()),
            file_resolver: Some(registry),
        }
    }

    /// Use one registry as both the type resolver and the file resolver
    pub fn with_type_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.type_resolver = Some(registry.clone());
        self.file_resolver = Some(registry);
        self
    }

    pub fn with_type_resolver(mut self, resolver: Arc<dyn TypeResolver>) -> Self {
        self.type_resolver = Some(resolver);
        self
    }

    pub fn with_file_resolver(mut self, resolver: Arc<dyn FileResolver>) -> Self {
        self.file_resolver = Some(resolver);
        self
    }

    /// Resolve a type URL, failing when the type is unknown
    pub fn resolve(&self, type_url: &str) -> TxSignResult<MessageDescriptor> {
        let from_types = self
            .type_resolver
            .as_ref()
            .and_then(|r| r.resolve_type_url(type_url));
        let found = from_types.or_else(|| {
            let full_name = type_url.trim_start_matches('/');
            self.file_resolver
                .as_ref()
                .and_then(|r| r.find_descriptor_by_name(full_name))
        });
        found.ok_or_else(|| {
            TxSignError::malformed(format!("unable to resolve type URL {}", type_url))
        })
    }
}

impl fmt::Debug for SigningOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningOptions")
            .field("address_codec", &self.address_codec)
            .field("validator_address_codec", &self.validator_address_codec)
            .field("type_resolver", &self.type_resolver.is_some())
            .field("file_resolver", &self.file_resolver.is_some())
            .finish()
    }
}

/// Default signing options built from the process-wide address prefixes.
///
/// The result depends on [`get_address_config`] at the time of the call;
/// prefer [`SigningOptions::with_prefixes`] where reproducibility matters.
pub fn new_default_signing_options() -> SigningOptions {
    let prefixes = get_address_config().prefixes();
    tracing::debug!(
        account = %prefixes.account,
        validator = %prefixes.validator,
        "building signing options from global address prefixes"
    );
    SigningOptions::with_prefixes(&prefixes)
}
