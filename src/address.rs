//! Address codecs and process-wide prefix configuration
//!
//! An [`AddressCodec`] converts between display strings and raw address
//! bytes. [`Bech32Codec`] is the default. [`AddressConfig`] holds the
//! process-wide prefixes that default signing options fall back to when no
//! explicit prefixes are supplied.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock};

use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Serialize};

use crate::error::{TxSignError, TxSignResult};

/// Longest raw address accepted by the default codec
pub const MAX_ADDR_LEN: usize = 255;

// =============================================================================
// Codec
// =============================================================================

/// Converts addresses between their display form and raw bytes
pub trait AddressCodec: Send + Sync + fmt::Debug {
    fn string_to_bytes(&self, text: &str) -> TxSignResult<Vec<u8>>;

    fn bytes_to_string(&self, bytes: &[u8]) -> TxSignResult<String>;
}

/// Bech32 codec bound to a single human-readable prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bech32Codec {
    prefix: String,
}

impl Bech32Codec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl AddressCodec for Bech32Codec {
    fn string_to_bytes(&self, text: &str) -> TxSignResult<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(TxSignError::address("empty address string is not allowed"));
        }

        let (hrp, data, variant) = bech32::decode(text)?;
        if hrp != self.prefix {
            return Err(TxSignError::address(format!(
                "invalid Bech32 prefix; expected {}, got {}",
                self.prefix, hrp
            )));
        }
        if variant != Variant::Bech32 {
            return Err(TxSignError::address("expected bech32, got bech32m"));
        }

        let bytes = Vec::<u8>::from_base32(&data)?;
        verify_address_format(&bytes)?;
        Ok(bytes)
    }

    fn bytes_to_string(&self, bytes: &[u8]) -> TxSignResult<String> {
        if bytes.is_empty() {
            return Ok(String::new());
        }
        verify_address_format(bytes)?;
        Ok(bech32::encode(&self.prefix, bytes.to_base32(), Variant::Bech32)?)
    }
}

fn verify_address_format(bytes: &[u8]) -> TxSignResult<()> {
    if bytes.is_empty() {
        return Err(TxSignError::address("addresses cannot be empty"));
    }
    if bytes.len() > MAX_ADDR_LEN {
        return Err(TxSignError::address(format!(
            "address max length is {}, got {}",
            MAX_ADDR_LEN,
            bytes.len()
        )));
    }
    Ok(())
}

// =============================================================================
// Prefixes
// =============================================================================

/// Human-readable prefixes for account and validator addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPrefixes {
    pub account: String,
    pub validator: String,
}

impl AddressPrefixes {
    pub const DEFAULT_ACCOUNT: &'static str = "cosmos";

    pub fn new(account: impl Into<String>, validator: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            validator: validator.into(),
        }
    }

    /// Derive the validator prefix by the usual `<account>valoper` convention
    pub fn from_account_prefix(account: impl Into<String>) -> Self {
        let account = account.into();
        let validator = format!("{}valoper", account);
        Self { account, validator }
    }

    pub fn account_codec(&self) -> Bech32Codec {
        Bech32Codec::new(&self.account)
    }

    pub fn validator_codec(&self) -> Bech32Codec {
        Bech32Codec::new(&self.validator)
    }
}

impl Default for AddressPrefixes {
    fn default() -> Self {
        Self::from_account_prefix(Self::DEFAULT_ACCOUNT)
    }
}

// =============================================================================
// Global Configuration
// =============================================================================

/// Process-wide address prefix configuration.
///
/// Only consulted when no explicit prefixes are given. Applications set the
/// prefixes once at startup and may [`seal`](AddressConfig::seal) the
/// configuration to reject later changes.
pub struct AddressConfig {
    prefixes: RwLock<AddressPrefixes>,
    sealed: AtomicBool,
}

impl AddressConfig {
    pub fn new() -> Self {
        Self {
            prefixes: RwLock::new(AddressPrefixes::default()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Get current prefixes
    pub fn prefixes(&self) -> AddressPrefixes {
        self.prefixes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the prefixes; fails once sealed
    pub fn set_prefixes(&self, prefixes: AddressPrefixes) -> TxSignResult<()> {
        if self.is_sealed() {
            return Err(TxSignError::configuration("address config is sealed"));
        }
        let mut current = self
            .prefixes
            .write()
            .map_err(|_| TxSignError::configuration("failed to acquire address config lock"))?;
        tracing::debug!(
            account = %prefixes.account,
            validator = %prefixes.validator,
            "address prefixes updated"
        );
        *current = prefixes;
        Ok(())
    }

    pub fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AddressConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressConfig")
            .field("prefixes", &self.prefixes())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

static ADDRESS_CONFIG: OnceLock<AddressConfig> = OnceLock::new();

/// Get the process-wide address configuration
pub fn get_address_config() -> &'static AddressConfig {
    ADDRESS_CONFIG.get_or_init(AddressConfig::new)
}
