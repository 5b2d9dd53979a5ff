//! Transaction configuration options
//!
//! [`ConfigOptions`] collects everything needed to build the sign-mode
//! [`HandlerMap`]. Unset fields are filled in by [`ConfigOptions::resolve`]:
//!
//! - signing options: bech32 codecs for `address_prefixes` when given,
//!   otherwise the process-wide [`AddressConfig`](crate::address::AddressConfig)
//! - signing context: derived from the signing options
//! - enabled sign modes: [`DEFAULT_SIGN_MODES`]
//!
//! Resolution only reads `self` and never touches global state, so it can be
//! repeated. Note that the global-prefix fallback makes the result depend on
//! the global configuration at call time.
//!
//! [`TxConfigSettings`] is the serializable subset, for loading from JSON.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::address::AddressPrefixes;
use crate::error::TxSignResult;
use crate::signing::{
    new_default_signing_options, CoinMetadataQuerier, HandlerDeps, HandlerMap, HandlerRegistry,
    SignModeHandler, SigningContext, SigningOptions,
};
use crate::types::SignMode;

/// Modes enabled when none are requested
pub const DEFAULT_SIGN_MODES: [SignMode; 2] = [SignMode::Direct, SignMode::LegacyAminoJson];

// =============================================================================
// Config Options
// =============================================================================

/// Inputs for building a [`HandlerMap`] and a
/// [`TxConfig`](crate::tx::TxConfig)
#[derive(Clone, Default)]
pub struct ConfigOptions {
    /// Built-in modes to enable, in order; the first is the default mode
    pub enabled_sign_modes: Vec<SignMode>,
    /// Extra handlers appended after the built-ins; they replace a built-in
    /// serving the same mode
    pub custom_sign_modes: Vec<Arc<dyn SignModeHandler>>,
    pub signing_options: Option<SigningOptions>,
    pub signing_context: Option<Arc<SigningContext>>,
    /// Required for `SIGN_MODE_TEXTUAL`
    pub coin_metadata_querier: Option<Arc<dyn CoinMetadataQuerier>>,
    /// Prefixes for the default address codecs
    pub address_prefixes: Option<AddressPrefixes>,
    /// Constructors for the enabled modes
    pub registry: HandlerRegistry,
}

/// [`ConfigOptions`] with every default filled in
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub enabled_sign_modes: Vec<SignMode>,
    pub signing_options: SigningOptions,
    pub signing_context: Arc<SigningContext>,
}

impl ConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled_sign_modes(mut self, modes: impl IntoIterator<Item = SignMode>) -> Self {
        self.enabled_sign_modes = modes.into_iter().collect();
        self
    }

    pub fn with_custom_sign_mode(mut self, handler: Arc<dyn SignModeHandler>) -> Self {
        self.custom_sign_modes.push(handler);
        self
    }

    pub fn with_signing_options(mut self, options: SigningOptions) -> Self {
        self.signing_options = Some(options);
        self
    }

    pub fn with_signing_context(mut self, context: Arc<SigningContext>) -> Self {
        self.signing_context = Some(context);
        self
    }

    pub fn with_coin_metadata_querier(mut self, querier: Arc<dyn CoinMetadataQuerier>) -> Self {
        self.coin_metadata_querier = Some(querier);
        self
    }

    pub fn with_address_prefixes(mut self, prefixes: AddressPrefixes) -> Self {
        self.address_prefixes = Some(prefixes);
        self
    }

    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Fill in every unset field.
    ///
    /// # Errors
    ///
    /// Returns [`TxSignError::Configuration`](crate::error::TxSignError::Configuration)
    /// when a signing context cannot be derived from the signing options.
    pub fn resolve(&self) -> TxSignResult<ResolvedConfig> {
        let signing_options = match (&self.signing_options, &self.signing_context) {
            (Some(options), _) => options.clone(),
            (None, Some(context)) => context.options().clone(),
            (None, None) => match &self.address_prefixes {
                Some(prefixes) => SigningOptions::with_prefixes(prefixes),
                None => {
                    tracing::warn!(
                        "no address prefixes configured, falling back to global address config"
                    );
                    new_default_signing_options()
                }
            },
        };

        let signing_context = match &self.signing_context {
            Some(context) => context.clone(),
            None => Arc::new(SigningContext::new(signing_options.clone())?),
        };

        let enabled_sign_modes = if self.enabled_sign_modes.is_empty() {
            DEFAULT_SIGN_MODES.to_vec()
        } else {
            self.enabled_sign_modes.clone()
        };

        Ok(ResolvedConfig {
            enabled_sign_modes,
            signing_options,
            signing_context,
        })
    }

    /// Resolve and build the handler map.
    ///
    /// Enabled modes are constructed in order through the registry, then the
    /// custom handlers are appended. Any failure discards everything built
    /// so far.
    pub fn build_handler_map(&self) -> TxSignResult<(HandlerMap, ResolvedConfig)> {
        let resolved = self.resolve()?;
        let deps = HandlerDeps {
            signing_context: resolved.signing_context.clone(),
            coin_metadata_querier: self.coin_metadata_querier.clone(),
        };

        let mut handlers = resolved
            .enabled_sign_modes
            .iter()
            .map(|mode| self.registry.construct(*mode, &deps))
            .collect::<TxSignResult<Vec<_>>>()?;
        handlers.extend(self.custom_sign_modes.iter().cloned());

        // resolve() never returns an empty mode list
        let default_mode = resolved.enabled_sign_modes[0];
        let map = HandlerMap::with_default(default_mode, handlers)?;
        Ok((map, resolved))
    }
}

impl fmt::Debug for ConfigOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let custom: Vec<SignMode> = self.custom_sign_modes.iter().map(|h| h.mode()).collect();
        f.debug_struct("ConfigOptions")
            .field("enabled_sign_modes", &self.enabled_sign_modes)
            .field("custom_sign_modes", &custom)
            .field("signing_options", &self.signing_options)
            .field("signing_context", &self.signing_context.is_some())
            .field("coin_metadata_querier", &self.coin_metadata_querier.is_some())
            .field("address_prefixes", &self.address_prefixes)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Build only the handler map from `options`
pub fn new_signing_handler_map(options: &ConfigOptions) -> TxSignResult<HandlerMap> {
    options.build_handler_map().map(|(map, _)| map)
}

// =============================================================================
// Settings
// =============================================================================

/// Serializable configuration, e.g. from a JSON file
///
/// ```json
/// {"enabled_sign_modes": ["direct", "SIGN_MODE_LEGACY_AMINO_JSON"],
///  "account_prefix": "osmo"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxConfigSettings {
    pub enabled_sign_modes: Vec<SignMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_prefix: Option<String>,
    /// Defaults to `<account_prefix>valoper`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator_prefix: Option<String>,
}

impl TxConfigSettings {
    pub fn from_json(json: &str) -> TxSignResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn address_prefixes(&self) -> Option<AddressPrefixes> {
        match (&self.account_prefix, &self.validator_prefix) {
            (Some(account), Some(validator)) => {
                Some(AddressPrefixes::new(account.clone(), validator.clone()))
            }
            (Some(account), None) => Some(AddressPrefixes::from_account_prefix(account.clone())),
            (None, Some(validator)) => Some(AddressPrefixes::new(
                AddressPrefixes::DEFAULT_ACCOUNT,
                validator.clone(),
            )),
            (None, None) => None,
        }
    }
}

impl From<TxConfigSettings> for ConfigOptions {
    fn from(settings: TxConfigSettings) -> Self {
        let prefixes = settings.address_prefixes();
        ConfigOptions {
            enabled_sign_modes: settings.enabled_sign_modes,
            address_prefixes: prefixes,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressCodec;
    use crate::error::{ErrorCode, TxSignError};
    use crate::signing::textual::CoinMetadata;
    use crate::signing::{DirectHandler, SignContext};

    fn explicit() -> ConfigOptions {
        ConfigOptions::new().with_address_prefixes(AddressPrefixes::default())
    }

    fn querier() -> Arc<dyn CoinMetadataQuerier> {
        Arc::new(
            |_: &SignContext, _: &str| -> TxSignResult<Option<CoinMetadata>> { Ok(None) },
        )
    }

    #[test]
    fn test_resolve_defaults() {
        let resolved = explicit().resolve().unwrap();
        assert_eq!(resolved.enabled_sign_modes, DEFAULT_SIGN_MODES.to_vec());
        assert!(resolved.signing_options.file_resolver.is_some());
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let options = explicit().with_enabled_sign_modes([SignMode::DirectAux]);
        let first = options.resolve().unwrap();
        let second = options.resolve().unwrap();
        assert_eq!(first.enabled_sign_modes, second.enabled_sign_modes);
        assert_eq!(options.enabled_sign_modes, vec![SignMode::DirectAux]);
        assert!(options.signing_options.is_none());
    }

    #[test]
    fn test_explicit_prefixes_drive_codecs() {
        let options = ConfigOptions::new()
            .with_address_prefixes(AddressPrefixes::from_account_prefix("osmo"));
        let resolved = options.resolve().unwrap();
        let account = resolved
            .signing_options
            .address_codec
            .bytes_to_string(&[1u8; 20])
            .unwrap();
        let validator = resolved
            .signing_options
            .validator_address_codec
            .bytes_to_string(&[1u8; 20])
            .unwrap();
        assert!(account.starts_with("osmo1"));
        assert!(validator.starts_with("osmovaloper1"));
    }

    #[test]
    fn test_context_supplies_options() {
        let context = Arc::new(
            SigningContext::new(SigningOptions::with_prefixes(&AddressPrefixes::from_account_prefix(
                "juno",
            )))
            .unwrap(),
        );
        let resolved = ConfigOptions::new()
            .with_signing_context(context.clone())
            .resolve()
            .unwrap();
        assert!(Arc::ptr_eq(&resolved.signing_context, &context));
        let addr = resolved
            .signing_options
            .address_codec
            .bytes_to_string(&[2u8; 20])
            .unwrap();
        assert!(addr.starts_with("juno1"));
    }

    #[test]
    fn test_missing_file_resolver_fails() {
        let mut signing_options = SigningOptions::with_prefixes(&AddressPrefixes::default());
        signing_options.file_resolver = None;
        let err = ConfigOptions::new()
            .with_signing_options(signing_options)
            .resolve()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Configuration);
    }

    #[test]
    fn test_handler_map_order_and_default() {
        let map = new_signing_handler_map(
            &explicit().with_enabled_sign_modes([SignMode::LegacyAminoJson, SignMode::Direct]),
        )
        .unwrap();
        assert_eq!(map.default_mode(), SignMode::LegacyAminoJson);
        assert_eq!(
            map.supported_modes(),
            [SignMode::LegacyAminoJson, SignMode::Direct]
        );
    }

    #[test]
    fn test_textual_requires_querier() {
        let options = explicit().with_enabled_sign_modes([SignMode::Direct, SignMode::Textual]);
        let err = new_signing_handler_map(&options).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Configuration);

        let map = new_signing_handler_map(&options.with_coin_metadata_querier(querier())).unwrap();
        assert!(map.supports(SignMode::Textual));
    }

    #[test]
    fn test_unregistered_mode_fails() {
        let options = explicit().with_enabled_sign_modes([SignMode::Direct, SignMode::Custom(191)]);
        let err = new_signing_handler_map(&options).unwrap_err();
        assert_eq!(err, TxSignError::UnsupportedMode(SignMode::Custom(191)));
    }

    #[test]
    fn test_custom_handlers_appended() {
        let options = explicit()
            .with_enabled_sign_modes([SignMode::LegacyAminoJson])
            .with_custom_sign_mode(Arc::new(DirectHandler::new()));
        let map = new_signing_handler_map(&options).unwrap();
        assert_eq!(
            map.supported_modes(),
            [SignMode::LegacyAminoJson, SignMode::Direct]
        );
        assert_eq!(map.default_mode(), SignMode::LegacyAminoJson);
    }

    #[test]
    fn test_settings_from_json() {
        let json = serde_json::json!({
            "enabled_sign_modes": ["direct", "SIGN_MODE_LEGACY_AMINO_JSON", 127],
            "account_prefix": "osmo",
        });
        let settings = TxConfigSettings::from_json(&json.to_string()).unwrap();
        assert_eq!(
            settings.enabled_sign_modes,
            vec![SignMode::Direct, SignMode::LegacyAminoJson, SignMode::LegacyAminoJson]
        );
        assert_eq!(
            settings.address_prefixes(),
            Some(AddressPrefixes::new("osmo", "osmovaloper"))
        );

        let options = ConfigOptions::from(settings);
        assert_eq!(options.enabled_sign_modes.len(), 3);
        assert!(options.address_prefixes.is_some());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = TxConfigSettings::from_json("{}").unwrap();
        assert_eq!(settings, TxConfigSettings::default());
        assert_eq!(settings.address_prefixes(), None);

        let settings = TxConfigSettings {
            validator_prefix: Some("val".to_string()),
            ..Default::default()
        };
        assert_eq!(
            settings.address_prefixes(),
            Some(AddressPrefixes::new("cosmos", "val"))
        );

        assert!(TxConfigSettings::from_json(r#"{"enabled_sign_modes":["bogus"]}"#).is_err());
    }
}
