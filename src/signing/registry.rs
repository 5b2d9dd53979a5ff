//! Handler constructor registry.
//!
//! [`HandlerRegistry`] maps each [`SignMode`] to a constructor that builds its
//! handler from shared [`HandlerDeps`]. The built-in modes are registered by
//! [`HandlerRegistry::new`]; embedders add or replace entries with
//! [`HandlerRegistry::register`] instead of editing a fixed dispatch.
//!
//! # Example
//!
//! ```ignore
//! use tx_signmode::signing::{HandlerRegistry, HandlerDeps};
//!
//! let registry = HandlerRegistry::new();
//! assert!(registry.supports(SignMode::Direct));
//!
//! let handler = registry.construct(SignMode::Direct, &deps)?;
//! assert_eq!(handler.mode(), SignMode::Direct);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{TxSignError, TxSignResult};
use crate::signing::aminojson::AminoJsonHandler;
use crate::signing::context::SigningContext;
use crate::signing::direct::DirectHandler;
use crate::signing::direct_aux::DirectAuxHandler;
use crate::signing::textual::{CoinMetadataQuerier, TextualHandler};
use crate::signing::SignModeHandler;
use crate::types::SignMode;

/// Everything a handler constructor may draw on
#[derive(Clone)]
pub struct HandlerDeps {
    pub signing_context: Arc<SigningContext>,
    pub coin_metadata_querier: Option<Arc<dyn CoinMetadataQuerier>>,
}

impl fmt::Debug for HandlerDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDeps")
            .field("signing_context", &self.signing_context)
            .field("coin_metadata_querier", &self.coin_metadata_querier.is_some())
            .finish()
    }
}

/// Builds one handler; fails with [`TxSignError::Configuration`] when a
/// required dependency is missing
pub type HandlerConstructor = fn(&HandlerDeps) -> TxSignResult<Arc<dyn SignModeHandler>>;

fn direct(_: &HandlerDeps) -> TxSignResult<Arc<dyn SignModeHandler>> {
    Ok(Arc::new(DirectHandler::new()))
}

fn direct_aux(deps: &HandlerDeps) -> TxSignResult<Arc<dyn SignModeHandler>> {
    Ok(Arc::new(DirectAuxHandler::from_context(
        deps.signing_context.clone(),
    )?))
}

fn amino_json(deps: &HandlerDeps) -> TxSignResult<Arc<dyn SignModeHandler>> {
    Ok(Arc::new(AminoJsonHandler::new(deps.signing_context.clone())))
}

fn textual(deps: &HandlerDeps) -> TxSignResult<Arc<dyn SignModeHandler>> {
    Ok(Arc::new(TextualHandler::new(
        deps.coin_metadata_querier.clone(),
        deps.signing_context.clone(),
    )?))
}

/// Table of handler constructors keyed by sign mode.
///
/// Cloning is cheap (`Arc` internally).
#[derive(Clone)]
pub struct HandlerRegistry {
    constructors: Arc<HashMap<SignMode, HandlerConstructor>>,
}

impl HandlerRegistry {
    /// Create a registry with the built-in constructors:
    /// - `SIGN_MODE_DIRECT`
    /// - `SIGN_MODE_DIRECT_AUX`
    /// - `SIGN_MODE_LEGACY_AMINO_JSON`
    /// - `SIGN_MODE_TEXTUAL`
    #[must_use]
    pub fn new() -> Self {
        let mut constructors: HashMap<SignMode, HandlerConstructor> = HashMap::new();
        constructors.insert(SignMode::Direct, direct);
        constructors.insert(SignMode::DirectAux, direct_aux);
        constructors.insert(SignMode::LegacyAminoJson, amino_json);
        constructors.insert(SignMode::Textual, textual);

        Self {
            constructors: Arc::new(constructors),
        }
    }

    /// Create an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: Arc::new(HashMap::new()),
        }
    }

    /// Register a constructor, replacing any existing one for the mode.
    pub fn register(&mut self, mode: SignMode, constructor: HandlerConstructor) {
        let constructors = Arc::make_mut(&mut self.constructors);
        constructors.insert(mode, constructor);
    }

    #[must_use]
    pub fn get(&self, mode: SignMode) -> Option<HandlerConstructor> {
        self.constructors.get(&mode).copied()
    }

    #[must_use]
    pub fn supports(&self, mode: SignMode) -> bool {
        self.constructors.contains_key(&mode)
    }

    /// Registered modes, sorted by wire value.
    #[must_use]
    pub fn supported_modes(&self) -> Vec<SignMode> {
        let mut modes: Vec<SignMode> = self.constructors.keys().copied().collect();
        modes.sort_by_key(|mode| mode.as_i32());
        modes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Build the handler for a mode.
    ///
    /// # Errors
    ///
    /// Returns [`TxSignError::UnsupportedMode`] when no constructor is
    /// registered, or the constructor's own error.
    pub fn construct(
        &self,
        mode: SignMode,
        deps: &HandlerDeps,
    ) -> TxSignResult<Arc<dyn SignModeHandler>> {
        let constructor = self.get(mode).ok_or(TxSignError::UnsupportedMode(mode))?;
        constructor(deps)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("modes", &self.supported_modes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressPrefixes;
    use crate::error::ErrorCode;
    use crate::signing::options::SigningOptions;
    use crate::signing::textual::CoinMetadata;
    use crate::signing::SignContext;

    fn deps(with_querier: bool) -> HandlerDeps {
        let options = SigningOptions::with_prefixes(&AddressPrefixes::default());
        let querier: Option<Arc<dyn CoinMetadataQuerier>> = if with_querier {
            Some(Arc::new(
                |_: &SignContext, _: &str| -> TxSignResult<Option<CoinMetadata>> { Ok(None) },
            ))
        } else {
            None
        };
        HandlerDeps {
            signing_context: Arc::new(SigningContext::new(options).unwrap()),
            coin_metadata_querier: querier,
        }
    }

    #[test]
    fn test_new_registers_built_ins() {
        let registry = HandlerRegistry::new();
        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.supported_modes(),
            vec![
                SignMode::Direct,
                SignMode::Textual,
                SignMode::DirectAux,
                SignMode::LegacyAminoJson
            ]
        );
        assert!(!registry.supports(SignMode::Custom(191)));
    }

    #[test]
    fn test_empty_registry() {
        let registry = HandlerRegistry::empty();
        assert!(registry.is_empty());
        let err = registry.construct(SignMode::Direct, &deps(false)).unwrap_err();
        assert_eq!(err, TxSignError::UnsupportedMode(SignMode::Direct));
    }

    #[test]
    fn test_construct_each_built_in() {
        let registry = HandlerRegistry::new();
        let deps = deps(true);
        for mode in registry.supported_modes() {
            let handler = registry.construct(mode, &deps).unwrap();
            assert_eq!(handler.mode(), mode);
        }
    }

    #[test]
    fn test_textual_needs_querier() {
        let err = HandlerRegistry::new()
            .construct(SignMode::Textual, &deps(false))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Configuration);
    }

    #[test]
    fn test_register_replaces_constructor() {
        fn direct_as_custom(_: &HandlerDeps) -> TxSignResult<Arc<dyn SignModeHandler>> {
            Ok(Arc::new(DirectHandler))
        }

        let mut registry = HandlerRegistry::new();
        let original = registry.clone();
        registry.register(SignMode::Custom(191), direct_as_custom);
        assert!(registry.supports(SignMode::Custom(191)));
        assert_eq!(registry.len(), 5);
        // Clones taken before registration are unaffected
        assert_eq!(original.len(), 4);
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HandlerRegistry>();
        assert_send_sync::<HandlerDeps>();
    }
}
