//! Sign-mode dispatch.
//!
//! [`HandlerMap`] holds one handler per [`SignMode`] and routes sign-byte
//! requests to it. It remembers the order in which modes were added, and
//! its default mode is the first one.
//!
//! When two handlers claim the same mode, the one added last wins and the
//! mode keeps the position of its first appearance. Custom handlers are added
//! after the built-ins, so a custom handler replaces the built-in for its
//! mode.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{TxSignError, TxSignResult};
use crate::signing::{SignContext, SignModeHandler};
use crate::types::{SignMode, SignerData, TxData};
use crate::utils::logging::Redacted;

/// Immutable mode-to-handler dispatch table
#[derive(Clone)]
pub struct HandlerMap {
    default_mode: SignMode,
    modes: Vec<SignMode>,
    handlers: HashMap<SignMode, Arc<dyn SignModeHandler>>,
}

impl HandlerMap {
    /// Build a map whose default mode is the first handler's mode.
    ///
    /// # Errors
    ///
    /// Returns [`TxSignError::Configuration`] when `handlers` is empty.
    pub fn new(handlers: Vec<Arc<dyn SignModeHandler>>) -> TxSignResult<Self> {
        let default_mode = handlers
            .first()
            .map(|h| h.mode())
            .ok_or_else(|| TxSignError::configuration("no sign mode handlers provided"))?;
        Self::with_default(default_mode, handlers)
    }

    /// Build a map with an explicit default mode.
    ///
    /// # Errors
    ///
    /// Returns [`TxSignError::Configuration`] when `handlers` is empty and
    /// [`TxSignError::UnsupportedMode`] when no handler serves `default_mode`.
    pub fn with_default(
        default_mode: SignMode,
        handlers: Vec<Arc<dyn SignModeHandler>>,
    ) -> TxSignResult<Self> {
        if handlers.is_empty() {
            return Err(TxSignError::configuration("no sign mode handlers provided"));
        }

        let mut map = Self {
            default_mode,
            modes: Vec::with_capacity(handlers.len()),
            handlers: HashMap::with_capacity(handlers.len()),
        };
        for handler in handlers {
            map.insert(handler);
        }

        if !map.handlers.contains_key(&default_mode) {
            return Err(TxSignError::UnsupportedMode(default_mode));
        }

        tracing::debug!(
            default = %map.default_mode,
            modes = ?map.modes,
            "sign mode handler map built"
        );
        Ok(map)
    }

    fn insert(&mut self, handler: Arc<dyn SignModeHandler>) {
        let mode = handler.mode();
        if self.handlers.insert(mode, handler).is_some() {
            tracing::warn!(mode = %mode, "sign mode handler replaced by later registration");
        } else {
            self.modes.push(mode);
        }
    }

    /// The handler for `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`TxSignError::UnsupportedMode`] when the mode is not served.
    pub fn get(&self, mode: SignMode) -> TxSignResult<Arc<dyn SignModeHandler>> {
        self.handlers
            .get(&mode)
            .cloned()
            .ok_or(TxSignError::UnsupportedMode(mode))
    }

    pub fn default_mode(&self) -> SignMode {
        self.default_mode
    }

    /// Served modes in registration order, each listed once
    pub fn supported_modes(&self) -> &[SignMode] {
        &self.modes
    }

    pub fn supports(&self, mode: SignMode) -> bool {
        self.handlers.contains_key(&mode)
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Dispatch to the handler for `mode`
    pub fn get_sign_bytes(
        &self,
        mode: SignMode,
        ctx: &SignContext,
        signer_data: &SignerData,
        tx_data: &TxData,
    ) -> TxSignResult<Vec<u8>> {
        let handler = self.get(mode)?;
        tracing::debug!(
            mode = %mode,
            signer = %Redacted::address(&signer_data.address),
            "computing sign bytes"
        );
        handler.get_sign_bytes(ctx, signer_data, tx_data)
    }
}

impl fmt::Debug for HandlerMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMap")
            .field("default_mode", &self.default_mode)
            .field("modes", &self.modes)
            .finish()
    }
}
