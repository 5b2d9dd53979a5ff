//! Sign-Mode Handlers
//!
//! A sign mode is a convention for turning a transaction plus per-signer
//! metadata into the exact bytes a key signs. Each convention is implemented
//! by a [`SignModeHandler`]:
//!
//! - [`DirectHandler`]: protobuf `SignDoc` over the transmitted bytes
//! - [`DirectAuxHandler`]: `SignDocDirectAux` for signers other than the fee payer
//! - [`AminoJsonHandler`]: sorted-key JSON `StdSignDoc`
//! - [`TextualHandler`]: human-readable screens for signing devices
//!
//! Handlers are collected into a [`HandlerMap`] which dispatches on
//! [`SignMode`]. The built-in handlers are constructed through the
//! [`HandlerRegistry`] table so embedders can add or replace constructors.
//!
//! # Determinism
//!
//! Every handler must return identical bytes for identical inputs, across
//! calls and across independently constructed handler instances. Any
//! divergence breaks signature verification network-wide.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{TxSignError, TxSignResult};
use crate::types::{SignMode, SignerData, TxData};

pub mod aminojson;
pub mod context;
pub mod direct;
pub mod direct_aux;
pub mod handler_map;
pub mod options;
pub mod registry;
pub mod textual;

pub use aminojson::AminoJsonHandler;
pub use context::SigningContext;
pub use direct::DirectHandler;
pub use direct_aux::DirectAuxHandler;
pub use handler_map::HandlerMap;
pub use options::{
    new_default_signing_options, FileResolver, MessageDescriptor, SigningOptions, TypeRegistry,
    TypeResolver,
};
pub use registry::{HandlerConstructor, HandlerDeps, HandlerRegistry};
pub use textual::{CoinMetadata, CoinMetadataQuerier, Screen, TextualHandler};

// =============================================================================
// Handler Trait
// =============================================================================

/// Produces canonical sign bytes for one sign mode.
///
/// Implementations are immutable after construction and shared across
/// threads as `Arc<dyn SignModeHandler>`.
pub trait SignModeHandler: Send + Sync {
    /// The mode this handler implements.
    fn mode(&self) -> SignMode;

    /// Compute the bytes to sign.
    ///
    /// # Errors
    ///
    /// Returns [`TxSignError::MalformedInput`] when the signer or transaction
    /// data cannot be represented in this mode, and
    /// [`TxSignError::Cancelled`] or [`TxSignError::DeadlineExceeded`] when
    /// `ctx` is interrupted before the bytes are produced.
    fn get_sign_bytes(
        &self,
        ctx: &SignContext,
        signer_data: &SignerData,
        tx_data: &TxData,
    ) -> TxSignResult<Vec<u8>>;
}

impl fmt::Debug for dyn SignModeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignModeHandler({})", self.mode())
    }
}

// =============================================================================
// Call Context
// =============================================================================

/// Cancellation flag and optional deadline for a single signing call.
///
/// Clones share the cancellation flag, so a clone kept by the caller can
/// cancel work running on another thread.
#[derive(Debug, Clone, Default)]
pub struct SignContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl SignContext {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail if the context was cancelled or its deadline passed
    pub fn check(&self) -> TxSignResult<()> {
        if self.is_cancelled() {
            return Err(TxSignError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(TxSignError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
