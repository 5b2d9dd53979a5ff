//! Utilities Module
//!
//! Common utilities used across the crate.

pub mod json;
pub mod logging;

pub use json::{canonical_json_bytes, to_canonical_json};
pub use logging::Redacted;
