//! `SIGN_MODE_TEXTUAL`
//!
//! Renders a transaction as an ordered list of human-readable [`Screen`]s
//! suitable for a hardware wallet display, then encodes the list with the
//! canonical JSON writer. Screens follow this order:
//!
//! 1. Chain id, account number, sequence, signer address, public key (expert)
//! 2. Message count, then each message and its fields
//! 3. Memo, fees, fee payer, fee granter
//! 4. Gas limit and timeout height (expert)
//! 5. Extension options (expert)
//! 6. Hash of raw bytes (expert)
//!
//! The final hash binds the rendering to the exact transmitted bytes:
//! hex SHA-256 over `len(body) || body || len(auth_info) || auth_info` with
//! 8-byte big-endian lengths.
//!
//! Coin amounts are converted to their display denomination through a
//! [`CoinMetadataQuerier`]. Each render pass caches lookups by denom.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{TxSignError, TxSignResult};
use crate::proto::{Any, Coin};
use crate::signing::context::SigningContext;
use crate::signing::{SignContext, SignModeHandler};
use crate::types::{SignMode, SignerData, TxData};
use crate::utils::json::to_canonical_json;
use crate::utils::logging::Redacted;

// =============================================================================
// Coin Metadata
// =============================================================================

/// Display information for one denomination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinMetadata {
    /// Smallest unit, as used on chain (e.g. `uatom`)
    pub base: String,
    /// Unit shown to users (e.g. `ATOM`)
    pub display: String,
    /// `1 display = 10^exponent base`
    pub exponent: u32,
}

/// Looks up denomination metadata; may block
pub trait CoinMetadataQuerier: Send + Sync {
    /// `Ok(None)` means the denom has no metadata and is shown as-is.
    fn query(&self, ctx: &SignContext, denom: &str) -> TxSignResult<Option<CoinMetadata>>;
}

impl<F> CoinMetadataQuerier for F
where
    F: Fn(&SignContext, &str) -> TxSignResult<Option<CoinMetadata>> + Send + Sync,
{
    fn query(&self, ctx: &SignContext, denom: &str) -> TxSignResult<Option<CoinMetadata>> {
        self(ctx, denom)
    }
}

// =============================================================================
// Screens
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub indent: u32,
    /// Only shown when the device is in expert mode
    #[serde(default, skip_serializing_if = "is_false")]
    pub expert: bool,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Screen {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            indent: 0,
            expert: false,
        }
    }

    pub fn indent(mut self, indent: u32) -> Self {
        self.indent = indent;
        self
    }

    pub fn expert(mut self) -> Self {
        self.expert = true;
        self
    }
}

// =============================================================================
// Number Formatting
// =============================================================================

/// Group an unsigned decimal integer string in thousands with `'`
pub fn format_integer(digits: &str) -> TxSignResult<String> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TxSignError::malformed(format!("invalid integer '{}'", digits)));
    }
    let trimmed = digits.trim_start_matches('0');
    let trimmed = if trimmed.is_empty() { "0" } else { trimmed };

    let mut out = String::with_capacity(trimmed.len() + trimmed.len() / 3);
    for (i, c) in trimmed.chars().enumerate() {
        if i > 0 && (trimmed.len() - i) % 3 == 0 {
            out.push('\'');
        }
        out.push(c);
    }
    Ok(out)
}

/// Divide an integer amount by `10^exponent`, trimming trailing zeros
pub fn format_decimal(amount: &str, exponent: u32) -> TxSignResult<String> {
    format_integer(amount)?;
    let digits = amount.trim_start_matches('0');
    let exponent = exponent as usize;

    let padded = if digits.len() <= exponent {
        format!("{}{}", "0".repeat(exponent + 1 - digits.len()), digits)
    } else {
        digits.to_string()
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - exponent);
    let frac_part = frac_part.trim_end_matches('0');

    let int_part = format_integer(int_part)?;
    if frac_part.is_empty() {
        Ok(int_part)
    } else {
        Ok(format!("{}.{}", int_part, frac_part))
    }
}

/// Hex SHA-256 over the length-prefixed body and auth-info bytes
pub fn raw_bytes_hash(body_bytes: &[u8], auth_info_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((body_bytes.len() as u64).to_be_bytes());
    hasher.update(body_bytes);
    hasher.update((auth_info_bytes.len() as u64).to_be_bytes());
    hasher.update(auth_info_bytes);
    hex::encode(hasher.finalize())
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// `to_address` becomes `To address`
fn field_title(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Object fields in sorted key order, independent of the map's iteration order
fn sorted_fields(
    fields: &serde_json::Map<String, serde_json::Value>,
) -> Vec<(&String, &serde_json::Value)> {
    let mut sorted: Vec<_> = fields.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
}

fn as_coin(value: &serde_json::Value) -> Option<Coin> {
    let obj = value.as_object()?;
    if obj.len() != 2 {
        return None;
    }
    Some(Coin {
        denom: obj.get("denom")?.as_str()?.to_string(),
        amount: obj.get("amount")?.as_str()?.to_string(),
    })
}

// =============================================================================
// Renderer
// =============================================================================

/// State of a single render pass
struct Renderer<'a> {
    ctx: &'a SignContext,
    querier: &'a dyn CoinMetadataQuerier,
    metadata: HashMap<String, Option<CoinMetadata>>,
    screens: Vec<Screen>,
}

impl<'a> Renderer<'a> {
    fn new(ctx: &'a SignContext, querier: &'a dyn CoinMetadataQuerier) -> Self {
        Self {
            ctx,
            querier,
            metadata: HashMap::new(),
            screens: Vec::new(),
        }
    }

    fn push(&mut self, screen: Screen) {
        self.screens.push(screen);
    }

    fn metadata(&mut self, denom: &str) -> TxSignResult<Option<CoinMetadata>> {
        if let Some(cached) = self.metadata.get(denom) {
            return Ok(cached.clone());
        }
        self.ctx.check()?;
        let found = self.querier.query(self.ctx, denom)?;
        self.metadata.insert(denom.to_string(), found.clone());
        Ok(found)
    }

    fn format_coin(&mut self, coin: &Coin) -> TxSignResult<String> {
        let exponent = match self.metadata(&coin.denom)? {
            Some(meta) if meta.base == coin.denom && meta.display != meta.base => {
                Some((meta.exponent, meta.display))
            }
            _ => None,
        };
        match exponent {
            Some((exponent, display)) => {
                Ok(format!("{} {}", format_decimal(&coin.amount, exponent)?, display))
            }
            None => Ok(format!("{} {}", format_integer(&coin.amount)?, coin.denom)),
        }
    }

    fn format_coins(&mut self, coins: &[Coin]) -> TxSignResult<String> {
        if coins.is_empty() {
            return Ok("zero".to_string());
        }
        let formatted = coins
            .iter()
            .map(|coin| self.format_coin(coin))
            .collect::<TxSignResult<Vec<_>>>()?;
        Ok(formatted.join(", "))
    }

    fn render_value(
        &mut self,
        title: &str,
        value: &serde_json::Value,
        indent: u32,
    ) -> TxSignResult<()> {
        match value {
            serde_json::Value::Null => {}
            serde_json::Value::String(s) if s.is_empty() => {}
            serde_json::Value::String(s) => {
                self.push(Screen::new(title, s.as_str()).indent(indent))
            }
            serde_json::Value::Bool(b) => {
                self.push(Screen::new(title, b.to_string()).indent(indent))
            }
            serde_json::Value::Number(n) => {
                self.push(Screen::new(title, n.to_string()).indent(indent))
            }
            serde_json::Value::Array(items) if items.is_empty() => {}
            serde_json::Value::Array(items) => {
                let coins: Option<Vec<Coin>> = items.iter().map(as_coin).collect();
                if let Some(coins) = coins {
                    let content = self.format_coins(&coins)?;
                    self.push(Screen::new(title, content).indent(indent));
                    return Ok(());
                }
                self.push(Screen::new(title, plural(items.len(), "element")).indent(indent));
                for (i, item) in items.iter().enumerate() {
                    let item_title = format!("{} ({}/{})", title, i + 1, items.len());
                    self.render_value(&item_title, item, indent + 1)?;
                }
                self.push(Screen::new("", format!("End of {}", title)).indent(indent));
            }
            serde_json::Value::Object(fields) => {
                if let Some(coin) = as_coin(value) {
                    let content = self.format_coin(&coin)?;
                    self.push(Screen::new(title, content).indent(indent));
                    return Ok(());
                }
                self.push(Screen::new(title, "Object").indent(indent));
                for (key, field) in sorted_fields(fields) {
                    self.render_value(&field_title(key), field, indent + 1)?;
                }
            }
        }
        Ok(())
    }

    fn render_anys(&mut self, label: &str, anys: &[Any]) {
        if anys.is_empty() {
            return;
        }
        self.push(
            Screen::new("", format!("This transaction has {}", plural(anys.len(), label))).expert(),
        );
        for (i, any) in anys.iter().enumerate() {
            self.push(
                Screen::new(
                    format!("{} ({}/{})", field_title(label), i + 1, anys.len()),
                    any.type_url.as_str(),
                )
                .indent(1)
                .expert(),
            );
        }
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Handler for [`SignMode::Textual`]
pub struct TextualHandler {
    querier: Arc<dyn CoinMetadataQuerier>,
    signing_context: Arc<SigningContext>,
}

impl TextualHandler {
    /// # Errors
    ///
    /// Returns [`TxSignError::Configuration`] when no querier is supplied.
    pub fn new(
        querier: Option<Arc<dyn CoinMetadataQuerier>>,
        signing_context: Arc<SigningContext>,
    ) -> TxSignResult<Self> {
        let querier = querier.ok_or_else(|| {
            TxSignError::configuration(
                "cannot enable SIGN_MODE_TEXTUAL without a coin metadata querier",
            )
        })?;
        Ok(Self {
            querier,
            signing_context,
        })
    }

    /// Render the screens without encoding them
    pub fn screens(
        &self,
        ctx: &SignContext,
        signer_data: &SignerData,
        tx_data: &TxData,
    ) -> TxSignResult<Vec<Screen>> {
        let mut r = Renderer::new(ctx, self.querier.as_ref());
        let body = &tx_data.body;
        let auth_info = &tx_data.auth_info;

        r.push(Screen::new("Chain id", signer_data.chain_id.as_str()));
        r.push(Screen::new(
            "Account number",
            format_integer(&signer_data.account_number.to_string())?,
        ));
        r.push(Screen::new(
            "Sequence",
            format_integer(&signer_data.sequence.to_string())?,
        ));
        r.push(Screen::new("Address", signer_data.address.as_str()));
        if let Some(pub_key) = &signer_data.pub_key {
            r.push(Screen::new("Public key", pub_key.full_name()).expert());
            r.push(
                Screen::new("Key", hex::encode_upper(&pub_key.value))
                    .indent(1)
                    .expert(),
            );
        }

        let count = body.messages.len();
        r.push(Screen::new(
            "",
            format!("This transaction has {}", plural(count, "Message")),
        ));
        for (i, msg) in body.messages.iter().enumerate() {
            ctx.check()?;
            let resolved = self.signing_context.resolve(msg)?;
            r.push(
                Screen::new(
                    format!("Message ({}/{})", i + 1, count),
                    resolved.descriptor.full_name(),
                )
                .indent(1),
            );
            if let serde_json::Value::Object(fields) = &resolved.json {
                for (key, value) in sorted_fields(fields) {
                    r.render_value(&field_title(key), value, 2)?;
                }
            }
        }
        if count > 0 {
            r.push(Screen::new("", "End of Message"));
        }

        if !body.memo.is_empty() {
            r.push(Screen::new("Memo", body.memo.as_str()));
        }

        let fee = auth_info.fee.clone().unwrap_or_default();
        let fees = r.format_coins(&fee.amount)?;
        r.push(Screen::new("Fees", fees));
        if !fee.payer.is_empty() {
            r.push(Screen::new("Fee payer", fee.payer.as_str()));
        }
        if !fee.granter.is_empty() {
            r.push(Screen::new("Fee granter", fee.granter.as_str()));
        }
        if fee.gas_limit != 0 {
            r.push(Screen::new("Gas limit", format_integer(&fee.gas_limit.to_string())?).expert());
        }
        if body.timeout_height != 0 {
            r.push(
                Screen::new(
                    "Timeout height",
                    format_integer(&body.timeout_height.to_string())?,
                )
                .expert(),
            );
        }

        r.render_anys("body extension option", &body.extension_options);
        r.render_anys(
            "non-critical body extension option",
            &body.non_critical_extension_options,
        );

        r.push(
            Screen::new(
                "Hash of raw bytes",
                raw_bytes_hash(&tx_data.body_bytes, &tx_data.auth_info_bytes),
            )
            .expert(),
        );

        Ok(r.screens)
    }
}

impl fmt::Debug for TextualHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextualHandler").finish_non_exhaustive()
    }
}

impl SignModeHandler for TextualHandler {
    fn mode(&self) -> SignMode {
        SignMode::Textual
    }

    fn get_sign_bytes(
        &self,
        ctx: &SignContext,
        signer_data: &SignerData,
        tx_data: &TxData,
    ) -> TxSignResult<Vec<u8>> {
        ctx.check()?;
        let screens = self.screens(ctx, signer_data, tx_data)?;
        if let Some(last) = screens.last() {
            tracing::debug!(
                screens = screens.len(),
                raw_bytes_hash = %Redacted::hash(&last.content),
                "textual screens rendered"
            );
        }
        to_canonical_json(&screens)
    }
}
