//! Log Field Redaction
//!
//! Helpers for emitting `tracing` events without leaking full signer
//! addresses or sign-byte digests. The library never installs a
//! subscriber; it only shapes the fields it records.
//!
//! ```ignore
//! tracing::debug!(signer = %Redacted::address(&data.address), "computing sign bytes");
//! ```

use std::fmt;

/// Display wrapper that redacts its value when formatted
#[derive(Debug, Clone)]
pub struct Redacted(String);

impl Redacted {
    /// Partially redact an address
    pub fn address(address: &str) -> Self {
        Self(redact_address(address))
    }

    /// Partially redact a hex digest
    pub fn hash(hash: &str) -> Self {
        Self(redact_hash(hash))
    }

    /// Hex-encode bytes, then partially redact them as a digest
    pub fn bytes(bytes: &[u8]) -> Self {
        Self(redact_hash(&hex::encode(bytes)))
    }

    /// Redact based on the field name
    pub fn field(key: &str, value: &str) -> Self {
        Self(redact_if_sensitive(key, value))
    }
}

impl fmt::Display for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Redact a value if the key suggests it's sensitive
pub fn redact_if_sensitive(key: &str, value: &str) -> String {
    let key_lower = key.to_lowercase();

    // Signer fields of messages, and fee payer or granter
    let address_keys = ["address", "signer", "sender", "authority", "payer", "granter"];
    if address_keys.iter().any(|k| key_lower.contains(k)) {
        return redact_address(value);
    }

    let hash_keys = ["hash", "digest", "sign_bytes"];
    if hash_keys.iter().any(|k| key_lower.contains(k)) {
        return redact_hash(value);
    }

    value.to_string()
}

/// Fully redact a sensitive value
pub fn redact_value(value: &str) -> String {
    if value.is_empty() {
        return "[EMPTY]".to_string();
    }

    let len = value.len();
    if len <= 4 {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED:{}chars]", len)
    }
}

/// Partially redact an address (show the prefix and last 4 chars)
pub fn redact_address(address: &str) -> String {
    let trimmed = address.trim();

    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }
    if trimmed.len() <= 10 || !trimmed.is_ascii() {
        return redact_value(trimmed);
    }

    // Keep the full bech32 human-readable part when there is one
    let prefix_len = match trimmed.rfind('1') {
        Some(sep) if sep + 4 <= trimmed.len() / 2 => sep + 4,
        _ => 6,
    };
    let suffix_len = 4;

    if trimmed.len() <= prefix_len + suffix_len + 3 {
        return redact_value(trimmed);
    }

    let prefix = &trimmed[..prefix_len];
    let suffix = &trimmed[trimmed.len() - suffix_len..];

    format!("{}...{}", prefix, suffix)
}

/// Partially redact a hash (show first 10 and last 6 chars)
pub fn redact_hash(hash: &str) -> String {
    let trimmed = hash.trim();

    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }
    if trimmed.len() <= 20 || !trimmed.is_ascii() {
        return trimmed.to_string();
    }

    let prefix = &trimmed[..10];
    let suffix = &trimmed[trimmed.len() - 6..];

    format!("{}...{}", prefix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_value() {
        assert_eq!(redact_value(""), "[EMPTY]");
        assert_eq!(redact_value("abc"), "[REDACTED]");
        assert_eq!(redact_value("0123456789abcdef"), "[REDACTED:16chars]");
    }

    #[test]
    fn test_redact_address() {
        let addr = "cosmos1hsk6jryyqjfhp5dhc55tc9jtckygx0eph6dd02";
        let redacted = redact_address(addr);
        assert_eq!(redacted, "cosmos1hsk...dd02");

        let valoper = "cosmosvaloper1hsk6jryyqjfhp5dhc55tc9jtckygx0eph6dd02";
        assert_eq!(redact_address(valoper), "cosmosvaloper1hsk...dd02");

        assert_eq!(redact_address("short"), "[REDACTED:5chars]");
    }

    #[test]
    fn test_redact_hash() {
        let hash = "1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
        let redacted = redact_hash(hash);
        assert_eq!(redacted, "1234567890...abcdef");
        assert_eq!(redact_hash("abcd"), "abcd");
    }

    #[test]
    fn test_redact_if_sensitive() {
        let sender = redact_if_sensitive(
            "sender",
            "cosmos1hsk6jryyqjfhp5dhc55tc9jtckygx0eph6dd02",
        );
        assert_eq!(sender, "cosmos1hsk...dd02");

        let addr = redact_if_sensitive(
            "fee_payer",
            "cosmos1hsk6jryyqjfhp5dhc55tc9jtckygx0eph6dd02",
        );
        assert!(addr.contains("..."));

        assert_eq!(redact_if_sensitive("chain_id", "cosmoshub-4"), "cosmoshub-4");
    }

    #[test]
    fn test_redacted_display() {
        let bytes = [0xabu8; 32];
        let shown = Redacted::bytes(&bytes).to_string();
        assert!(shown.starts_with("abababab"));
        assert!(shown.contains("..."));
        assert_eq!(Redacted::field("memo", "hi").to_string(), "hi");
    }
}
