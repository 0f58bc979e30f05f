//! Address syntax checks and display helpers

use std::str::FromStr;

use alloy::primitives::Address;

/// Parse an address string the way wallets accept it: optional `0x`,
/// 40 hex digits, and a valid EIP-55 checksum whenever the input mixes case.
pub fn parse_address(input: &str) -> Option<Address> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if body.len() != 40 || hex::decode(body).is_err() {
        return None;
    }

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    let prefixed = format!("0x{}", body);
    if has_lower && has_upper {
        Address::parse_checksummed(&prefixed, None).ok()
    } else {
        Address::from_str(&prefixed).ok()
    }
}

pub fn is_address(input: &str) -> bool {
    parse_address(input).is_some()
}

/// Checksummed form used for storage and display
pub fn canonical(address: &Address) -> String {
    address.to_checksum(None)
}

/// Case-folded key used for duplicate detection
pub fn fold(address: &str) -> String {
    address.trim().to_lowercase()
}

/// `first8...last4`, used whenever the field is not being edited
pub fn short_display(address: &str) -> String {
    if address.chars().count() <= 12 {
        return address.to_string();
    }
    let start: String = address.chars().take(8).collect();
    let end: String = address
        .chars()
        .rev()
        .take(4)
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    format!("{}...{}", start, end)
}
