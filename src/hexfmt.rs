//! Hex formatting and parsing.
//!
//! Tag identifiers display as `04:A3:1B:...`, payload dumps as
//! `04 A3 1B ...` — both uppercase two-digit pairs.

/// Format bytes as uppercase hex pairs joined by `separator`.
pub fn to_hex(bytes: &[u8], separator: &str) -> String {
    bytes
        .iter()
        .map(|byte| format!("{:02X}", byte))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Parse a hex string, tolerating `:` and space separators in the input.
pub fn from_hex(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let clean: String = input
        .chars()
        .filter(|c| !matches!(c, ':' | ' '))
        .collect();
    hex::decode(clean)
}
