//! Base-32 codec for the secret's external textual form.
//!
//! RFC 4648 alphabet (`A-Z2-7`), no padding emitted. Decoding is lenient:
//! case-insensitive, and anything outside the alphabet (whitespace, dashes,
//! padding, stray punctuation) is silently dropped so that secrets typed or
//! scanned from the wild still decode. Leniency is kept deliberately for
//! compatibility with already-provisioned secrets.

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Encode / decode
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Encode bytes as base-32 text (uppercase, no padding).
pub fn encode(bytes: &[u8]) -> String {
    ::base32::encode(::base32::Alphabet::Rfc4648 { padding: false }, bytes)
}

/// Decode base-32 text to bytes.
///
/// Total function: invalid characters are discarded rather than rejected,
/// and trailing bits that cannot form a full byte are dropped. Zero-length
/// input (or input with no alphabet characters at all) yields zero bytes.
pub fn decode(input: &str) -> Vec<u8> {
    let cleaned = clean(input);
    ::base32::decode(::base32::Alphabet::Rfc4648 { padding: false }, &cleaned).unwrap_or_default()
}

/// Whether the input looks like a base-32 secret: at least one alphabet
/// character, and nothing besides alphabet characters, whitespace, dashes,
/// and padding.
pub fn is_valid(input: &str) -> bool {
    let mut seen = false;
    for c in input.trim().chars() {
        match c.to_ascii_uppercase() {
            'A'..='Z' | '2'..='7' => seen = true,
            '=' | '-' | ' ' | '\t' => {}
            _ => return false,
        }
    }
    seen
}

fn clean(input: &str) -> String {
    input
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| matches!(c, 'A'..='Z' | '2'..='7'))
        .collect()
}
