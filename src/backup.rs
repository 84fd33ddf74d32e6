//! Single-use backup codes for when the time-based factor is unavailable.
//!
//! Codes are bearer secrets: they are drawn from the capability's
//! randomness, handed to the user once in plain form, and stored only as
//! one-way hashes. The caller removes a hash from its stored set after a
//! successful verification; the manager itself is stateless.

use crate::provider::{BcryptHasher, CodeHasher, CryptoProvider, SystemCrypto};
use crate::types::{BackupCodeVerification, BackupCodes, TotpError, TotpErrorKind};

/// Code alphabet: `A-Z` and `2-9` without the visually ambiguous
/// `0`, `1`, `I`, `O`. Exactly 32 symbols, so masking a random byte to
/// five bits selects uniformly.
const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Default display grouping.
const DISPLAY_GROUP: usize = 4;
const DISPLAY_SEPARATOR: &str = "-";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Manager
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Backup code generation and verification over injected capabilities.
#[derive(Debug, Clone)]
pub struct BackupCodeManager<C = SystemCrypto, H = BcryptHasher> {
    crypto: C,
    hasher: H,
}

impl BackupCodeManager {
    /// Manager over the OS random source and bcrypt at the default cost.
    pub fn new() -> Self {
        Self {
            crypto: SystemCrypto,
            hasher: BcryptHasher::new(),
        }
    }
}

impl Default for BackupCodeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CryptoProvider, H: CodeHasher> BackupCodeManager<C, H> {
    pub fn with_providers(crypto: C, hasher: H) -> Self {
        Self { crypto, hasher }
    }

    /// Generate `count` codes of `length` characters each, along with
    /// their storage hashes and display forms.
    ///
    /// Uniqueness across the set is not enforced: with 32^length
    /// possibilities a collision among `count` codes is negligible.
    pub fn generate(&self, count: usize, length: usize) -> Result<BackupCodes, TotpError> {
        if count == 0 || length == 0 {
            return Err(TotpError::new(
                TotpErrorKind::InvalidInput,
                "backup code count and length must be at least 1",
            ));
        }

        let random = self.crypto.random_bytes(count * length)?;
        let plain: Vec<String> = random
            .chunks_exact(length)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|&b| CODE_ALPHABET[(b & 0x1f) as usize] as char)
                    .collect()
            })
            .collect();

        let hashed = plain
            .iter()
            .map(|code| self.hasher.hash(code))
            .collect::<Result<Vec<_>, _>>()?;
        let formatted = plain
            .iter()
            .map(|code| format_code(code, DISPLAY_GROUP, DISPLAY_SEPARATOR))
            .collect();

        log::debug!("generated {} backup codes of length {}", count, length);
        Ok(BackupCodes {
            plain,
            hashed,
            formatted,
        })
    }

    /// Verify a code against a stored hash set.
    ///
    /// Scans entries in order and stops at the first match; the hash
    /// capability's own constant-time comparison is the timing boundary.
    /// Returns the matched index so the caller can retire the hash.
    pub fn verify(
        &self,
        code: &str,
        hashed_codes: &[String],
    ) -> Result<BackupCodeVerification, TotpError> {
        for (index, hash) in hashed_codes.iter().enumerate() {
            if self.hasher.verify(code, hash)? {
                return Ok(BackupCodeVerification {
                    valid: true,
                    matched_index: Some(index),
                });
            }
        }
        Ok(BackupCodeVerification {
            valid: false,
            matched_index: None,
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Display formatting
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Split a code into `group_size`-character groups joined by `separator`.
/// Purely presentational.
pub fn format_code(code: &str, group_size: usize, separator: &str) -> String {
    if group_size == 0 {
        return code.to_string();
    }
    let chars: Vec<char> = code.chars().collect();
    chars
        .chunks(group_size)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> BackupCodeManager<SystemCrypto, BcryptHasher> {
        // Minimum bcrypt cost keeps the hashing fast under test.
        BackupCodeManager::with_providers(SystemCrypto, BcryptHasher::with_cost(4))
    }

    // ── Generation ───────────────────────────────────────────────

    #[test]
    fn generate_produces_parallel_sets() {
        let codes = manager().generate(10, 8).unwrap();
        assert_eq!(codes.plain.len(), 10);
        assert_eq!(codes.hashed.len(), 10);
        assert_eq!(codes.formatted.len(), 10);
        for code in &codes.plain {
            assert_eq!(code.len(), 8);
        }
    }

    #[test]
    fn codes_use_only_the_restricted_alphabet() {
        let codes = manager().generate(20, 12).unwrap();
        for code in &codes.plain {
            for c in code.bytes() {
                assert!(CODE_ALPHABET.contains(&c), "unexpected char {}", c as char);
                assert!(!b"01IO".contains(&c));
            }
        }
    }

    #[test]
    fn hashes_are_not_the_plain_codes() {
        let codes = manager().generate(3, 8).unwrap();
        for (plain, hash) in codes.plain.iter().zip(&codes.hashed) {
            assert_ne!(plain, hash);
        }
    }

    #[test]
    fn each_plain_code_matches_its_own_hash() {
        let m = manager();
        let codes = m.generate(5, 8).unwrap();
        for (i, plain) in codes.plain.iter().enumerate() {
            let result = m.verify(plain, &codes.hashed).unwrap();
            assert!(result.valid);
            assert_eq!(result.matched_index, Some(i));
        }
    }

    #[test]
    fn generate_rejects_zero_parameters() {
        let m = manager();
        assert_eq!(
            m.generate(0, 8).unwrap_err().kind,
            TotpErrorKind::InvalidInput
        );
        assert_eq!(
            m.generate(10, 0).unwrap_err().kind,
            TotpErrorKind::InvalidInput
        );
    }

    // ── Verification ─────────────────────────────────────────────

    #[test]
    fn unknown_code_is_rejected() {
        let m = manager();
        let codes = m.generate(4, 8).unwrap();
        let result = m.verify("ZZZZZZZZ", &codes.hashed).unwrap();
        assert!(!result.valid);
        assert!(result.matched_index.is_none());
    }

    #[test]
    fn empty_hash_set_is_rejected() {
        let result = manager().verify("ABCD2345", &[]).unwrap();
        assert!(!result.valid);
    }

    // ── Formatting ───────────────────────────────────────────────

    #[test]
    fn format_groups_of_four() {
        assert_eq!(format_code("ABCDEFGH", 4, "-"), "ABCD-EFGH");
        assert_eq!(format_code("ABCDEFGHJK", 4, "-"), "ABCD-EFGH-JK");
    }

    #[test]
    fn format_other_groupings() {
        assert_eq!(format_code("ABCDEF", 2, " "), "AB CD EF");
        assert_eq!(format_code("ABC", 8, "-"), "ABC");
        assert_eq!(format_code("ABCDEF", 0, "-"), "ABCDEF");
        assert_eq!(format_code("", 4, "-"), "");
    }

    #[test]
    fn formatted_codes_strip_back_to_plain() {
        let codes = manager().generate(3, 8).unwrap();
        for (plain, formatted) in codes.plain.iter().zip(&codes.formatted) {
            assert_eq!(&formatted.replace('-', ""), plain);
        }
    }
}
