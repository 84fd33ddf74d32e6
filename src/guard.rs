//! Convenience facade composing the three engines.
//!
//! `TotpGuard` is a plain value, not a process-wide singleton: construct
//! one with the production capabilities via [`TotpGuard::new`], or inject
//! fakes with [`TotpGuard::with_providers`] to drive every operation
//! deterministically in tests.

use zeroize::Zeroize;

use crate::backup::{self, BackupCodeManager};
use crate::envelope::{EncryptionEngine, EncryptionEnvelope};
use crate::provider::{BcryptHasher, Clock, CodeHasher, CryptoProvider, SystemClock, SystemCrypto};
use crate::totp::TotpEngine;
use crate::types::{
    Algorithm, BackupCodeVerification, BackupCodes, TotpData, TotpError, TotpErrorKind,
    VerifyResult,
};
use crate::{qr, uri};

/// One-stop surface over TOTP codes, secret envelopes, backup codes, and
/// provisioning output.
#[derive(Debug, Clone)]
pub struct TotpGuard<C = SystemCrypto, H = BcryptHasher, K = SystemClock> {
    totp: TotpEngine<C, K>,
    envelope: EncryptionEngine<C>,
    backup: BackupCodeManager<C, H>,
}

impl TotpGuard {
    /// Production wiring: OS randomness, RustCrypto primitives, bcrypt,
    /// system clock.
    pub fn new() -> Self {
        Self::with_providers(SystemCrypto, BcryptHasher::new(), SystemClock)
    }
}

impl Default for TotpGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, H, K> TotpGuard<C, H, K>
where
    C: CryptoProvider + Clone,
    H: CodeHasher,
    K: Clock,
{
    pub fn with_providers(crypto: C, hasher: H, clock: K) -> Self {
        Self {
            totp: TotpEngine::with_providers(crypto.clone(), clock),
            envelope: EncryptionEngine::with_provider(crypto.clone()),
            backup: BackupCodeManager::with_providers(crypto, hasher),
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  TOTP
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Generate a fresh base-32 secret of `length_bytes` random bytes.
    pub fn generate_totp_secret(&self, length_bytes: usize) -> Result<String, TotpError> {
        self.totp.generate_secret(length_bytes)
    }

    /// Generate the code for the current time.
    pub fn generate_totp_code(
        &self,
        secret: &str,
        algorithm: Algorithm,
        digits: u8,
        period: u64,
    ) -> Result<String, TotpError> {
        self.totp.generate_code(secret, algorithm, digits, period)
    }

    /// Generate the code for an explicit unix timestamp.
    pub fn generate_totp_code_at(
        &self,
        secret: &str,
        algorithm: Algorithm,
        digits: u8,
        period: u64,
        unix_seconds: u64,
    ) -> Result<String, TotpError> {
        self.totp
            .generate_code_at(secret, algorithm, digits, period, unix_seconds)
    }

    /// Verify a code against the current time, tolerating `window`
    /// periods of clock drift either side.
    pub fn verify_totp_code(
        &self,
        secret: &str,
        code: &str,
        window: u32,
        algorithm: Algorithm,
        digits: u8,
        period: u64,
    ) -> Result<VerifyResult, TotpError> {
        self.totp
            .verify_code(secret, code, window, algorithm, digits, period)
    }

    /// Seconds until the current code expires.
    pub fn remaining_seconds(&self, period: u64) -> Result<u64, TotpError> {
        self.totp.remaining_seconds(period)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Secret encryption
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Seal a plaintext secret under a 32-byte key.
    pub fn encrypt(&self, plaintext: &str, key: &[u8]) -> Result<EncryptionEnvelope, TotpError> {
        self.envelope.seal(plaintext.as_bytes(), key)
    }

    /// Open an envelope back to the plaintext string.
    pub fn decrypt(&self, envelope: &EncryptionEnvelope, key: &[u8]) -> Result<String, TotpError> {
        let mut bytes = self.envelope.open(envelope, key)?;
        match String::from_utf8(std::mem::take(&mut bytes)) {
            Ok(text) => Ok(text),
            Err(e) => {
                let mut bytes = e.into_bytes();
                bytes.zeroize();
                Err(TotpError::new(
                    TotpErrorKind::InvalidInput,
                    "decrypted payload is not valid UTF-8",
                ))
            }
        }
    }

    /// Generate a fresh 256-bit encryption key. The caller owns it; no
    /// copy is retained.
    pub fn generate_encryption_key(&self) -> Result<[u8; 32], TotpError> {
        self.envelope.generate_key()
    }

    /// Re-seal an envelope under a new key.
    pub fn rotate_key(
        &self,
        envelope: &EncryptionEnvelope,
        old_key: &[u8],
        new_key: &[u8],
    ) -> Result<EncryptionEnvelope, TotpError> {
        self.envelope.rotate_key(envelope, old_key, new_key)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Provisioning
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// The `otpauth://` URI for an authenticator app.
    pub fn otpauth_uri(&self, data: &TotpData) -> String {
        uri::build_otpauth_uri(data)
    }

    /// QR code PNG for a provisioning URI.
    pub fn qr_code_png(&self, uri: &str, size_px: u32) -> Result<Vec<u8>, TotpError> {
        qr::uri_to_png(uri, size_px)
    }

    /// QR code PNG as base64, for embedding without a file.
    pub fn qr_code_base64(&self, uri: &str, size_px: u32) -> Result<String, TotpError> {
        qr::uri_to_base64_png(uri, size_px)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Backup codes
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Generate a set of single-use backup codes with storage hashes.
    pub fn generate_backup_codes(
        &self,
        count: usize,
        length: usize,
    ) -> Result<BackupCodes, TotpError> {
        self.backup.generate(count, length)
    }

    /// Verify a backup code against stored hashes.
    pub fn verify_backup_code(
        &self,
        code: &str,
        hashed_codes: &[String],
    ) -> Result<BackupCodeVerification, TotpError> {
        self.backup.verify(code, hashed_codes)
    }

    /// Format a backup code for display.
    pub fn format_backup_code(&self, code: &str, group_size: usize, separator: &str) -> String {
        backup::format_code(code, group_size, separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DEFAULT_DIGITS, DEFAULT_PERIOD, DEFAULT_WINDOW};

    /// Clock pinned to a fixed instant.
    #[derive(Debug, Clone, Copy)]
    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn unix_seconds(&self) -> u64 {
            self.0
        }
    }

    fn guard_at(unix_seconds: u64) -> TotpGuard<SystemCrypto, BcryptHasher, FixedClock> {
        TotpGuard::with_providers(
            SystemCrypto,
            BcryptHasher::with_cost(4),
            FixedClock(unix_seconds),
        )
    }

    const RFC_SECRET_SHA1: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    // ── End-to-end TOTP with an injected clock ───────────────────

    #[test]
    fn facade_generates_and_verifies_against_injected_clock() {
        let guard = guard_at(59);
        let code = guard
            .generate_totp_code(RFC_SECRET_SHA1, Algorithm::Sha1, DEFAULT_DIGITS, DEFAULT_PERIOD)
            .unwrap();
        assert_eq!(code, "287082");

        let result = guard
            .verify_totp_code(
                RFC_SECRET_SHA1,
                &code,
                DEFAULT_WINDOW,
                Algorithm::Sha1,
                DEFAULT_DIGITS,
                DEFAULT_PERIOD,
            )
            .unwrap();
        assert!(result.valid);
        assert_eq!(result.drift, 0);
    }

    #[test]
    fn facade_remaining_seconds_uses_injected_clock() {
        assert_eq!(guard_at(59).remaining_seconds(30).unwrap(), 1);
        assert_eq!(guard_at(60).remaining_seconds(30).unwrap(), 30);
    }

    #[test]
    fn enrollment_flow() {
        let guard = guard_at(1_700_000_000);
        let secret = guard.generate_totp_secret(32).unwrap();

        // Secret goes into the provisioning URI and QR for the app...
        let data = TotpData::new(&secret, "Example", "alice@example.com");
        let uri = guard.otpauth_uri(&data);
        assert!(uri.contains(&secret));
        let png = guard.qr_code_png(&uri, 300).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");

        // ...and the app's next code round-trips through verification.
        let code = guard
            .generate_totp_code(&secret, Algorithm::Sha1, 6, 30)
            .unwrap();
        let result = guard
            .verify_totp_code(&secret, &code, 1, Algorithm::Sha1, 6, 30)
            .unwrap();
        assert!(result.valid);
    }

    // ── Secret-at-rest flow ──────────────────────────────────────

    #[test]
    fn encrypt_decrypt_string_roundtrip() {
        let guard = guard_at(0);
        let key = guard.generate_encryption_key().unwrap();
        let sealed = guard.encrypt("JBSWY3DPEHPK3PXP", &key).unwrap();
        assert_eq!(guard.decrypt(&sealed, &key).unwrap(), "JBSWY3DPEHPK3PXP");
    }

    #[test]
    fn rotate_key_through_facade() {
        let guard = guard_at(0);
        let k1 = guard.generate_encryption_key().unwrap();
        let k2 = guard.generate_encryption_key().unwrap();
        let sealed = guard.encrypt("secret", &k1).unwrap();
        let rotated = guard.rotate_key(&sealed, &k1, &k2).unwrap();
        assert_eq!(guard.decrypt(&rotated, &k2).unwrap(), "secret");
        assert!(guard.decrypt(&rotated, &k1).is_err());
    }

    // ── Backup codes through the facade ──────────────────────────

    #[test]
    fn backup_code_flow() {
        let guard = guard_at(0);
        let codes = guard.generate_backup_codes(10, 8).unwrap();

        let result = guard
            .verify_backup_code(&codes.plain[7], &codes.hashed)
            .unwrap();
        assert!(result.valid);
        assert_eq!(result.matched_index, Some(7));

        let miss = guard.verify_backup_code("22222222", &codes.hashed).unwrap();
        assert!(!miss.valid);

        assert_eq!(guard.format_backup_code("ABCDEFGH", 4, "-"), "ABCD-EFGH");
    }
}
