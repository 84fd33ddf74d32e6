//! TOTP code derivation and verification — RFC 6238 over RFC 4226.
//!
//! Codes are derived from a time-step counter, never from the raw
//! timestamp, so a code is stable within its period and unpredictable
//! across periods. Verification tolerates clock drift through a symmetric
//! window searched outward from the current counter, and compares codes
//! in constant time.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::base32;
use crate::provider::{Clock, CryptoProvider, SystemClock, SystemCrypto};
use crate::types::{Algorithm, TotpError, TotpErrorKind, VerifyResult};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Time-step helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Time-step counter for a unix timestamp. `period` must be non-zero.
pub fn time_step_at(unix_seconds: u64, period: u64) -> u64 {
    debug_assert!(period > 0);
    unix_seconds / period
}

/// Seconds until the code for `unix_seconds` expires, in `[1, period]`.
/// A fresh code has the full period left. `period` must be non-zero.
pub fn remaining_seconds_at(unix_seconds: u64, period: u64) -> u64 {
    debug_assert!(period > 0);
    period - (unix_seconds % period)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// TOTP engine over an injected crypto provider and clock.
#[derive(Debug, Clone)]
pub struct TotpEngine<C = SystemCrypto, K = SystemClock> {
    crypto: C,
    clock: K,
}

impl TotpEngine {
    /// Engine over the OS random source, RustCrypto primitives, and the
    /// system clock.
    pub fn new() -> Self {
        Self {
            crypto: SystemCrypto,
            clock: SystemClock,
        }
    }
}

impl Default for TotpEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CryptoProvider, K: Clock> TotpEngine<C, K> {
    pub fn with_providers(crypto: C, clock: K) -> Self {
        Self { crypto, clock }
    }

    // ── Secret generation ────────────────────────────────────────

    /// Generate a fresh secret of `length_bytes` random bytes, returned
    /// as base-32 text.
    pub fn generate_secret(&self, length_bytes: usize) -> Result<String, TotpError> {
        let mut raw = self.crypto.random_bytes(length_bytes)?;
        let encoded = base32::encode(&raw);
        raw.zeroize();
        Ok(encoded)
    }

    // ── Code generation ──────────────────────────────────────────

    /// Generate the code for the current clock time.
    pub fn generate_code(
        &self,
        secret: &str,
        algorithm: Algorithm,
        digits: u8,
        period: u64,
    ) -> Result<String, TotpError> {
        self.generate_code_at(secret, algorithm, digits, period, self.clock.unix_seconds())
    }

    /// Generate the code for an explicit unix timestamp.
    ///
    /// Deterministic in (secret, counter, algorithm, digits).
    pub fn generate_code_at(
        &self,
        secret: &str,
        algorithm: Algorithm,
        digits: u8,
        period: u64,
        unix_seconds: u64,
    ) -> Result<String, TotpError> {
        check_params(digits, period)?;
        let mut key = base32::decode(secret);
        let result = self.hotp(&key, time_step_at(unix_seconds, period), digits, algorithm);
        key.zeroize();
        result
    }

    // ── Verification ─────────────────────────────────────────────

    /// Verify a code against the current clock time.
    pub fn verify_code(
        &self,
        secret: &str,
        code: &str,
        window: u32,
        algorithm: Algorithm,
        digits: u8,
        period: u64,
    ) -> Result<VerifyResult, TotpError> {
        self.verify_code_at(
            secret,
            code,
            window,
            algorithm,
            digits,
            period,
            self.clock.unix_seconds(),
        )
    }

    /// Verify a code at an explicit unix timestamp.
    ///
    /// A code of the wrong length, or containing a non-digit, is invalid
    /// (not an error). Candidate counters are checked current-first, then
    /// stepping outward (`c, c-1, c+1, ..., c-window, c+window`), so the
    /// in-sync case does the least work; the first match wins.
    #[allow(clippy::too_many_arguments)]
    pub fn verify_code_at(
        &self,
        secret: &str,
        code: &str,
        window: u32,
        algorithm: Algorithm,
        digits: u8,
        period: u64,
        unix_seconds: u64,
    ) -> Result<VerifyResult, TotpError> {
        check_params(digits, period)?;
        if code.len() != digits as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(VerifyResult::invalid());
        }

        let base = time_step_at(unix_seconds, period);
        let mut key = base32::decode(secret);
        let result = self.scan_window(&key, code, base, window, digits, algorithm);
        key.zeroize();
        result
    }

    fn scan_window(
        &self,
        key: &[u8],
        code: &str,
        base: u64,
        window: u32,
        digits: u8,
        algorithm: Algorithm,
    ) -> Result<VerifyResult, TotpError> {
        for drift in window_offsets(window) {
            let counter = match drift {
                d if d < 0 => base.checked_sub(d.unsigned_abs()),
                d => base.checked_add(d as u64),
            };
            let Some(counter) = counter else { continue };

            let candidate = self.hotp(key, counter, digits, algorithm)?;
            if bool::from(candidate.as_bytes().ct_eq(code.as_bytes())) {
                return Ok(VerifyResult {
                    valid: true,
                    drift,
                    matched_counter: Some(counter),
                });
            }
        }
        Ok(VerifyResult::invalid())
    }

    // ── Expiry ───────────────────────────────────────────────────

    /// Seconds until the current code expires.
    pub fn remaining_seconds(&self, period: u64) -> Result<u64, TotpError> {
        check_params(1, period)?;
        Ok(remaining_seconds_at(self.clock.unix_seconds(), period))
    }

    // ── HOTP core (RFC 4226 §5.3) ────────────────────────────────

    fn hotp(
        &self,
        key: &[u8],
        counter: u64,
        digits: u8,
        algorithm: Algorithm,
    ) -> Result<String, TotpError> {
        let mac = self.crypto.hmac(algorithm, key, &counter.to_be_bytes())?;
        Ok(truncate(&mac, digits))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Internals
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Dynamic truncation per RFC 4226 §5.3: the low nibble of the final MAC
/// byte selects a 4-byte big-endian slice, the top bit is masked off, and
/// the value is reduced modulo `10^digits` and zero-padded.
fn truncate(mac: &[u8], digits: u8) -> String {
    let offset = (mac[mac.len() - 1] & 0x0f) as usize;
    let binary = ((mac[offset] as u32 & 0x7f) << 24)
        | ((mac[offset + 1] as u32) << 16)
        | ((mac[offset + 2] as u32) << 8)
        | (mac[offset + 3] as u32);

    // The 31-bit value has at most 10 decimal digits; wider requests only
    // add zero padding.
    let code = if digits >= 10 {
        binary as u64
    } else {
        binary as u64 % 10u64.pow(digits as u32)
    };
    format!("{:0>width$}", code, width = digits as usize)
}

/// Drift offsets in search order: 0, -1, +1, -2, +2, ...
fn window_offsets(window: u32) -> impl Iterator<Item = i64> {
    std::iter::once(0i64).chain((1..=window as i64).flat_map(|i| [-i, i]))
}

fn check_params(digits: u8, period: u64) -> Result<(), TotpError> {
    if digits == 0 {
        return Err(TotpError::new(
            TotpErrorKind::InvalidInput,
            "digits must be at least 1",
        ));
    }
    if period == 0 {
        return Err(TotpError::new(
            TotpErrorKind::InvalidInput,
            "period must be a positive number of seconds",
        ));
    }
    Ok(())
}
