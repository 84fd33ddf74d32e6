//! Shared types: algorithm selection, provisioning data, operation results,
//! and the crate-level error.

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Defaults
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Default secret length in bytes (256 bits).
pub const DEFAULT_SECRET_LENGTH: usize = 32;
/// Default number of digits in a generated code.
pub const DEFAULT_DIGITS: u8 = 6;
/// Default time-step period in seconds.
pub const DEFAULT_PERIOD: u64 = 30;
/// Default verification drift window (periods checked either side).
pub const DEFAULT_WINDOW: u32 = 1;
/// Default number of backup codes per set.
pub const DEFAULT_BACKUP_COUNT: usize = 10;
/// Default backup code length in characters.
pub const DEFAULT_BACKUP_LENGTH: usize = 8;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Keyed-hash algorithm used for code derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Default for Algorithm {
    fn default() -> Self {
        // SHA-1 for compatibility with authenticator apps.
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri_name())
    }
}

impl Algorithm {
    /// Parse from a case-insensitive string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Some(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Some(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Canonical name for `otpauth://` parameters.
    pub fn uri_name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Provisioning data
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything an authenticator app needs to enroll a secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpData {
    /// Base-32 encoded secret key.
    pub secret: String,
    /// Service or organisation name (e.g. "GitHub").
    pub issuer: String,
    /// Account label (e.g. "user@example.com").
    pub account_name: String,
    /// Hash algorithm for code derivation.
    pub algorithm: Algorithm,
    /// Number of digits in generated codes.
    pub digits: u8,
    /// Time-step period in seconds.
    pub period: u64,
}

impl TotpData {
    /// Create provisioning data with default algorithm, digits, and period.
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        account_name: impl Into<String>,
    ) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            account_name: account_name.into(),
            algorithm: Algorithm::default(),
            digits: DEFAULT_DIGITS,
            period: DEFAULT_PERIOD,
        }
    }

    /// Builder: set algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder: set digit count.
    pub fn with_digits(mut self, digits: u8) -> Self {
        self.digits = digits;
        self
    }

    /// Builder: set time-step period.
    pub fn with_period(mut self, period: u64) -> Self {
        self.period = period;
        self
    }

    /// The `otpauth://` URI for this data.
    pub fn otpauth_uri(&self) -> String {
        crate::uri::build_otpauth_uri(self)
    }

    /// Check that the secret survives base-32 cleanup.
    pub fn is_secret_valid(&self) -> bool {
        crate::base32::is_valid(&self.secret)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of verifying a TOTP code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResult {
    pub valid: bool,
    /// Time-steps off the current counter the match was (0 = exact).
    pub drift: i64,
    /// The counter that matched, if any.
    pub matched_counter: Option<u64>,
}

impl VerifyResult {
    pub(crate) fn invalid() -> Self {
        Self {
            valid: false,
            drift: 0,
            matched_counter: None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Backup codes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A freshly generated set of backup codes.
///
/// `plain[i]` hashes to `hashed[i]`; the caller stores `hashed` and shows
/// `plain`/`formatted` to the user exactly once. Each code is single-use:
/// after a successful verification the caller removes the consumed hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupCodes {
    pub plain: Vec<String>,
    pub hashed: Vec<String>,
    pub formatted: Vec<String>,
}

/// Result of verifying a backup code against a stored hash set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupCodeVerification {
    pub valid: bool,
    /// Index of the matching hash, for the caller to remove after use.
    pub matched_index: Option<usize>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotpErrorKind {
    /// Malformed caller input: wrong key length, zero digits/period,
    /// unparseable envelope JSON.
    InvalidInput,
    /// AES-GCM tag did not verify. Deliberately covers tampered
    /// ciphertext, wrong key, and wrong nonce alike.
    AuthenticationFailed,
    /// The underlying randomness, primitive, or hashing capability failed.
    CapabilityFailure,
    /// QR rendering failed.
    QrEncodeFailed,
}

/// Crate-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpError {
    pub kind: TotpErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl TotpError {
    pub fn new(kind: TotpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for TotpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for TotpError {}

impl From<TotpError> for String {
    fn from(e: TotpError) -> String {
        e.to_string()
    }
}
