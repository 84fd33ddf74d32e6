//! Authenticated-encryption envelope for secrets at rest.
//!
//! AES-256-GCM with a fresh random 96-bit nonce per seal and the 128-bit
//! tag carried separately, so storage formats can keep the three parts
//! distinct. The crate never persists envelopes itself; `to_json` /
//! `from_json` give callers a stable interchange form with base64 fields.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::provider::{CryptoProvider, SystemCrypto};
use crate::types::{TotpError, TotpErrorKind};

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;
/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Envelope
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A sealed secret: ciphertext plus the nonce and tag needed to open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionEnvelope {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
}

/// JSON interchange form. Field names match the common storage convention
/// (`authTag` rather than `tag`).
#[derive(Serialize, Deserialize)]
struct EnvelopeRecord {
    ciphertext: String,
    nonce: String,
    #[serde(rename = "authTag")]
    auth_tag: String,
}

impl EncryptionEnvelope {
    /// Serialize to a JSON object with base64 fields.
    pub fn to_json(&self) -> Result<String, TotpError> {
        let record = EnvelopeRecord {
            ciphertext: b64_encode(&self.ciphertext),
            nonce: b64_encode(&self.nonce),
            auth_tag: b64_encode(&self.tag),
        };
        serde_json::to_string(&record).map_err(|e| {
            TotpError::new(TotpErrorKind::CapabilityFailure, "envelope serialization failed")
                .with_detail(e.to_string())
        })
    }

    /// Parse the JSON interchange form back into an envelope.
    pub fn from_json(json: &str) -> Result<Self, TotpError> {
        let record: EnvelopeRecord = serde_json::from_str(json).map_err(|e| {
            TotpError::new(TotpErrorKind::InvalidInput, "malformed envelope JSON")
                .with_detail(e.to_string())
        })?;

        let ciphertext = b64_decode(&record.ciphertext, "ciphertext")?;
        let nonce = b64_decode(&record.nonce, "nonce")?;
        let tag = b64_decode(&record.auth_tag, "authTag")?;

        Ok(Self {
            ciphertext,
            nonce: fixed_len(nonce, "nonce")?,
            tag: fixed_len(tag, "authTag")?,
        })
    }
}

fn b64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

fn b64_decode(data: &str, field: &str) -> Result<Vec<u8>, TotpError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(data).map_err(|_| {
        TotpError::new(TotpErrorKind::InvalidInput, "malformed envelope JSON")
            .with_detail(format!("field '{}' is not valid base64", field))
    })
}

fn fixed_len<const N: usize>(bytes: Vec<u8>, field: &str) -> Result<[u8; N], TotpError> {
    <[u8; N]>::try_from(bytes).map_err(|v: Vec<u8>| {
        TotpError::new(TotpErrorKind::InvalidInput, "malformed envelope JSON").with_detail(
            format!("field '{}' must be {} bytes, got {}", field, N, v.len()),
        )
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Seal/open engine over an injected crypto provider.
#[derive(Debug, Clone)]
pub struct EncryptionEngine<C = SystemCrypto> {
    crypto: C,
}

impl EncryptionEngine {
    pub fn new() -> Self {
        Self {
            crypto: SystemCrypto,
        }
    }
}

impl Default for EncryptionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CryptoProvider> EncryptionEngine<C> {
    pub fn with_provider(crypto: C) -> Self {
        Self { crypto }
    }

    /// Generate a fresh 256-bit key from the capability's randomness.
    /// The crate keeps no copy; the caller owns it.
    pub fn generate_key(&self) -> Result<[u8; KEY_LEN], TotpError> {
        let bytes = self.crypto.random_bytes(KEY_LEN)?;
        fixed_len(bytes, "key")
    }

    /// Seal plaintext under a 32-byte key with a fresh random nonce.
    pub fn seal(&self, plaintext: &[u8], key: &[u8]) -> Result<EncryptionEnvelope, TotpError> {
        check_key(key)?;
        let nonce: [u8; NONCE_LEN] = fixed_len(self.crypto.random_bytes(NONCE_LEN)?, "nonce")?;

        let mut combined = self.crypto.aes_gcm_seal(key, &nonce, plaintext)?;
        if combined.len() < TAG_LEN {
            return Err(TotpError::new(
                TotpErrorKind::CapabilityFailure,
                "sealed output shorter than the authentication tag",
            ));
        }
        let tag_bytes = combined.split_off(combined.len() - TAG_LEN);
        log::debug!("sealed {} plaintext bytes", plaintext.len());

        Ok(EncryptionEnvelope {
            ciphertext: combined,
            nonce,
            tag: fixed_len(tag_bytes, "tag")?,
        })
    }

    /// Open an envelope. Tampered ciphertext, a wrong key, and a wrong
    /// nonce all fail with the same `AuthenticationFailed` error.
    pub fn open(&self, envelope: &EncryptionEnvelope, key: &[u8]) -> Result<Vec<u8>, TotpError> {
        check_key(key)?;
        let mut combined = Vec::with_capacity(envelope.ciphertext.len() + TAG_LEN);
        combined.extend_from_slice(&envelope.ciphertext);
        combined.extend_from_slice(&envelope.tag);
        self.crypto.aes_gcm_open(key, &envelope.nonce, &combined)
    }

    /// Re-seal an envelope under a new key. Fails without side effects if
    /// the old key cannot open it; the input envelope is never modified.
    pub fn rotate_key(
        &self,
        envelope: &EncryptionEnvelope,
        old_key: &[u8],
        new_key: &[u8],
    ) -> Result<EncryptionEnvelope, TotpError> {
        let mut plaintext = self.open(envelope, old_key)?;
        let resealed = self.seal(&plaintext, new_key);
        plaintext.zeroize();
        resealed
    }
}

fn check_key(key: &[u8]) -> Result<(), TotpError> {
    if key.len() != KEY_LEN {
        return Err(TotpError::new(
            TotpErrorKind::InvalidInput,
            "encryption key must be 32 bytes",
        )
        .with_detail(format!("got {} bytes", key.len())));
    }
    Ok(())
}
