//! Injected capability boundary.
//!
//! The engines never touch primitives directly: randomness, keyed hashing,
//! AES-256-GCM, one-way code hashing, and wall-clock time all come in
//! through these traits. Production implementations live here too; tests
//! substitute deterministic fakes.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::types::{Algorithm, TotpError, TotpErrorKind};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Traits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cryptographic primitives consumed by the engines.
pub trait CryptoProvider {
    /// Cryptographically secure random bytes.
    fn random_bytes(&self, n: usize) -> Result<Vec<u8>, TotpError>;

    /// HMAC over `data` keyed with `key`, using the selected algorithm.
    fn hmac(&self, algorithm: Algorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>, TotpError>;

    /// AES-256-GCM seal. Returns ciphertext with the 16-byte tag appended.
    fn aes_gcm_seal(
        &self,
        key: &[u8],
        nonce: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, TotpError>;

    /// AES-256-GCM open of ciphertext‖tag. Fails on tag mismatch.
    fn aes_gcm_open(
        &self,
        key: &[u8],
        nonce: &[u8],
        ciphertext_with_tag: &[u8],
    ) -> Result<Vec<u8>, TotpError>;
}

/// One-way hashing for backup codes.
///
/// `verify` must compare in constant time; the engines treat it as the
/// timing-sensitive boundary.
pub trait CodeHasher {
    fn hash(&self, secret: &str) -> Result<String, TotpError>;
    fn verify(&self, secret: &str, hash: &str) -> Result<bool, TotpError>;
}

/// Wall-clock time source.
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn unix_seconds(&self) -> u64;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Production crypto provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Default [`CryptoProvider`] over the OS random source and the RustCrypto
/// `hmac`/`sha1`/`sha2`/`aes-gcm` primitives.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCrypto;

impl CryptoProvider for SystemCrypto {
    fn random_bytes(&self, n: usize) -> Result<Vec<u8>, TotpError> {
        let mut buf = vec![0u8; n];
        OsRng.try_fill_bytes(&mut buf).map_err(|e| {
            TotpError::new(TotpErrorKind::CapabilityFailure, "OS random source failed")
                .with_detail(e.to_string())
        })?;
        Ok(buf)
    }

    fn hmac(&self, algorithm: Algorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>, TotpError> {
        // Fully qualified: `KeyInit` is also in scope for the AES cipher
        // and would make the plain call ambiguous.
        let init_err = |_| TotpError::new(TotpErrorKind::CapabilityFailure, "HMAC init failed");
        match algorithm {
            Algorithm::Sha1 => {
                let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(key).map_err(init_err)?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            Algorithm::Sha256 => {
                let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key).map_err(init_err)?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            Algorithm::Sha512 => {
                let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(key).map_err(init_err)?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
        }
    }

    fn aes_gcm_seal(
        &self,
        key: &[u8],
        nonce: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, TotpError> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
            TotpError::new(TotpErrorKind::InvalidInput, "AES key must be 32 bytes")
        })?;
        cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| TotpError::new(TotpErrorKind::CapabilityFailure, "AES-GCM seal failed"))
    }

    fn aes_gcm_open(
        &self,
        key: &[u8],
        nonce: &[u8],
        ciphertext_with_tag: &[u8],
    ) -> Result<Vec<u8>, TotpError> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
            TotpError::new(TotpErrorKind::InvalidInput, "AES key must be 32 bytes")
        })?;
        // One error for tampered data, wrong key, and wrong nonce alike.
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext_with_tag)
            .map_err(|_| {
                TotpError::new(TotpErrorKind::AuthenticationFailed, "authentication failed")
            })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Production code hasher
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Default [`CodeHasher`] over bcrypt.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Use a non-default work factor. Valid bcrypt costs are 4..=31;
    /// low costs are only appropriate in tests.
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeHasher for BcryptHasher {
    fn hash(&self, secret: &str) -> Result<String, TotpError> {
        bcrypt::hash(secret, self.cost).map_err(|e| {
            TotpError::new(TotpErrorKind::CapabilityFailure, "bcrypt hash failed")
                .with_detail(e.to_string())
        })
    }

    fn verify(&self, secret: &str, hash: &str) -> Result<bool, TotpError> {
        bcrypt::verify(secret, hash).map_err(|e| {
            TotpError::new(TotpErrorKind::CapabilityFailure, "bcrypt verify failed")
                .with_detail(e.to_string())
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Production clock
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Default [`Clock`] over the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Randomness ───────────────────────────────────────────────

    #[test]
    fn random_bytes_have_requested_length() {
        let crypto = SystemCrypto;
        assert_eq!(crypto.random_bytes(0).unwrap().len(), 0);
        assert_eq!(crypto.random_bytes(12).unwrap().len(), 12);
        assert_eq!(crypto.random_bytes(32).unwrap().len(), 32);
    }

    #[test]
    fn random_bytes_are_not_repeated() {
        let crypto = SystemCrypto;
        let a = crypto.random_bytes(32).unwrap();
        let b = crypto.random_bytes(32).unwrap();
        assert_ne!(a, b);
    }

    // ── HMAC (RFC 2202 test case 2) ──────────────────────────────

    #[test]
    fn hmac_sha1_rfc2202_vector() {
        let crypto = SystemCrypto;
        let mac = crypto
            .hmac(Algorithm::Sha1, b"Jefe", b"what do ya want for nothing?")
            .unwrap();
        let expected = [
            0xef, 0xfc, 0xdf, 0x6a, 0xe5, 0xeb, 0x2f, 0xa2, 0xd2, 0x74, 0x16, 0xd5, 0xf1, 0x84,
            0xdf, 0x9c, 0x25, 0x9a, 0x7c, 0x79,
        ];
        assert_eq!(mac, expected);
    }

    #[test]
    fn hmac_output_lengths() {
        let crypto = SystemCrypto;
        assert_eq!(crypto.hmac(Algorithm::Sha1, b"k", b"d").unwrap().len(), 20);
        assert_eq!(crypto.hmac(Algorithm::Sha256, b"k", b"d").unwrap().len(), 32);
        assert_eq!(crypto.hmac(Algorithm::Sha512, b"k", b"d").unwrap().len(), 64);
    }

    #[test]
    fn hmac_accepts_empty_key() {
        let crypto = SystemCrypto;
        assert!(crypto.hmac(Algorithm::Sha1, b"", b"data").is_ok());
    }

    // ── AES-GCM ──────────────────────────────────────────────────

    #[test]
    fn aes_gcm_seal_open_roundtrip() {
        let crypto = SystemCrypto;
        let key = [7u8; 32];
        let nonce = [9u8; 12];
        let sealed = crypto.aes_gcm_seal(&key, &nonce, b"secret bytes").unwrap();
        assert_eq!(sealed.len(), b"secret bytes".len() + 16);
        let opened = crypto.aes_gcm_open(&key, &nonce, &sealed).unwrap();
        assert_eq!(opened, b"secret bytes");
    }

    #[test]
    fn aes_gcm_open_rejects_wrong_key() {
        let crypto = SystemCrypto;
        let sealed = crypto.aes_gcm_seal(&[1u8; 32], &[0u8; 12], b"data").unwrap();
        let err = crypto.aes_gcm_open(&[2u8; 32], &[0u8; 12], &sealed).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::AuthenticationFailed);
    }

    #[test]
    fn aes_gcm_rejects_short_key() {
        let crypto = SystemCrypto;
        let err = crypto.aes_gcm_seal(&[0u8; 16], &[0u8; 12], b"data").unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidInput);
    }

    // ── Bcrypt hasher ────────────────────────────────────────────

    #[test]
    fn bcrypt_hash_and_verify() {
        let hasher = BcryptHasher::with_cost(4);
        let hash = hasher.hash("XKCD2347").unwrap();
        assert_ne!(hash, "XKCD2347");
        assert!(hasher.verify("XKCD2347", &hash).unwrap());
        assert!(!hasher.verify("WRONGCODE", &hash).unwrap());
    }

    // ── Clock ────────────────────────────────────────────────────

    #[test]
    fn system_clock_is_past_2020() {
        assert!(SystemClock.unix_seconds() > 1_577_836_800);
    }
}
