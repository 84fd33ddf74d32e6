//! # totpguard – TOTP secret protection
//!
//! Everything needed to protect and validate a shared TOTP secret:
//!
//! - **RFC 4226 / 6238** – TOTP generation and verification with SHA-1,
//!   SHA-256, SHA-512 and a configurable clock-drift window
//! - **Secret envelopes** – AES-256-GCM seal/open with fresh random nonces,
//!   key rotation, JSON serialization for storage by the caller
//! - **Backup codes** – single-use recovery codes from an ambiguity-free
//!   alphabet, hashed for storage, verified in constant time
//! - **Provisioning** – `otpauth://` URI construction and QR rendering
//!   for authenticator apps
//!
//! Cryptographic primitives, one-way code hashing, and wall-clock time are
//! injected through the [`provider`] traits, so every operation can be
//! driven deterministically in tests. [`TotpGuard`] wires the production
//! implementations together.

pub mod backup;
pub mod base32;
pub mod envelope;
pub mod guard;
pub mod provider;
pub mod qr;
pub mod totp;
pub mod types;
pub mod uri;

pub use backup::BackupCodeManager;
pub use envelope::{EncryptionEngine, EncryptionEnvelope};
pub use guard::TotpGuard;
pub use provider::{BcryptHasher, Clock, CodeHasher, CryptoProvider, SystemClock, SystemCrypto};
pub use totp::TotpEngine;
pub use types::*;
