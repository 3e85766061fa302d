//! Envelope encryption for the Evidence Vault Notary.
//!
//! A single long-lived [`MasterKey`] protects many short-lived data keys:
//! each seal/unseal call derives a fresh 32-byte key from the master key
//! and a context string via HKDF-SHA256, uses it for AES-256-GCM, and
//! discards it. The master key itself is only ever an HKDF input, which
//! limits its exposure.
//!
//! The [`EnvelopeCipher`] also produces the opaque label hashes used as
//! on-chain index keys and the plaintext integrity hashes stored beside
//! ciphertext for tamper-evidence independent of decryption.

pub mod canonical;
pub mod cipher;
pub mod config;
pub mod error;
pub mod master;

pub use canonical::canonical_json;
pub use cipher::{EnvelopeCipher, SealedJson};
pub use config::EnvelopeConfig;
pub use error::{EnvelopeError, EnvelopeResult};
pub use master::MasterKey;
