//! Foundation types for the Evidence Vault Notary (EVN).
//!
//! This crate provides the digest, identifier, and record types used
//! throughout the EVN system. Every other EVN crate depends on `evn-types`.
//!
//! # Key Types
//!
//! - [`Digest`] — 32-byte content hash (BLAKE3) used for leaves, Merkle
//!   roots, label hashes, and integrity hashes
//! - [`RunId`] — Caller-assigned identifier for one notarization run
//! - [`TxHash`] / [`Address`] — On-chain transaction and account identifiers
//! - [`EvidenceItem`] — One ordered piece of evidence text
//! - [`NotarizationRecord`] — Immutable result of a completed run
//! - [`RunState`] — Per-run lifecycle state machine

pub mod digest;
pub mod error;
pub mod evidence;
pub mod ids;
pub mod record;

pub use digest::Digest;
pub use error::TypeError;
pub use evidence::{evidence_digest, EvidenceItem};
pub use ids::{Address, RunId, TxHash};
pub use record::{NotarizationRecord, RunState};
