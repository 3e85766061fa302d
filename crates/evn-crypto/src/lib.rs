//! Content-addressing primitives for the Evidence Vault Notary.
//!
//! Provides whitespace-normalizing leaf hashing, binary Merkle trees with
//! inclusion proofs, and Ed25519 transaction signing for the chain client.
//!
//! All crypto operations wrap established libraries — no custom cryptography.

pub mod hasher;
pub mod merkle;
pub mod signer;

pub use hasher::LeafHasher;
pub use merkle::{MerkleProof, MerkleTree, Side};
pub use signer::{Signature, TxSigner, VerifyingKey};
