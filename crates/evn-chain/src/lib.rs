//! Transaction submission for the Evidence Vault Notary.
//!
//! The chain is an opaque call surface behind the [`ChainRpc`] trait:
//! publish a Merkle root, commit a sealed audit blob, register a release,
//! and read records back. This crate owns everything client-side of that
//! surface — connection verification, signing, nonce mirroring, fee
//! calculation, bounded receipt waits, and retry.
//!
//! Only one submission per signing account is in flight at a time: nonce
//! allocation, build, sign, broadcast, and receipt wait run as a single
//! critical section inside [`ChainClient`]. Everything else (hashing,
//! sealing) happens outside it.
//!
//! [`InMemoryChain`] is the reference [`ChainRpc`] implementation used by
//! tests, the CLI, and local development, with fault injection for the
//! failure paths.

pub mod call;
pub mod client;
pub mod config;
pub mod error;
pub mod fee;
pub mod memory;
pub mod nonce;
pub mod rpc;

pub use call::{ContractCall, ALREADY_EXISTS_MARKER};
pub use client::{ChainClient, Confirmation};
pub use config::{ChainConfig, ContractAddresses, FeePolicy, GasPolicy, RetryPolicy};
pub use error::{ChainError, ChainResult};
pub use fee::FeeQuote;
pub use memory::InMemoryChain;
pub use nonce::NonceCache;
pub use rpc::{BlobRecord, ChainRpc, ChainTransaction, SignedTransaction, TxReceipt, TxStatus};
