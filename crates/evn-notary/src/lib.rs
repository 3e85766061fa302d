//! Notarization service for the Evidence Vault Notary.
//!
//! [`NotaryService`] orchestrates the three engines — leaf hashing and
//! Merkle commitment (`evn-crypto`), envelope encryption (`evn-envelope`),
//! and transaction delivery (`evn-chain`) — into three operations:
//!
//! - [`NotaryService::notarize`] — commit an evidence set's Merkle root on
//!   chain, optionally sealing and committing a full audit record, and
//!   return an immutable [`evn_types::NotarizationRecord`] for the caller
//!   to persist.
//! - [`NotaryService::verify_root`] — compare the on-chain root against a
//!   locally recomputed one; mismatch and absence are results, not errors.
//! - [`NotaryService::fetch_audit`] — retrieve and unseal the audit
//!   record, or report that none was committed.

pub mod audit;
pub mod config;
pub mod error;
pub mod service;

pub use audit::{AuditContext, AuditPayload, IntegrityBlock, DEFAULT_AUDIT_CONTEXT};
pub use config::NotaryConfig;
pub use error::{NotaryError, NotaryResult};
pub use service::{AuditData, NotaryService, RootVerification};
