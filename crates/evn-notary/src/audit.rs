use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use evn_types::{evidence_digest, Digest, EvidenceItem, RunId};

/// Context label audit payloads are sealed under unless overridden in
/// configuration. Data keys are bound to this label: a blob sealed under
/// one label can never be unsealed under another.
pub const DEFAULT_AUDIT_CONTEXT: &str = "evn-run-audit-v1";

/// The full audit record sealed off public view.
///
/// Contains the evidence itself, run context, and an integrity block
/// binding the record to the on-chain Merkle root. Only ever stored as
/// ciphertext; the plaintext exists transiently during assembly and after
/// an authorized unseal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPayload {
    pub run_id: RunId,
    /// Evidence exactly as supplied, in input order, including items that
    /// normalized to empty and were excluded from the leaf sequence.
    pub evidence: Vec<EvidenceItem>,
    pub context: AuditContext,
    pub integrity: IntegrityBlock,
}

/// Run context captured alongside the evidence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    /// Network the run was anchored to.
    pub network: String,
    /// Assembly timestamp.
    pub created_at: DateTime<Utc>,
    /// Version of the notary that produced the record.
    pub notary_version: String,
}

/// Integrity anchors binding the payload to the chain commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityBlock {
    /// The Merkle root published for this run.
    pub merkle_root: Digest,
    /// Digest of the raw evidence collection (order- and count-sensitive,
    /// computed before normalization).
    pub evidence_digest: Digest,
    /// Number of evidence items supplied.
    pub item_count: usize,
    /// Input indices excluded from the leaf sequence (normalized to empty).
    pub skipped_items: Vec<usize>,
}

impl AuditPayload {
    /// Assemble the payload for a run.
    pub fn assemble(
        run_id: RunId,
        evidence: Vec<EvidenceItem>,
        merkle_root: Digest,
        skipped_items: Vec<usize>,
        network: String,
    ) -> Self {
        let digest = evidence_digest(&evidence);
        let item_count = evidence.len();
        Self {
            run_id,
            evidence,
            context: AuditContext {
                network,
                created_at: Utc::now(),
                notary_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            integrity: IntegrityBlock {
                merkle_root,
                evidence_digest: digest,
                item_count,
                skipped_items,
            },
        }
    }

    /// Re-check the embedded evidence digest against the evidence.
    pub fn verify_integrity(&self) -> bool {
        evidence_digest(&self.evidence) == self.integrity.evidence_digest
            && self.evidence.len() == self.integrity.item_count
    }
}
