use std::sync::Arc;

use tracing::{info, warn};

use evn_chain::{ChainClient, ChainRpc};
use evn_crypto::{LeafHasher, MerkleTree};
use evn_envelope::EnvelopeCipher;
use evn_types::{Digest, EvidenceItem, NotarizationRecord, RunId, RunState};

use crate::audit::AuditPayload;
use crate::config::NotaryConfig;
use crate::error::{NotaryError, NotaryResult};

/// Outcome of comparing the on-chain root against a local recomputation.
///
/// Absence and mismatch are results, not errors: `verified` is only true
/// when a published root exists, evidence was supplied, and the two roots
/// are byte-identical.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootVerification {
    /// Root read from the chain, if published.
    pub published: Option<Digest>,
    /// Root recomputed from the supplied evidence, if any was supplied.
    pub computed: Option<Digest>,
    pub verified: bool,
}

/// Outcome of fetching a run's sealed audit record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuditData {
    /// No blob was committed for the run. Not an error.
    NotCommitted,
    /// The blob was fetched and unsealed.
    Committed {
        payload: AuditPayload,
        /// Whether the stored integrity hash matches the unsealed
        /// plaintext. A mismatch means the on-chain `data_hash` disagrees
        /// with the ciphertext contents.
        data_hash_verified: bool,
    },
}

/// The notarization service.
///
/// An explicit long-lived handle constructed once at startup and shared by
/// reference; it owns the chain client (with its per-account submission
/// lock) and the envelope cipher. Hashing, Merkle builds, and sealing run
/// unserialized across concurrent calls — only chain submission queues.
pub struct NotaryService {
    client: ChainClient,
    cipher: EnvelopeCipher,
    audit_context: String,
}

impl NotaryService {
    /// Build the service from configuration and an RPC handle.
    pub fn from_config(rpc: Arc<dyn ChainRpc>, config: NotaryConfig) -> NotaryResult<Self> {
        let client = ChainClient::new(rpc, config.chain)?;
        let cipher = EnvelopeCipher::from_config(&config.envelope)?;
        Ok(Self {
            client,
            cipher,
            audit_context: config.audit_context,
        })
    }

    /// Assemble the service from already-built engines.
    pub fn new(client: ChainClient, cipher: EnvelopeCipher, audit_context: String) -> Self {
        Self {
            client,
            cipher,
            audit_context,
        }
    }

    /// The underlying chain client.
    pub fn client(&self) -> &ChainClient {
        &self.client
    }

    /// Notarize an evidence set.
    ///
    /// Leaf-hashes every item (items normalizing to empty are excluded
    /// from the hash sequence but recorded), builds the Merkle root in
    /// input order, publishes it, and — when `include_audit_commit` is set
    /// — seals the full audit payload and commits the ciphertext. Returns
    /// the immutable record for the caller to persist.
    ///
    /// Re-invoking after a failure is safe: submissions whose records are
    /// already on chain resolve as idempotent success.
    pub async fn notarize(
        &self,
        run_id: RunId,
        evidence: Vec<EvidenceItem>,
        include_audit_commit: bool,
    ) -> NotaryResult<NotarizationRecord> {
        let mut state = RunState::Uncommitted;
        let (leaves, skipped_items) = hash_leaves(&evidence);
        if !skipped_items.is_empty() {
            warn!(
                run_id = %run_id,
                skipped = skipped_items.len(),
                "evidence items normalized to empty; excluded from commitment"
            );
        }
        let root = MerkleTree::build(leaves).root();

        let publish = self.client.publish_root(run_id.as_str(), root).await?;
        advance(&mut state, RunState::RootPublished, &run_id);
        info!(
            run_id = %run_id,
            root = %root,
            tx = %publish.tx_hash,
            block = publish.block_number,
            already_existed = publish.already_existed,
            "merkle root published"
        );

        let (commit_tx_hash, commit_block_number) = if include_audit_commit {
            let payload = AuditPayload::assemble(
                run_id.clone(),
                evidence,
                root,
                skipped_items.clone(),
                self.client.network().to_string(),
            );
            let sealed = self.cipher.seal_json(&payload, &self.audit_context)?;
            let label_hash = self.cipher.label_hash(&self.audit_context);

            let commit = self
                .client
                .commit_blob(run_id.as_str(), label_hash, sealed.blob, sealed.data_hash)
                .await?;
            advance(&mut state, RunState::AuditCommitted, &run_id);
            info!(
                run_id = %run_id,
                tx = %commit.tx_hash,
                block = commit.block_number,
                already_existed = commit.already_existed,
                "audit blob committed"
            );
            (Some(commit.tx_hash), Some(commit.block_number))
        } else {
            advance(&mut state, RunState::Done, &run_id);
            (None, None)
        };

        Ok(NotarizationRecord {
            run_id,
            merkle_root: root,
            notary_tx_hash: publish.tx_hash,
            notary_block_number: publish.block_number,
            commit_tx_hash,
            commit_block_number,
            network: self.client.network().to_string(),
            skipped_items,
        })
    }

    /// Fetch the on-chain root for a run and compare it against a root
    /// recomputed from the supplied evidence, when available.
    pub async fn verify_root(
        &self,
        run_id: &RunId,
        evidence: Option<&[EvidenceItem]>,
    ) -> NotaryResult<RootVerification> {
        let published = self.client.get_root(run_id.as_str()).await?;
        let computed = evidence.map(|items| {
            let (leaves, _) = hash_leaves(items);
            MerkleTree::build(leaves).root()
        });
        let verified = matches!(
            (published, computed),
            (Some(p), Some(c)) if p == c
        );
        Ok(RootVerification {
            published,
            computed,
            verified,
        })
    }

    /// Fetch and unseal the audit record for a run.
    ///
    /// Absence is a result, not an error. Tag verification failures
    /// (tampered ciphertext, wrong key) do surface as errors and never
    /// yield partial plaintext.
    pub async fn fetch_audit(&self, run_id: &RunId) -> NotaryResult<AuditData> {
        let Some(blob) = self.client.get_blob(run_id.as_str()).await? else {
            return Ok(AuditData::NotCommitted);
        };

        let plaintext = self.cipher.unseal(&blob.ciphertext, &self.audit_context)?;
        let data_hash_verified = self.cipher.data_hash(&plaintext) == blob.data_hash;
        if !data_hash_verified {
            warn!(run_id = %run_id, "stored data hash disagrees with unsealed plaintext");
        }
        let payload: AuditPayload = serde_json::from_slice(&plaintext)
            .map_err(|e| NotaryError::AuditPayload(e.to_string()))?;

        Ok(AuditData::Committed {
            payload,
            data_hash_verified,
        })
    }

    /// Register a software release in the on-chain registry.
    pub async fn register_release(
        &self,
        version: &str,
        source_hash: Digest,
        artifact_hash: Digest,
    ) -> NotaryResult<evn_chain::Confirmation> {
        Ok(self
            .client
            .register_release(version, source_hash, artifact_hash)
            .await?)
    }
}

/// Leaf-hash an evidence sequence, excluding items that normalize to
/// empty. Returns the leaves in input order plus the excluded indices.
fn hash_leaves(evidence: &[EvidenceItem]) -> (Vec<Digest>, Vec<usize>) {
    let mut leaves = Vec::with_capacity(evidence.len());
    let mut skipped = Vec::new();
    for (index, item) in evidence.iter().enumerate() {
        if LeafHasher::normalize(&item.text).is_empty() {
            skipped.push(index);
        } else {
            leaves.push(LeafHasher::LEAF.leaf_hash(&item.text));
        }
    }
    (leaves, skipped)
}

/// Advance the per-run state machine, logging illegal transitions.
fn advance(state: &mut RunState, next: RunState, run_id: &RunId) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal run state transition {state} -> {next}"
    );
    if !state.can_transition_to(next) {
        warn!(run_id = %run_id, from = %state, to = %next, "illegal run state transition");
    }
    *state = next;
}
