use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::ids::{RunId, TxHash};

/// Immutable result of a completed notarization run.
///
/// EVN returns this record to the caller and never persists it itself; the
/// caller's store owns durability. All fields are fixed once the publishing
/// transactions are confirmed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarizationRecord {
    /// The run this record notarizes.
    pub run_id: RunId,
    /// Merkle root committed on chain.
    pub merkle_root: Digest,
    /// Transaction that published the root.
    pub notary_tx_hash: TxHash,
    /// Block in which the root-publish transaction was mined.
    pub notary_block_number: u64,
    /// Transaction that committed the sealed audit blob, if requested.
    pub commit_tx_hash: Option<TxHash>,
    /// Block in which the audit-commit transaction was mined, if requested.
    pub commit_block_number: Option<u64>,
    /// Network name the record was anchored to (e.g. `"sepolia"`).
    pub network: String,
    /// Input indices of evidence items that normalized to empty text and
    /// were excluded from the leaf sequence. Recorded so exclusion is
    /// visible to the caller rather than silent.
    pub skipped_items: Vec<usize>,
}

impl NotarizationRecord {
    /// Returns `true` if a sealed audit blob was committed for this run.
    pub fn has_audit_commit(&self) -> bool {
        self.commit_tx_hash.is_some()
    }
}

/// Lifecycle state of one notarization run.
///
/// ```text
/// Uncommitted → RootPublished → {AuditCommitted | Done}
/// ```
///
/// `Done` and `Failed` are terminal. There is no automatic transition out
/// of `Failed`: the caller re-invokes `notarize`, relying on the chain's
/// "already exists" idempotency rather than internal replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Nothing has been anchored yet.
    Uncommitted,
    /// The Merkle root is on chain.
    RootPublished,
    /// The sealed audit blob is on chain (implies the root is too).
    AuditCommitted,
    /// The run completed without an audit commit being requested.
    Done,
    /// The run failed terminally.
    Failed,
}

impl RunState {
    /// Returns `true` for terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AuditCommitted | Self::Done | Self::Failed)
    }

    /// Whether a transition from `self` to `next` is legal.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Uncommitted, RootPublished)
                | (Uncommitted, Failed)
                | (RootPublished, AuditCommitted)
                | (RootPublished, Done)
                | (RootPublished, Failed)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uncommitted => "uncommitted",
            Self::RootPublished => "root-published",
            Self::AuditCommitted => "audit-committed",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(with_commit: bool) -> NotarizationRecord {
        NotarizationRecord {
            run_id: RunId::new("r1").unwrap(),
            merkle_root: Digest::from_bytes(b"root"),
            notary_tx_hash: TxHash::from_hash([1; 32]),
            notary_block_number: 10,
            commit_tx_hash: with_commit.then(|| TxHash::from_hash([2; 32])),
            commit_block_number: with_commit.then_some(11),
            network: "devnet".into(),
            skipped_items: vec![],
        }
    }

    #[test]
    fn has_audit_commit() {
        assert!(record(true).has_audit_commit());
        assert!(!record(false).has_audit_commit());
    }

    #[test]
    fn record_serde_roundtrip() {
        let r = record(true);
        let json = serde_json::to_string(&r).unwrap();
        let parsed: NotarizationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r, parsed);
    }

    #[test]
    fn legal_transitions() {
        use RunState::*;
        assert!(Uncommitted.can_transition_to(RootPublished));
        assert!(RootPublished.can_transition_to(AuditCommitted));
        assert!(RootPublished.can_transition_to(Done));
        assert!(Uncommitted.can_transition_to(Failed));
        assert!(RootPublished.can_transition_to(Failed));
    }

    #[test]
    fn illegal_transitions() {
        use RunState::*;
        assert!(!Uncommitted.can_transition_to(AuditCommitted));
        assert!(!Uncommitted.can_transition_to(Done));
        assert!(!Failed.can_transition_to(RootPublished));
        assert!(!Done.can_transition_to(RootPublished));
        assert!(!AuditCommitted.can_transition_to(Done));
    }

    #[test]
    fn terminal_states() {
        use RunState::*;
        assert!(Done.is_terminal());
        assert!(Failed.is_terminal());
        assert!(AuditCommitted.is_terminal());
        assert!(!Uncommitted.is_terminal());
        assert!(!RootPublished.is_terminal());
    }

    #[test]
    fn display_names() {
        assert_eq!(RunState::RootPublished.to_string(), "root-published");
        assert_eq!(RunState::Failed.to_string(), "failed");
    }
}
