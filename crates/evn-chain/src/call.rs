use serde::{Deserialize, Serialize};

use evn_types::Digest;

/// Revert reason emitted when a record for the same key is already on
/// chain. The client treats reverts carrying this marker as idempotent
/// success; everything else is terminal.
pub const ALREADY_EXISTS_MARKER: &str = "record already exists";

/// Typed state-changing calls to the notary contracts.
///
/// The exact contract ABI is outside this crate; calls are carried as
/// bincode-encoded payloads and interpreted by the chain side. This keeps
/// the submission engine testable against [`crate::InMemoryChain`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractCall {
    /// Publish the Merkle root for a run.
    PublishRoot { run_id: String, root: Digest },
    /// Commit a sealed audit blob under an opaque label.
    CommitBlob {
        id: String,
        label_hash: Digest,
        ciphertext: Vec<u8>,
        data_hash: Digest,
    },
    /// Register a software release for reproducibility audits.
    RegisterRelease {
        version: String,
        source_hash: Digest,
        artifact_hash: Digest,
    },
}

impl ContractCall {
    /// Encode the call as a transaction payload.
    pub fn encode(&self) -> Result<Vec<u8>, crate::ChainError> {
        bincode::serialize(self).map_err(|e| crate::ChainError::Build(e.to_string()))
    }

    /// Decode a transaction payload back into a call.
    pub fn decode(payload: &[u8]) -> Result<Self, crate::ChainError> {
        bincode::deserialize(payload).map_err(|e| crate::ChainError::Build(e.to_string()))
    }

    /// Short operation name for logging.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::PublishRoot { .. } => "publish_root",
            Self::CommitBlob { .. } => "commit_blob",
            Self::RegisterRelease { .. } => "register_release",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let call = ContractCall::PublishRoot {
            run_id: "r1".into(),
            root: Digest::from_bytes(b"root"),
        };
        let payload = call.encode().unwrap();
        assert_eq!(ContractCall::decode(&payload).unwrap(), call);
    }

    #[test]
    fn blob_payload_roundtrip() {
        let call = ContractCall::CommitBlob {
            id: "r1".into(),
            label_hash: Digest::from_bytes(b"label"),
            ciphertext: vec![0xAA; 256],
            data_hash: Digest::from_bytes(b"data"),
        };
        let payload = call.encode().unwrap();
        assert_eq!(ContractCall::decode(&payload).unwrap(), call);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(ContractCall::decode(&[0xFF; 3]).is_err());
    }

    #[test]
    fn op_names() {
        let call = ContractCall::RegisterRelease {
            version: "1.0.0".into(),
            source_hash: Digest::zero(),
            artifact_hash: Digest::zero(),
        };
        assert_eq!(call.op_name(), "register_release");
    }
}
