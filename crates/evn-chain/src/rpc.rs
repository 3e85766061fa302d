use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use evn_crypto::{Signature, TxSigner, VerifyingKey};
use evn_types::{Address, Digest, TxHash};

use crate::error::{ChainError, ChainResult};

/// An unsigned chain transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTransaction {
    /// Account nonce this transaction consumes.
    pub nonce: u64,
    /// Maximum total fee per gas, in wei.
    pub max_fee_per_gas: u64,
    /// Priority fee per gas, in wei.
    pub priority_fee_per_gas: u64,
    /// Gas limit for execution.
    pub gas_limit: u64,
    /// Target contract.
    pub to: Address,
    /// Encoded call payload.
    pub payload: Vec<u8>,
}

impl ChainTransaction {
    /// Digest signed by the submission account.
    pub fn digest(&self) -> ChainResult<Digest> {
        let encoded =
            bincode::serialize(self).map_err(|e| ChainError::Build(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"evn-tx-v1:");
        hasher.update(&encoded);
        Ok(Digest::from_hash(*hasher.finalize().as_bytes()))
    }

    /// Sign with the submission account key.
    pub fn sign(self, signer: &TxSigner) -> ChainResult<SignedTransaction> {
        let digest = self.digest()?;
        let signature = signer.sign(digest.as_bytes());
        Ok(SignedTransaction {
            tx: self,
            public_key: signer.verifying_key().as_bytes(),
            signature,
        })
    }
}

/// A signed transaction ready for broadcast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub tx: ChainTransaction,
    /// Public key of the submitting account.
    pub public_key: [u8; 32],
    pub signature: Signature,
}

impl SignedTransaction {
    /// The transaction hash: digest of the full signed encoding.
    pub fn tx_hash(&self) -> ChainResult<TxHash> {
        let encoded =
            bincode::serialize(self).map_err(|e| ChainError::Build(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"evn-txhash-v1:");
        hasher.update(&encoded);
        Ok(TxHash::from_hash(*hasher.finalize().as_bytes()))
    }

    /// Sender address derived from the embedded public key.
    pub fn sender(&self) -> ChainResult<Address> {
        let key = VerifyingKey::from_bytes(self.public_key)
            .map_err(|e| ChainError::Build(e.to_string()))?;
        Ok(key.to_address())
    }

    /// Verify the signature against the embedded public key.
    pub fn verify_signature(&self) -> ChainResult<()> {
        let key = VerifyingKey::from_bytes(self.public_key)
            .map_err(|e| ChainError::Build(e.to_string()))?;
        let digest = self.tx.digest()?;
        key.verify(digest.as_bytes(), &self.signature)
            .map_err(|_| ChainError::Network("broadcast rejected: bad signature".into()))
    }
}

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// Executed successfully.
    Success,
    /// Mined but reverted, with the contract's reason string.
    Reverted { reason: String },
}

/// Receipt for a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub status: TxStatus,
}

impl TxReceipt {
    /// Whether the transaction executed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self.status, TxStatus::Success)
    }

    /// The revert reason, if the transaction reverted.
    pub fn revert_reason(&self) -> Option<&str> {
        match &self.status {
            TxStatus::Reverted { reason } => Some(reason),
            TxStatus::Success => None,
        }
    }
}

/// A sealed blob as stored on chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobRecord {
    pub label_hash: Digest,
    pub ciphertext: Bytes,
    pub data_hash: Digest,
}

/// The opaque on-chain call surface.
///
/// Implementations must satisfy these invariants:
/// - `chain_id` is stable for the lifetime of the connection.
/// - `account_nonce` reflects all mined transactions (the network is the
///   authority; local caches mirror it at best).
/// - `broadcast` either accepts a transaction for mining or fails without
///   side effects; acceptance does not guarantee a receipt will ever be
///   observed by the caller.
/// - Reads return `Ok(None)` for records that do not exist; absence is
///   not an error.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// The network's chain identifier.
    async fn chain_id(&self) -> ChainResult<u64>;

    /// Current nonce of an account (the next nonce to use).
    async fn account_nonce(&self, address: Address) -> ChainResult<u64>;

    /// Base fee of the latest block, in wei per gas.
    async fn base_fee(&self) -> ChainResult<u64>;

    /// Broadcast a signed transaction; returns its hash.
    async fn broadcast(&self, tx: &SignedTransaction) -> ChainResult<TxHash>;

    /// Look up the receipt for a transaction, if it has been mined.
    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<TxReceipt>>;

    /// Read the published root for a run.
    async fn get_root(&self, run_id: &str) -> ChainResult<Option<Digest>>;

    /// Read a committed blob by id.
    async fn get_blob(&self, id: &str) -> ChainResult<Option<BlobRecord>>;

    /// Read a registered release by version.
    async fn get_release(&self, version: &str) -> ChainResult<Option<(Digest, Digest)>>;
}
