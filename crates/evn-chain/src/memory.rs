use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use evn_types::{Address, Digest, TxHash};

use crate::call::{ContractCall, ALREADY_EXISTS_MARKER};
use crate::error::{ChainError, ChainResult};
use crate::rpc::{BlobRecord, ChainRpc, SignedTransaction, TxReceipt, TxStatus};

/// In-memory chain implementing the [`ChainRpc`] surface.
///
/// Intended for tests, the CLI, and local development. Transactions are
/// mined instantly into sequential blocks; duplicate records revert with
/// the "already exists" reason exactly as the real contracts do.
///
/// Fault injection covers the client's failure paths:
/// - [`InMemoryChain::inject_broadcast_failures`] makes the next N
///   broadcasts fail at the transport level without mining anything.
/// - [`InMemoryChain::inject_withheld_receipts`] mines the next N
///   transactions but never exposes their receipts, simulating a receipt
///   wait that outlives its timeout while the transaction still lands.
pub struct InMemoryChain {
    chain_id: u64,
    state: Mutex<ChainState>,
}

#[derive(Default)]
struct ChainState {
    block_number: u64,
    nonces: HashMap<Address, u64>,
    roots: HashMap<String, Digest>,
    blobs: HashMap<String, BlobRecord>,
    releases: HashMap<String, (Digest, Digest)>,
    receipts: HashMap<TxHash, TxReceipt>,
    base_fee: u64,
    broadcast_failures: u32,
    withheld_receipts: u32,
    unreachable: bool,
}

impl InMemoryChain {
    /// Create a chain with the given id and a 1 gwei base fee.
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            state: Mutex::new(ChainState {
                base_fee: 1_000_000_000,
                ..Default::default()
            }),
        }
    }

    /// Set the base fee reported for subsequent blocks.
    pub fn set_base_fee(&self, base_fee: u64) {
        self.state.lock().expect("chain lock poisoned").base_fee = base_fee;
    }

    /// Fail the next `n` broadcasts with a transport error. Nothing is
    /// mined and no nonce is consumed.
    pub fn inject_broadcast_failures(&self, n: u32) {
        self.state
            .lock()
            .expect("chain lock poisoned")
            .broadcast_failures = n;
    }

    /// Mine the next `n` transactions but never expose their receipts.
    pub fn inject_withheld_receipts(&self, n: u32) {
        self.state
            .lock()
            .expect("chain lock poisoned")
            .withheld_receipts = n;
    }

    /// Make every call fail as unreachable until re-enabled.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().expect("chain lock poisoned").unreachable = unreachable;
    }

    /// Current block height.
    pub fn block_number(&self) -> u64 {
        self.state.lock().expect("chain lock poisoned").block_number
    }

    /// Number of mined transactions with visible receipts.
    pub fn receipt_count(&self) -> usize {
        self.state.lock().expect("chain lock poisoned").receipts.len()
    }

    fn check_reachable(state: &ChainState) -> ChainResult<()> {
        if state.unreachable {
            return Err(ChainError::Network("rpc endpoint unreachable".into()));
        }
        Ok(())
    }

    /// Apply a decoded call to chain state, returning the execution status.
    fn apply(state: &mut ChainState, call: ContractCall) -> TxStatus {
        match call {
            ContractCall::PublishRoot { run_id, root } => {
                if state.roots.contains_key(&run_id) {
                    return TxStatus::Reverted {
                        reason: format!("{ALREADY_EXISTS_MARKER}: root for {run_id}"),
                    };
                }
                state.roots.insert(run_id, root);
                TxStatus::Success
            }
            ContractCall::CommitBlob {
                id,
                label_hash,
                ciphertext,
                data_hash,
            } => {
                if ciphertext.is_empty() {
                    return TxStatus::Reverted {
                        reason: "empty ciphertext rejected".into(),
                    };
                }
                if state.blobs.contains_key(&id) {
                    return TxStatus::Reverted {
                        reason: format!("{ALREADY_EXISTS_MARKER}: blob for {id}"),
                    };
                }
                state.blobs.insert(
                    id,
                    BlobRecord {
                        label_hash,
                        ciphertext: Bytes::from(ciphertext),
                        data_hash,
                    },
                );
                TxStatus::Success
            }
            ContractCall::RegisterRelease {
                version,
                source_hash,
                artifact_hash,
            } => {
                if state.releases.contains_key(&version) {
                    return TxStatus::Reverted {
                        reason: format!("{ALREADY_EXISTS_MARKER}: release {version}"),
                    };
                }
                state.releases.insert(version, (source_hash, artifact_hash));
                TxStatus::Success
            }
        }
    }
}

#[async_trait]
impl ChainRpc for InMemoryChain {
    async fn chain_id(&self) -> ChainResult<u64> {
        let state = self.state.lock().expect("chain lock poisoned");
        Self::check_reachable(&state)?;
        Ok(self.chain_id)
    }

    async fn account_nonce(&self, address: Address) -> ChainResult<u64> {
        let state = self.state.lock().expect("chain lock poisoned");
        Self::check_reachable(&state)?;
        Ok(state.nonces.get(&address).copied().unwrap_or(0))
    }

    async fn base_fee(&self) -> ChainResult<u64> {
        let state = self.state.lock().expect("chain lock poisoned");
        Self::check_reachable(&state)?;
        Ok(state.base_fee)
    }

    async fn broadcast(&self, tx: &SignedTransaction) -> ChainResult<TxHash> {
        let mut state = self.state.lock().expect("chain lock poisoned");
        Self::check_reachable(&state)?;

        if state.broadcast_failures > 0 {
            state.broadcast_failures -= 1;
            return Err(ChainError::Network("broadcast failed: connection reset".into()));
        }

        tx.verify_signature()?;
        let sender = tx.sender()?;
        let expected = state.nonces.get(&sender).copied().unwrap_or(0);
        if tx.tx.nonce != expected {
            return Err(ChainError::Network(format!(
                "broadcast rejected: nonce {} (expected {expected})",
                tx.tx.nonce
            )));
        }

        let call = ContractCall::decode(&tx.tx.payload)?;
        let tx_hash = tx.tx_hash()?;

        // Mine instantly: consume the nonce and advance the chain whether
        // the call succeeds or reverts.
        state.nonces.insert(sender, expected + 1);
        state.block_number += 1;
        let status = Self::apply(&mut state, call);
        let receipt = TxReceipt {
            tx_hash,
            block_number: state.block_number,
            status,
        };

        if state.withheld_receipts > 0 {
            state.withheld_receipts -= 1;
        } else {
            state.receipts.insert(tx_hash, receipt);
        }

        Ok(tx_hash)
    }

    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<TxReceipt>> {
        let state = self.state.lock().expect("chain lock poisoned");
        Self::check_reachable(&state)?;
        Ok(state.receipts.get(&tx_hash).cloned())
    }

    async fn get_root(&self, run_id: &str) -> ChainResult<Option<Digest>> {
        let state = self.state.lock().expect("chain lock poisoned");
        Self::check_reachable(&state)?;
        Ok(state.roots.get(run_id).copied())
    }

    async fn get_blob(&self, id: &str) -> ChainResult<Option<BlobRecord>> {
        let state = self.state.lock().expect("chain lock poisoned");
        Self::check_reachable(&state)?;
        Ok(state.blobs.get(id).cloned())
    }

    async fn get_release(&self, version: &str) -> ChainResult<Option<(Digest, Digest)>> {
        let state = self.state.lock().expect("chain lock poisoned");
        Self::check_reachable(&state)?;
        Ok(state.releases.get(version).copied())
    }
}

impl std::fmt::Debug for InMemoryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryChain")
            .field("chain_id", &self.chain_id)
            .field("block_number", &self.block_number())
            .finish()
    }
}
