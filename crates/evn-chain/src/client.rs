use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use evn_crypto::TxSigner;
use evn_types::{Address, Digest, TxHash};

use crate::call::{ContractCall, ALREADY_EXISTS_MARKER};
use crate::config::ChainConfig;
use crate::error::{ChainError, ChainResult};
use crate::fee::FeeQuote;
use crate::nonce::NonceCache;
use crate::rpc::{BlobRecord, ChainRpc, ChainTransaction, TxReceipt, TxStatus};

/// How often a pending receipt is polled during the bounded wait.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Confirmed delivery of one state-changing call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// The call reverted with the "already exists" reason: the record was
    /// on chain before this submission, which callers treat as success.
    pub already_existed: bool,
}

/// Client for the notary contracts.
///
/// One signing key, one account, and one nonce mirror per client. Nonce
/// allocation, transaction build, broadcast, and receipt wait run as a
/// single critical section — only one submission per account is in flight
/// at a time. Concurrent callers queue on that section; reads and all
/// CPU-bound work proceed unserialized.
pub struct ChainClient {
    rpc: Arc<dyn ChainRpc>,
    signer: TxSigner,
    config: ChainConfig,
    /// The nonce mirror lives inside the submit lock: holding the guard is
    /// what makes allocate-build-broadcast-wait one atomic region.
    submit_lock: Mutex<NonceCache>,
    /// Verified chain id, resolved once on first use.
    connected: OnceCell<u64>,
}

impl ChainClient {
    /// Build a client from configuration and an RPC handle.
    pub fn new(rpc: Arc<dyn ChainRpc>, config: ChainConfig) -> ChainResult<Self> {
        let signer = TxSigner::from_hex(&config.signing_key_hex)
            .map_err(|e| ChainError::Configuration(format!("signing key: {e}")))?;
        Ok(Self {
            rpc,
            signer,
            config,
            submit_lock: Mutex::new(NonceCache::new()),
            connected: OnceCell::new(),
        })
    }

    /// The submission account address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// The configured network name.
    pub fn network(&self) -> &str {
        &self.config.network
    }

    /// Publish the Merkle root for a run.
    pub async fn publish_root(&self, run_id: &str, root: Digest) -> ChainResult<Confirmation> {
        let call = ContractCall::PublishRoot {
            run_id: run_id.to_string(),
            root,
        };
        self.submit(
            call,
            self.config.contracts.root_publisher,
            self.config.gas.fixed_call_gas,
        )
        .await
    }

    /// Commit a sealed audit blob under an opaque label.
    pub async fn commit_blob(
        &self,
        id: &str,
        label_hash: Digest,
        ciphertext: Vec<u8>,
        data_hash: Digest,
    ) -> ChainResult<Confirmation> {
        let gas_limit = self.config.gas.blob_gas(ciphertext.len());
        let call = ContractCall::CommitBlob {
            id: id.to_string(),
            label_hash,
            ciphertext,
            data_hash,
        };
        self.submit(call, self.config.contracts.blob_vault, gas_limit)
            .await
    }

    /// Register a software release.
    pub async fn register_release(
        &self,
        version: &str,
        source_hash: Digest,
        artifact_hash: Digest,
    ) -> ChainResult<Confirmation> {
        let call = ContractCall::RegisterRelease {
            version: version.to_string(),
            source_hash,
            artifact_hash,
        };
        self.submit(
            call,
            self.config.contracts.release_registry,
            self.config.gas.fixed_call_gas,
        )
        .await
    }

    /// Read the published root for a run. `None` means not published.
    pub async fn get_root(&self, run_id: &str) -> ChainResult<Option<Digest>> {
        self.ensure_connected().await?;
        self.rpc.get_root(run_id).await
    }

    /// Read a committed blob. `None` means not committed.
    pub async fn get_blob(&self, id: &str) -> ChainResult<Option<BlobRecord>> {
        self.ensure_connected().await?;
        self.rpc.get_blob(id).await
    }

    /// Read a registered release. `None` means not registered.
    pub async fn get_release(&self, version: &str) -> ChainResult<Option<(Digest, Digest)>> {
        self.ensure_connected().await?;
        self.rpc.get_release(version).await
    }

    /// Verify the endpoint once per client: the reported chain id must
    /// match the configured one. Mismatch or unreachability on first use
    /// is a configuration error, distinct from transient network failures.
    async fn ensure_connected(&self) -> ChainResult<()> {
        let expected = self.config.expected_chain_id;
        self.connected
            .get_or_try_init(|| async {
                let actual = self.rpc.chain_id().await.map_err(|e| {
                    ChainError::Configuration(format!(
                        "rpc endpoint {} unreachable: {e}",
                        self.config.rpc_endpoint
                    ))
                })?;
                if actual != expected {
                    return Err(ChainError::Configuration(format!(
                        "chain id mismatch: endpoint reports {actual}, expected {expected}"
                    )));
                }
                debug!(chain_id = actual, "chain connection verified");
                Ok(actual)
            })
            .await
            .map(|_| ())
    }

    /// Deliver one state-changing call, retrying transient failures with a
    /// refreshed nonce and recomputed fee up to the configured budget.
    async fn submit(
        &self,
        call: ContractCall,
        to: Address,
        gas_limit: u64,
    ) -> ChainResult<Confirmation> {
        self.ensure_connected().await?;
        let payload = call.encode()?;
        let op = call.op_name();

        let mut cache = self.submit_lock.lock().await;
        let mut last_err = String::new();

        for attempt in 1..=self.config.retry.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.config.retry.retry_delay).await;
            }
            match self
                .attempt(&mut cache, &payload, to, gas_limit, op, attempt)
                .await
            {
                Ok(confirmation) => return Ok(confirmation),
                Err(err) if err.is_retryable() => {
                    warn!(op, attempt, %err, "submission attempt failed; will retry");
                    last_err = err.to_string();
                }
                Err(err) => return Err(err),
            }
        }

        Err(ChainError::RetriesExhausted {
            attempts: self.config.retry.max_attempts,
            last: last_err,
        })
    }

    /// One submission attempt inside the critical section.
    async fn attempt(
        &self,
        cache: &mut NonceCache,
        payload: &[u8],
        to: Address,
        gas_limit: u64,
        op: &str,
        attempt: u32,
    ) -> ChainResult<Confirmation> {
        let nonce = match cache.current() {
            Some(n) => n,
            None => {
                let n = self.rpc.account_nonce(self.signer.address()).await?;
                debug!(op, nonce = n, "nonce refreshed from network");
                cache.refresh(n);
                n
            }
        };

        // Fees come from the latest block on every attempt, never reused.
        let base_fee = self.rpc.base_fee().await?;
        let quote = FeeQuote::compute(base_fee, &self.config.fees);

        let signed = ChainTransaction {
            nonce,
            max_fee_per_gas: quote.max_fee_per_gas,
            priority_fee_per_gas: quote.priority_fee_per_gas,
            gas_limit,
            to,
            payload: payload.to_vec(),
        }
        .sign(&self.signer)?;

        // From broadcast until a receipt is observed the nonce's fate is
        // unknown. Stale-before-broadcast means a cancelled or failed wait
        // forces a network refresh instead of reusing a value that may
        // already be consumed.
        cache.mark_stale();

        let tx_hash = self.rpc.broadcast(&signed).await?;
        debug!(op, attempt, nonce, %tx_hash, "transaction broadcast");

        let receipt = self.await_receipt(tx_hash).await?;
        match receipt.status {
            TxStatus::Success => {
                cache.confirm(nonce);
                info!(op, %tx_hash, block = receipt.block_number, "transaction confirmed");
                Ok(Confirmation {
                    tx_hash,
                    block_number: receipt.block_number,
                    already_existed: false,
                })
            }
            TxStatus::Reverted { ref reason } if reason.contains(ALREADY_EXISTS_MARKER) => {
                cache.confirm(nonce);
                info!(op, %tx_hash, "record already on chain; treating as success");
                Ok(Confirmation {
                    tx_hash,
                    block_number: receipt.block_number,
                    already_existed: true,
                })
            }
            TxStatus::Reverted { reason } => {
                // Deterministic call: resubmitting identical arguments
                // would revert again. The consumed nonce is re-read from
                // the network on next use.
                Err(ChainError::Reverted { reason })
            }
        }
    }

    /// Poll for a receipt under the configured bound. Timing out is a
    /// retryable failure, not proof the transaction was never mined.
    async fn await_receipt(&self, tx_hash: TxHash) -> ChainResult<TxReceipt> {
        let wait = async {
            loop {
                if let Some(receipt) = self.rpc.receipt(tx_hash).await? {
                    return Ok::<_, ChainError>(receipt);
                }
                tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
            }
        };
        match tokio::time::timeout(self.config.receipt_timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(ChainError::Network(format!(
                "timed out waiting for receipt of {tx_hash}"
            ))),
        }
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("network", &self.config.network)
            .field("address", &self.signer.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryChain;

    fn devnet_client(chain: Arc<InMemoryChain>) -> ChainClient {
        let mut config = ChainConfig::devnet(hex::encode([0x42u8; 32]));
        config.receipt_timeout = Duration::from_millis(600);
        ChainClient::new(chain, config).unwrap()
    }

    fn root(seed: &[u8]) -> Digest {
        Digest::from_bytes(seed)
    }

    #[tokio::test]
    async fn publish_then_read_back_identical_root() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let client = devnet_client(chain);

        let r = root(b"the root");
        let confirmation = client.publish_root("run-1", r).await.unwrap();
        assert!(!confirmation.already_existed);
        assert_eq!(confirmation.block_number, 1);

        let published = client.get_root("run-1").await.unwrap().unwrap();
        assert_eq!(published, r);
    }

    #[tokio::test]
    async fn chain_id_mismatch_is_fatal_configuration_error() {
        let chain = Arc::new(InMemoryChain::new(999));
        let client = devnet_client(chain.clone());

        let err = client.publish_root("run-1", root(b"r")).await.unwrap_err();
        assert!(matches!(err, ChainError::Configuration(_)));
        // Nothing was broadcast.
        assert_eq!(chain.block_number(), 0);
    }

    #[tokio::test]
    async fn unreachable_endpoint_on_first_use_is_configuration_error() {
        let chain = Arc::new(InMemoryChain::new(1337));
        chain.set_unreachable(true);
        let client = devnet_client(chain);

        let err = client.get_root("run-1").await.unwrap_err();
        assert!(matches!(err, ChainError::Configuration(_)));
    }

    #[tokio::test]
    async fn broadcast_failure_retries_with_refreshed_nonce() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let client = devnet_client(chain.clone());
        chain.inject_broadcast_failures(1);

        let confirmation = client.publish_root("run-1", root(b"r")).await.unwrap();
        assert!(!confirmation.already_existed);

        // Exactly one nonce was consumed across failure + retry.
        assert_eq!(chain.account_nonce(client.address()).await.unwrap(), 1);

        // The cache advanced with it: the next submission lands directly.
        client.publish_root("run-2", root(b"r2")).await.unwrap();
        assert_eq!(chain.account_nonce(client.address()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn retries_exhausted_names_last_cause() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let client = devnet_client(chain.clone());
        chain.inject_broadcast_failures(10);

        let err = client.publish_root("run-1", root(b"r")).await.unwrap_err();
        match err {
            ChainError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.contains("broadcast failed"));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(chain.account_nonce(client.address()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_publish_is_idempotent_success() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let client = devnet_client(chain);

        let first = client.publish_root("run-1", root(b"r")).await.unwrap();
        let second = client.publish_root("run-1", root(b"r")).await.unwrap();
        assert!(!first.already_existed);
        assert!(second.already_existed);
    }

    #[tokio::test]
    async fn deterministic_revert_is_terminal_not_retried() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let client = devnet_client(chain.clone());

        let err = client
            .commit_blob("run-1", root(b"label"), vec![], root(b"data"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Reverted { .. }));
        // One attempt, one mined block — no retries of a reverted call.
        assert_eq!(chain.block_number(), 1);
    }

    #[tokio::test]
    async fn withheld_receipt_times_out_then_retry_sees_already_exists() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let client = devnet_client(chain.clone());
        chain.inject_withheld_receipts(1);

        // First attempt mines but the receipt never shows; the bounded
        // wait fails, the retry resubmits with a refreshed nonce and gets
        // the idempotent "already exists" outcome.
        let confirmation = client.publish_root("run-1", root(b"r")).await.unwrap();
        assert!(confirmation.already_existed);
        assert_eq!(
            client.get_root("run-1").await.unwrap(),
            Some(root(b"r"))
        );
    }

    #[tokio::test]
    async fn concurrent_submissions_serialize_on_one_account() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let client = Arc::new(devnet_client(chain.clone()));

        let mut handles = Vec::new();
        for i in 0..4u8 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                client
                    .publish_root(&format!("run-{i}"), root(&[i]))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Four submissions, four sequential nonces, no collisions.
        assert_eq!(chain.account_nonce(client.address()).await.unwrap(), 4);
        for i in 0..4u8 {
            assert!(client
                .get_root(&format!("run-{i}"))
                .await
                .unwrap()
                .is_some());
        }
    }

    #[tokio::test]
    async fn gas_limit_scales_with_blob_size() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let client = devnet_client(chain);

        // Large blob commits succeed under the cap.
        let confirmation = client
            .commit_blob("run-1", root(b"label"), vec![0xCC; 4096], root(b"data"))
            .await
            .unwrap();
        assert!(!confirmation.already_existed);
    }

    #[tokio::test]
    async fn bad_signing_key_is_configuration_error() {
        let chain: Arc<dyn ChainRpc> = Arc::new(InMemoryChain::new(1337));
        let config = ChainConfig::devnet("not-hex");
        assert!(matches!(
            ChainClient::new(chain, config),
            Err(ChainError::Configuration(_))
        ));
    }
}
