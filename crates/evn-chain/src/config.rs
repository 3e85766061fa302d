use std::time::Duration;

use serde::{Deserialize, Serialize};

use evn_types::Address;

/// Configuration for the chain client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainConfig {
    /// RPC endpoint URL.
    pub rpc_endpoint: String,
    /// Chain id the endpoint must report; mismatch is fatal.
    pub expected_chain_id: u64,
    /// Human-readable network name recorded on notarization records.
    pub network: String,
    /// Hex-encoded 32-byte signing secret for the submission account.
    pub signing_key_hex: String,
    /// Addresses of the three notary contracts.
    pub contracts: ContractAddresses,
    pub fees: FeePolicy,
    pub gas: GasPolicy,
    pub retry: RetryPolicy,
    /// Upper bound on one receipt wait. Exceeding it is a retryable
    /// failure, not proof the transaction was never mined.
    pub receipt_timeout: Duration,
}

/// Addresses of the on-chain notary contracts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Root-publish contract.
    pub root_publisher: Address,
    /// Sealed-blob vault contract.
    pub blob_vault: Address,
    /// Release registry contract.
    pub release_registry: Address,
}

/// Fee recomputation policy, applied fresh on every attempt.
///
/// `max_fee = base_fee * multiplier_pct / 100`;
/// `priority_fee = min(priority_fee_cap, max_fee / priority_divisor)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeePolicy {
    /// Safety multiplier over the latest base fee, in percent.
    pub max_fee_multiplier_pct: u64,
    /// Absolute cap on the priority fee, in wei.
    pub priority_fee_cap: u64,
    /// Priority fee is this fraction of the max fee (as a divisor).
    pub priority_divisor: u64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            max_fee_multiplier_pct: 150,
            priority_fee_cap: 2_000_000_000, // 2 gwei
            priority_divisor: 10,
        }
    }
}

/// Gas limits per call shape.
///
/// Fixed-size calls get a fixed limit; the variable-size blob commit gets
/// a payload-proportional limit with a hard cap.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GasPolicy {
    /// Limit for small fixed-size calls (root publish, release register).
    pub fixed_call_gas: u64,
    /// Base gas for a blob commit before the per-byte component.
    pub blob_base_gas: u64,
    /// Per-payload-byte gas for blob commits.
    pub blob_gas_per_byte: u64,
    /// Hard cap on any blob commit.
    pub blob_gas_cap: u64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            fixed_call_gas: 120_000,
            blob_base_gas: 100_000,
            blob_gas_per_byte: 16,
            blob_gas_cap: 8_000_000,
        }
    }
}

/// Retry budget for transient submission failures.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl GasPolicy {
    /// Gas limit for a blob commit of `payload_len` bytes.
    pub fn blob_gas(&self, payload_len: usize) -> u64 {
        let proportional = self
            .blob_base_gas
            .saturating_add(self.blob_gas_per_byte.saturating_mul(payload_len as u64));
        proportional.min(self.blob_gas_cap)
    }
}

impl ChainConfig {
    /// A configuration for local development against [`crate::InMemoryChain`].
    pub fn devnet(signing_key_hex: impl Into<String>) -> Self {
        Self {
            rpc_endpoint: "mem://devnet".into(),
            expected_chain_id: 1337,
            network: "devnet".into(),
            signing_key_hex: signing_key_hex.into(),
            contracts: ContractAddresses {
                root_publisher: Address::from_bytes([0x01; 20]),
                blob_vault: Address::from_bytes([0x02; 20]),
                release_registry: Address::from_bytes([0x03; 20]),
            },
            fees: FeePolicy::default(),
            gas: GasPolicy::default(),
            retry: RetryPolicy {
                max_attempts: 3,
                retry_delay: Duration::from_millis(10),
            },
            receipt_timeout: Duration::from_secs(60),
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, crate::ChainError> {
        toml::from_str(text).map_err(|e| crate::ChainError::Configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_gas_is_proportional() {
        let gas = GasPolicy::default();
        assert_eq!(gas.blob_gas(0), gas.blob_base_gas);
        assert_eq!(gas.blob_gas(100), gas.blob_base_gas + 1600);
    }

    #[test]
    fn blob_gas_is_capped() {
        let gas = GasPolicy::default();
        assert_eq!(gas.blob_gas(10_000_000), gas.blob_gas_cap);
    }

    #[test]
    fn devnet_defaults() {
        let c = ChainConfig::devnet("aa".repeat(32));
        assert_eq!(c.expected_chain_id, 1337);
        assert_eq!(c.network, "devnet");
        assert_eq!(c.receipt_timeout, Duration::from_secs(60));
    }

    #[test]
    fn toml_roundtrip() {
        let c = ChainConfig::devnet("bb".repeat(32));
        let text = toml::to_string(&c).unwrap();
        let parsed = ChainConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.expected_chain_id, c.expected_chain_id);
        assert_eq!(parsed.contracts.blob_vault, c.contracts.blob_vault);
        assert_eq!(parsed.retry.max_attempts, c.retry.max_attempts);
    }
}
