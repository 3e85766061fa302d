use crate::config::FeePolicy;

/// Fees computed for one submission attempt.
///
/// Quotes are derived from the latest block's base fee and never reused
/// across attempts: every retry recomputes from fresh network state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeQuote {
    pub max_fee_per_gas: u64,
    pub priority_fee_per_gas: u64,
}

impl FeeQuote {
    /// Compute a quote from the latest base fee under a policy.
    pub fn compute(base_fee: u64, policy: &FeePolicy) -> Self {
        let max_fee = base_fee
            .saturating_mul(policy.max_fee_multiplier_pct)
            / 100;
        let divisor = policy.priority_divisor.max(1);
        let priority = (max_fee / divisor).min(policy.priority_fee_cap);
        Self {
            max_fee_per_gas: max_fee,
            priority_fee_per_gas: priority,
        }
    }
}
