use thiserror::Error;

/// Result alias for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors produced by the chain client.
///
/// The taxonomy drives retry behavior: `Configuration` is fatal and never
/// retried; `Network` is retried up to the configured budget and then
/// escalated to `RetriesExhausted`; `Reverted` is terminal because the
/// calls are deterministic — resubmitting identical arguments would revert
/// again. Absent records are not errors at all: reads return `Option`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    /// Bad or missing configuration: wrong chain id, unreachable endpoint
    /// on first use, malformed keys or addresses. Fatal, never retried.
    #[error("chain configuration error: {0}")]
    Configuration(String),

    /// Transient transport failure: unreachable RPC, broadcast rejection,
    /// receipt timeout. Retried with a refreshed nonce and recomputed fee.
    #[error("network error: {0}")]
    Network(String),

    /// The transaction was mined but reverted. Terminal unless the reason
    /// is the idempotent "already exists" case, which callers treat as
    /// success.
    #[error("transaction reverted: {reason}")]
    Reverted { reason: String },

    /// The retry budget was spent. Carries the last underlying cause.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// Signing or payload encoding failed while building a transaction.
    #[error("transaction build error: {0}")]
    Build(String),
}

impl ChainError {
    /// Whether the submission loop may retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
