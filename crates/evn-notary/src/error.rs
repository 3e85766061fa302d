use thiserror::Error;

/// Result alias for notary operations.
pub type NotaryResult<T> = Result<T, NotaryError>;

/// Errors produced by the notarization service.
///
/// These wrap the engine errors without flattening them: retry behavior
/// and the configuration/transient distinction established in `evn-chain`
/// and `evn-envelope` survive the trip to the caller. Verification
/// mismatches and absent audit records are values, never errors.
#[derive(Debug, Error)]
pub enum NotaryError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("chain error: {0}")]
    Chain(#[from] evn_chain::ChainError),

    #[error("envelope error: {0}")]
    Envelope(#[from] evn_envelope::EnvelopeError),

    #[error("audit payload error: {0}")]
    AuditPayload(String),
}
