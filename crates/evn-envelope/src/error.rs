use thiserror::Error;

/// Result alias for envelope operations.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// Errors produced by envelope encryption operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Bad, missing, or forbidden key material. Fatal; never retried.
    #[error("envelope configuration error: {0}")]
    Configuration(String),

    /// AEAD tag verification failed during unseal. The blob was tampered
    /// with, or the wrong context/key was used. No plaintext is returned.
    #[error("authentication failed unsealing blob under context {context:?}")]
    Authentication { context: String },

    /// The AEAD encryption itself failed (e.g. oversized plaintext).
    #[error("encryption failed under context {context:?}")]
    Encryption { context: String },

    /// The blob is structurally invalid (e.g. shorter than nonce + tag).
    #[error("malformed sealed blob: {0}")]
    Malformed(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
