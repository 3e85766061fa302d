use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::EnvelopeConfig;
use crate::error::{EnvelopeError, EnvelopeResult};

/// Argon2id parameters for the dev-secret fallback (OWASP 2024 shape:
/// memory-hard single pass).
const ARGON2_MEMORY_KIB: u32 = 47_104; // ~46 MiB
const ARGON2_TIME_COST: u32 = 1;
const ARGON2_PARALLELISM: u32 = 1;

/// Process-wide 32-byte master secret.
///
/// Loaded once at startup and held for the process lifetime. The key is
/// zeroized on drop and never appears in logs, serialization, or `Debug`
/// output; every data key is derived from it per call and discarded.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; 32]);

impl MasterKey {
    /// Resolve the master key from configuration.
    ///
    /// The production path requires `master_key_hex` to decode to exactly
    /// 32 bytes. Outside production, a `dev_secret` may be stretched into
    /// a key via Argon2id — but only behind `allow_dev_master_key`, and
    /// never when `production` is set.
    pub fn load(config: &EnvelopeConfig) -> EnvelopeResult<Self> {
        if let Some(hex_key) = &config.master_key_hex {
            let bytes = hex::decode(hex_key.trim())
                .map_err(|e| EnvelopeError::Configuration(format!("master key hex: {e}")))?;
            let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
                EnvelopeError::Configuration(format!(
                    "master key must be exactly 32 bytes, got {}",
                    v.len()
                ))
            })?;
            return Ok(Self(arr));
        }

        let Some(dev_secret) = &config.dev_secret else {
            return Err(EnvelopeError::Configuration(
                "no master key material configured".into(),
            ));
        };

        if config.production {
            return Err(EnvelopeError::Configuration(
                "dev master key fallback is refused in production".into(),
            ));
        }
        if !config.allow_dev_master_key {
            return Err(EnvelopeError::Configuration(
                "dev_secret is set but allow_dev_master_key is not".into(),
            ));
        }

        tracing::warn!(
            "deriving master key from low-entropy dev secret; NOT suitable for production"
        );
        Self::derive_dev(dev_secret)
    }

    /// Create from raw 32 bytes (tests and embedding callers that manage
    /// secret material themselves).
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw key bytes. Callers must not copy these anywhere long-lived.
    pub(crate) fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Stretch a low-entropy secret into a 32-byte key with Argon2id.
    fn derive_dev(secret: &str) -> EnvelopeResult<Self> {
        use argon2::{Algorithm, Argon2, Params, Version};

        let params = Params::new(ARGON2_MEMORY_KIB, ARGON2_TIME_COST, ARGON2_PARALLELISM, Some(32))
            .map_err(|e| EnvelopeError::Configuration(format!("argon2 params: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        // Fixed application salt: the dev path trades salt secrecy for
        // reproducible local keys.
        let salt = blake3::hash(b"evn-dev-master-salt-v1");

        let mut out = [0u8; 32];
        argon2
            .hash_password_into(secret.as_bytes(), salt.as_bytes(), &mut out)
            .map_err(|e| EnvelopeError::Configuration(format!("argon2: {e}")))?;
        Ok(Self(out))
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MasterKey(<redacted>)")
    }
}
