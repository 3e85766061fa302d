use serde::{Deserialize, Serialize};

use evn_chain::ChainConfig;
use evn_envelope::EnvelopeConfig;

use crate::audit::DEFAULT_AUDIT_CONTEXT;
use crate::error::{NotaryError, NotaryResult};

/// Top-level configuration for the notarization service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotaryConfig {
    pub chain: ChainConfig,
    pub envelope: EnvelopeConfig,
    /// Context label audit payloads are sealed under. Changing it orphans
    /// previously committed blobs, so treat it as fixed per deployment.
    #[serde(default = "default_audit_context")]
    pub audit_context: String,
}

fn default_audit_context() -> String {
    DEFAULT_AUDIT_CONTEXT.to_string()
}

impl NotaryConfig {
    /// A local-development configuration over the in-memory chain.
    pub fn devnet(signing_key_hex: impl Into<String>, master_key_hex: impl Into<String>) -> Self {
        Self {
            chain: ChainConfig::devnet(signing_key_hex),
            envelope: EnvelopeConfig {
                master_key_hex: Some(master_key_hex.into()),
                ..Default::default()
            },
            audit_context: default_audit_context(),
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> NotaryResult<Self> {
        toml::from_str(text).map_err(|e| NotaryError::Configuration(e.to_string()))
    }
}
