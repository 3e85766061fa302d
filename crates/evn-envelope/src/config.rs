use serde::{Deserialize, Serialize};

/// Configuration for the envelope encryption engine.
///
/// Exactly one of `master_key_hex` or `dev_secret` must be set. The dev
/// fallback derives a master key from a low-entropy secret through a slow
/// KDF; it exists for local development only and is refused outright when
/// `production` is set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Hex-encoded 32-byte master key. The production path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_key_hex: Option<String>,
    /// Low-entropy development secret, stretched via Argon2id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_secret: Option<String>,
    /// Explicit opt-in for the dev fallback. Without it, `dev_secret` is
    /// rejected even outside production.
    #[serde(default)]
    pub allow_dev_master_key: bool,
    /// When set, only `master_key_hex` is accepted.
    #[serde(default)]
    pub production: bool,
    /// Hex-encoded 32-byte salt for label hashing. When absent, a salt is
    /// derived from the master key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_salt_hex: Option<String>,
}

impl EnvelopeConfig {
    /// Production configuration from a hex master key.
    pub fn from_master_key_hex(hex: impl Into<String>) -> Self {
        Self {
            master_key_hex: Some(hex.into()),
            production: true,
            ..Default::default()
        }
    }

    /// Development configuration from a low-entropy secret.
    pub fn dev(secret: impl Into<String>) -> Self {
        Self {
            dev_secret: Some(secret.into()),
            allow_dev_master_key: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_constructor_sets_flag() {
        let c = EnvelopeConfig::from_master_key_hex("ab".repeat(32));
        assert!(c.production);
        assert!(c.master_key_hex.is_some());
        assert!(c.dev_secret.is_none());
    }

    #[test]
    fn dev_constructor_opts_in() {
        let c = EnvelopeConfig::dev("local-secret");
        assert!(c.allow_dev_master_key);
        assert!(!c.production);
    }

    #[test]
    fn toml_roundtrip() {
        let c = EnvelopeConfig::dev("s");
        let encoded = toml::to_string(&c).unwrap();
        let decoded: EnvelopeConfig = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded.dev_secret.as_deref(), Some("s"));
        assert!(decoded.allow_dev_master_key);
    }
}
