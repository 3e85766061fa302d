use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use evn_types::Digest;

use crate::canonical::canonical_json;
use crate::config::EnvelopeConfig;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::master::MasterKey;

/// AES-256-GCM nonce length.
const NONCE_LEN: usize = 12;
/// GCM authentication tag length.
const TAG_LEN: usize = 16;
/// Smallest well-formed blob: nonce plus the tag of an empty plaintext.
const MIN_BLOB_LEN: usize = NONCE_LEN + TAG_LEN;

/// Envelope cipher: derives per-context data keys from the master key and
/// seals/unseals payloads with authenticated encryption.
///
/// Data keys are re-derived on every call and never cached; sealed blobs
/// are laid out as `nonce(12) || ciphertext+tag` and can only be unsealed
/// under the originating context string.
pub struct EnvelopeCipher {
    master: MasterKey,
    label_salt: [u8; 32],
}

/// Result of sealing a structured record: the blob plus the integrity hash
/// of the canonical plaintext, stored beside the ciphertext on chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedJson {
    pub blob: Vec<u8>,
    pub data_hash: Digest,
}

impl EnvelopeCipher {
    /// Build a cipher from configuration, loading the master key and
    /// resolving the label salt (configured, or derived from the master
    /// key when absent).
    pub fn from_config(config: &EnvelopeConfig) -> EnvelopeResult<Self> {
        let master = MasterKey::load(config)?;
        let label_salt = match &config.label_salt_hex {
            Some(hex_salt) => {
                let bytes = hex::decode(hex_salt.trim())
                    .map_err(|e| EnvelopeError::Configuration(format!("label salt hex: {e}")))?;
                bytes.try_into().map_err(|v: Vec<u8>| {
                    EnvelopeError::Configuration(format!(
                        "label salt must be exactly 32 bytes, got {}",
                        v.len()
                    ))
                })?
            }
            None => derive_label_salt(&master),
        };
        Ok(Self { master, label_salt })
    }

    /// Build a cipher directly from a master key, deriving the label salt.
    pub fn new(master: MasterKey) -> Self {
        let label_salt = derive_label_salt(&master);
        Self { master, label_salt }
    }

    /// Seal plaintext under a context string.
    ///
    /// A fresh random 96-bit nonce is drawn per call; output layout is
    /// `nonce || ciphertext+tag`.
    pub fn seal(&self, plaintext: &[u8], context: &str) -> EnvelopeResult<Vec<u8>> {
        let key = self.derive_data_key(context);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| EnvelopeError::Encryption {
                context: context.to_string(),
            })?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Unseal a blob under a context string.
    ///
    /// Fails closed: on tag mismatch (tampering, wrong context, wrong key)
    /// no plaintext is returned, partial or otherwise.
    pub fn unseal(&self, blob: &[u8], context: &str) -> EnvelopeResult<Vec<u8>> {
        if blob.len() < MIN_BLOB_LEN {
            return Err(EnvelopeError::Malformed(format!(
                "sealed blob is {} bytes, minimum is {MIN_BLOB_LEN}",
                blob.len()
            )));
        }
        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);

        let key = self.derive_data_key(context);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));

        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| EnvelopeError::Authentication {
                context: context.to_string(),
            })
    }

    /// Seal a structured record, serializing it canonically first so that
    /// logically identical structures always yield an identical
    /// `data_hash` and identical ciphertext semantics.
    pub fn seal_json<T: Serialize>(&self, value: &T, context: &str) -> EnvelopeResult<SealedJson> {
        let plaintext = canonical_json(value)?;
        let data_hash = self.data_hash(&plaintext);
        let blob = self.seal(&plaintext, context)?;
        Ok(SealedJson { blob, data_hash })
    }

    /// Unseal a blob and deserialize the canonical JSON payload.
    pub fn unseal_json<T: DeserializeOwned>(
        &self,
        blob: &[u8],
        context: &str,
    ) -> EnvelopeResult<T> {
        let plaintext = self.unseal(blob, context)?;
        serde_json::from_slice(&plaintext).map_err(|e| EnvelopeError::Serialization(e.to_string()))
    }

    /// Opaque on-chain index key for a human-readable label.
    ///
    /// `blake3(salt || label)` under a domain tag: stable per label,
    /// collision-resistant, and meaningless to observers lacking the salt.
    pub fn label_hash(&self, label: &str) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"evn-label-v1:");
        hasher.update(&self.label_salt);
        hasher.update(label.as_bytes());
        Digest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Integrity hash of a plaintext, stored beside its ciphertext for
    /// tamper-evidence independent of decryption.
    pub fn data_hash(&self, plaintext: &[u8]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"evn-data-v1:");
        hasher.update(plaintext);
        Digest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Derive the 32-byte data key for a context via HKDF-SHA256.
    ///
    /// Salt is itself derived from the master key; info is the context
    /// string. Distinct contexts yield distinct, non-reusable keys. The
    /// key lives only for the duration of the calling operation.
    fn derive_data_key(&self, context: &str) -> Zeroizing<[u8; 32]> {
        let mut salt_hasher = blake3::Hasher::new();
        salt_hasher.update(b"evn-hkdf-salt-v1:");
        salt_hasher.update(self.master.as_bytes());
        let salt = salt_hasher.finalize();

        let hkdf = Hkdf::<Sha256>::new(Some(salt.as_bytes()), self.master.as_bytes());
        let mut key = Zeroizing::new([0u8; 32]);
        hkdf.expand(context.as_bytes(), key.as_mut())
            .expect("32 bytes is a valid HKDF-SHA256 output length");
        key
    }
}

impl std::fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EnvelopeCipher(<redacted>)")
    }
}

fn derive_label_salt(master: &MasterKey) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"evn-label-salt-v1:");
    hasher.update(master.as_bytes());
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn cipher() -> EnvelopeCipher {
        EnvelopeCipher::new(MasterKey::from_bytes([7; 32]))
    }

    #[test]
    fn seal_unseal_roundtrip() {
        let c = cipher();
        for payload in [&b""[..], &b"small"[..], &vec![0xA5u8; 8 * 1024][..]] {
            let blob = c.seal(payload, "ctx").unwrap();
            assert_eq!(c.unseal(&blob, "ctx").unwrap(), payload);
        }
    }

    #[test]
    fn blob_layout_is_nonce_then_ciphertext() {
        let c = cipher();
        let blob = c.seal(b"payload", "ctx").unwrap();
        assert_eq!(blob.len(), NONCE_LEN + b"payload".len() + TAG_LEN);
    }

    #[test]
    fn wrong_context_fails() {
        let c = cipher();
        let blob = c.seal(b"payload", "ctx-a").unwrap();
        let err = c.unseal(&blob, "ctx-b").unwrap_err();
        assert!(matches!(err, EnvelopeError::Authentication { context } if context == "ctx-b"));
    }

    #[test]
    fn wrong_master_key_fails() {
        let blob = cipher().seal(b"payload", "ctx").unwrap();
        let other = EnvelopeCipher::new(MasterKey::from_bytes([8; 32]));
        assert!(other.unseal(&blob, "ctx").is_err());
    }

    #[test]
    fn any_single_bit_flip_fails_closed() {
        let c = cipher();
        let blob = c.seal(b"bit flip target", "ctx").unwrap();
        for byte in 0..blob.len() {
            let mut tampered = blob.clone();
            tampered[byte] ^= 0x01;
            assert!(
                c.unseal(&tampered, "ctx").is_err(),
                "flip at byte {byte} must not decrypt"
            );
        }
    }

    #[test]
    fn short_blob_is_malformed() {
        let c = cipher();
        let err = c.unseal(&[0u8; MIN_BLOB_LEN - 1], "ctx").unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed(_)));
    }

    #[test]
    fn nonces_are_fresh_per_seal() {
        let c = cipher();
        let b1 = c.seal(b"same", "ctx").unwrap();
        let b2 = c.seal(b"same", "ctx").unwrap();
        assert_ne!(b1, b2);
        assert_ne!(&b1[..NONCE_LEN], &b2[..NONCE_LEN]);
    }

    #[test]
    fn label_hash_is_stable_and_distinct() {
        let c = cipher();
        assert_eq!(c.label_hash("run-audit-v1"), c.label_hash("run-audit-v1"));
        assert_ne!(c.label_hash("label-1"), c.label_hash("label-2"));
    }

    #[test]
    fn label_hash_depends_on_salt() {
        let master = || MasterKey::from_bytes([7; 32]);
        let derived = EnvelopeCipher::new(master());
        let configured = EnvelopeCipher::from_config(&EnvelopeConfig {
            master_key_hex: Some(hex::encode([7u8; 32])),
            label_salt_hex: Some("ee".repeat(32)),
            ..Default::default()
        })
        .unwrap();
        assert_ne!(derived.label_hash("l"), configured.label_hash("l"));
    }

    #[test]
    fn data_hash_matches_plaintext_only() {
        let c = cipher();
        assert_eq!(c.data_hash(b"x"), c.data_hash(b"x"));
        assert_ne!(c.data_hash(b"x"), c.data_hash(b"y"));
    }

    #[test]
    fn seal_json_field_order_yields_same_data_hash() {
        let c = cipher();
        let s1 = c.seal_json(&json!({"a": 1, "b": 2}), "ctx").unwrap();
        let s2 = c.seal_json(&json!({"b": 2, "a": 1}), "ctx").unwrap();
        assert_eq!(s1.data_hash, s2.data_hash);
    }

    #[test]
    fn unseal_json_roundtrip() {
        let c = cipher();
        let value = json!({"run_id": "r1", "value": 42});
        let sealed = c.seal_json(&value, "run-audit-v1").unwrap();
        let restored: serde_json::Value = c.unseal_json(&sealed.blob, "run-audit-v1").unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn from_config_rejects_bad_label_salt() {
        let result = EnvelopeCipher::from_config(&EnvelopeConfig {
            master_key_hex: Some(hex::encode([1u8; 32])),
            label_salt_hex: Some("abcd".into()),
            ..Default::default()
        });
        assert!(matches!(result, Err(EnvelopeError::Configuration(_))));
    }

    proptest! {
        #[test]
        fn roundtrip_any_payload_any_context(
            payload in proptest::collection::vec(any::<u8>(), 0..2048),
            context in "[a-zA-Z0-9:/_-]{1,40}",
        ) {
            let c = cipher();
            let blob = c.seal(&payload, &context).unwrap();
            prop_assert_eq!(c.unseal(&blob, &context).unwrap(), payload);
        }

        #[test]
        fn distinct_contexts_never_cross_unseal(
            payload in proptest::collection::vec(any::<u8>(), 1..256),
            ctx_a in "[a-z]{1,12}",
            ctx_b in "[A-Z]{1,12}",
        ) {
            let c = cipher();
            let blob = c.seal(&payload, &ctx_a).unwrap();
            prop_assert!(c.unseal(&blob, &ctx_b).is_err());
        }
    }
}
