use serde::{Deserialize, Serialize};

use evn_types::Address;

/// Ed25519 signing key for the chain submission account (private).
///
/// One signer is loaded per process from configured secret material; all
/// chain calls originate from its address.
pub struct TxSigner(ed25519_dalek::SigningKey);

/// Ed25519 verifying key (public).
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyingKey(ed25519_dalek::VerifyingKey);

/// Ed25519 signature over a transaction digest.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "signature_serde")] ed25519_dalek::Signature);

impl TxSigner {
    /// Generate a new random signing key (tests and local development).
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        Self(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Create from a raw 32-byte secret.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    /// Parse from a hex-encoded 32-byte secret, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self, SignerError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| SignerError::InvalidKey)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| SignerError::InvalidKey)?;
        Ok(Self::from_bytes(arr))
    }

    /// The corresponding public verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }

    /// The account address: the truncated BLAKE3 hash of the public key.
    pub fn address(&self) -> Address {
        self.verifying_key().to_address()
    }

    /// Sign a message (typically a transaction digest).
    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message))
    }
}

impl VerifyingKey {
    /// Verify a signature on a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), SignerError> {
        use ed25519_dalek::Verifier;
        self.0
            .verify(message, &signature.0)
            .map_err(|_| SignerError::InvalidSignature)
    }

    /// Derive the account address from this public key.
    pub fn to_address(&self) -> Address {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"evn-address-v1:");
        hasher.update(&self.0.to_bytes());
        let hash = hasher.finalize();
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash.as_bytes()[..20]);
        Address::from_bytes(addr)
    }

    /// Raw public key bytes.
    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Create from raw 32-byte public key.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, SignerError> {
        let key = ed25519_dalek::VerifyingKey::from_bytes(&bytes)
            .map_err(|_| SignerError::InvalidKey)?;
        Ok(Self(key))
    }
}

impl std::fmt::Debug for TxSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TxSigner(<redacted>)")
    }
}

impl std::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerifyingKey({})", hex::encode(self.0.to_bytes()))
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0.to_bytes()[..8]))
    }
}

/// Errors from signing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid key")]
    InvalidKey,
}

mod signature_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(sig: &ed25519_dalek::Signature, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&sig.to_bytes())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ed25519_dalek::Signature, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 64-byte signature"))?;
        Ok(ed25519_dalek::Signature::from_bytes(&arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let sk = TxSigner::generate();
        let vk = sk.verifying_key();
        let message = b"tx digest";
        let sig = sk.sign(message);
        assert!(vk.verify(message, &sig).is_ok());
    }

    #[test]
    fn verify_fails_on_wrong_message() {
        let sk = TxSigner::generate();
        let sig = sk.sign(b"correct message");
        assert!(sk.verifying_key().verify(b"wrong message", &sig).is_err());
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        let sk1 = TxSigner::generate();
        let sk2 = TxSigner::generate();
        let sig = sk1.sign(b"message");
        assert!(sk2.verifying_key().verify(b"message", &sig).is_err());
    }

    #[test]
    fn address_is_deterministic() {
        let sk = TxSigner::generate();
        assert_eq!(sk.address(), sk.address());
    }

    #[test]
    fn different_keys_different_addresses() {
        let sk1 = TxSigner::generate();
        let sk2 = TxSigner::generate();
        assert_ne!(sk1.address(), sk2.address());
    }

    #[test]
    fn from_hex_roundtrip() {
        let sk = TxSigner::from_bytes([7; 32]);
        let sk2 = TxSigner::from_hex(&hex::encode([7u8; 32])).unwrap();
        assert_eq!(sk.verifying_key(), sk2.verifying_key());
    }

    #[test]
    fn from_hex_accepts_0x_prefix() {
        let sk = TxSigner::from_hex(&format!("0x{}", hex::encode([9u8; 32]))).unwrap();
        assert_eq!(sk.verifying_key(), TxSigner::from_bytes([9; 32]).verifying_key());
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(matches!(TxSigner::from_hex("abcd"), Err(SignerError::InvalidKey)));
        assert!(matches!(TxSigner::from_hex("zz"), Err(SignerError::InvalidKey)));
    }

    #[test]
    fn signature_serde_roundtrip() {
        let sk = TxSigner::generate();
        let sig = sk.sign(b"test");
        let json = serde_json::to_string(&sig).unwrap();
        let parsed: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, parsed);
    }

    #[test]
    fn debug_redacts_signing_key() {
        let sk = TxSigner::generate();
        let debug = format!("{sk:?}");
        assert!(debug.contains("redacted"));
    }
}
