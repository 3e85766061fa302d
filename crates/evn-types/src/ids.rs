use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Caller-assigned identifier for one notarization run.
///
/// The research pipeline owns run identity; EVN only requires that the
/// identifier is non-empty and stable for the lifetime of the run.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Create a run ID from a non-empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypeError::EmptyRunId);
        }
        Ok(Self(id))
    }

    /// The run ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunId({})", self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash of a broadcast chain transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Create from a raw 32-byte hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| TypeError::InvalidLength {
            expected: 32,
            actual: v.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// On-chain account or contract address.
///
/// EVN treats addresses as opaque 20-byte values; the chain defines their
/// semantics.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    /// Create from raw 20 bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The raw 20-byte address.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 20] = bytes.try_into().map_err(|v: Vec<u8>| TypeError::InvalidLength {
            expected: 20,
            actual: v.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_rejects_empty() {
        assert!(matches!(RunId::new(""), Err(TypeError::EmptyRunId)));
        assert!(matches!(RunId::new("   "), Err(TypeError::EmptyRunId)));
    }

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new("run-2026-001").unwrap();
        assert_eq!(id.as_str(), "run-2026-001");
        assert_eq!(format!("{id}"), "run-2026-001");
    }

    #[test]
    fn tx_hash_hex_roundtrip() {
        let tx = TxHash::from_hash([0xab; 32]);
        let parsed = TxHash::from_hex(&tx.to_hex()).unwrap();
        assert_eq!(tx, parsed);
    }

    #[test]
    fn tx_hash_rejects_short_hex() {
        let err = TxHash::from_hex("abcd").unwrap_err();
        assert!(matches!(err, TypeError::InvalidLength { expected: 32, .. }));
    }

    #[test]
    fn address_hex_roundtrip() {
        let addr = Address::from_bytes([0x11; 20]);
        let parsed = Address::from_hex(&addr.to_hex()).unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn address_accepts_0x_prefix() {
        let addr = Address::from_bytes([0x22; 20]);
        let parsed = Address::from_hex(&format!("0x{}", addr.to_hex())).unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn address_display_has_0x_prefix() {
        let addr = Address::from_bytes([0; 20]);
        assert!(format!("{addr}").starts_with("0x"));
    }

    #[test]
    fn serde_roundtrips() {
        let id = RunId::new("r1").unwrap();
        let tx = TxHash::from_hash([1; 32]);
        let addr = Address::from_bytes([2; 20]);
        let id2: RunId = serde_json::from_str(&serde_json::to_string(&id).unwrap()).unwrap();
        let tx2: TxHash = serde_json::from_str(&serde_json::to_string(&tx).unwrap()).unwrap();
        let addr2: Address = serde_json::from_str(&serde_json::to_string(&addr).unwrap()).unwrap();
        assert_eq!(id, id2);
        assert_eq!(tx, tx2);
        assert_eq!(addr, addr2);
    }
}
