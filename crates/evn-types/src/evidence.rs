use serde::{Deserialize, Serialize};

use crate::digest::Digest;

/// One ordered piece of evidence text supplied by the research pipeline.
///
/// Ordering is significant: the position of an item in the input sequence
/// is part of the Merkle commitment. The upstream pipeline owns
/// deduplication and ordering policy; EVN preserves whatever it is given.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Raw evidence text, exactly as supplied.
    pub text: String,
    /// Optional opaque source tag (e.g. a document or citation reference).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl EvidenceItem {
    /// Create an item from text only.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    /// Create an item with a source tag.
    pub fn with_source(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: Some(source.into()),
        }
    }
}

/// Digest of a raw evidence collection.
///
/// Computed over the JSON serialization of the full item sequence, so any
/// change to content, order, or count changes the digest. This is the
/// integrity anchor stored inside sealed audit payloads, independent of the
/// Merkle root over normalized leaves.
pub fn evidence_digest(items: &[EvidenceItem]) -> Digest {
    let serialized = serde_json::to_vec(items).unwrap_or_default();
    Digest::from_bytes(&serialized)
}
