use evn_types::Digest;

/// Domain-separated BLAKE3 leaf hasher with whitespace normalization.
///
/// Each hasher carries a domain tag (e.g. `"evn-leaf-v1"`) that is prepended
/// to every hash computation. This prevents cross-type hash collisions: an
/// evidence leaf and a label with identical bytes will produce different
/// hashes.
///
/// Leaf hashing is locale-independent and pure: equal normalized text
/// always produces an equal digest, on any platform.
pub struct LeafHasher {
    domain: &'static str,
}

impl LeafHasher {
    /// Hasher for evidence leaves.
    pub const LEAF: Self = Self {
        domain: "evn-leaf-v1",
    };
    /// Hasher for release artifacts (source and build outputs).
    pub const ARTIFACT: Self = Self {
        domain: "evn-artifact-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Normalize evidence text: trim, collapse internal whitespace runs to
    /// a single ASCII space. Empty or whitespace-only text normalizes to
    /// the empty string.
    pub fn normalize(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Hash normalized text with domain separation.
    ///
    /// `leaf_hash(x) == leaf_hash(y)` whenever `normalize(x) == normalize(y)`;
    /// in particular, empty and whitespace-only text map to the hash of the
    /// canonical empty string.
    pub fn leaf_hash(&self, text: &str) -> Digest {
        self.hash(Self::normalize(text).as_bytes())
    }

    /// Hash raw bytes with domain separation, no normalization.
    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Digest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that text produces the expected leaf digest.
    pub fn verify(&self, text: &str, expected: &Digest) -> bool {
        self.leaf_hash(text) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_trims_and_collapses() {
        assert_eq!(LeafHasher::normalize("  Hello   world  "), "Hello world");
        assert_eq!(LeafHasher::normalize("a\t\nb"), "a b");
        assert_eq!(LeafHasher::normalize("plain"), "plain");
    }

    #[test]
    fn normalize_empty_and_whitespace() {
        assert_eq!(LeafHasher::normalize(""), "");
        assert_eq!(LeafHasher::normalize("   \t\n "), "");
    }

    #[test]
    fn equal_normalized_text_equal_hash() {
        let h1 = LeafHasher::LEAF.leaf_hash("Hello world");
        let h2 = LeafHasher::LEAF.leaf_hash("  Hello   world  ");
        assert_eq!(h1, h2);
    }

    #[test]
    fn empty_equals_whitespace_only() {
        assert_eq!(
            LeafHasher::LEAF.leaf_hash(""),
            LeafHasher::LEAF.leaf_hash("   ")
        );
    }

    #[test]
    fn different_text_different_hash() {
        assert_ne!(
            LeafHasher::LEAF.leaf_hash("first"),
            LeafHasher::LEAF.leaf_hash("second")
        );
    }

    #[test]
    fn hash_is_deterministic() {
        let h1 = LeafHasher::LEAF.leaf_hash("some evidence");
        let h2 = LeafHasher::LEAF.leaf_hash("some evidence");
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let leaf = LeafHasher::LEAF.hash(b"same content");
        let artifact = LeafHasher::ARTIFACT.hash(b"same content");
        assert_ne!(leaf, artifact);
    }

    #[test]
    fn verify_correct_text() {
        let d = LeafHasher::LEAF.leaf_hash("evidence text");
        assert!(LeafHasher::LEAF.verify("  evidence   text ", &d));
        assert!(!LeafHasher::LEAF.verify("tampered text", &d));
    }

    #[test]
    fn custom_domain() {
        let hasher = LeafHasher::new("my-custom-domain-v1");
        assert_ne!(hasher.hash(b"data"), LeafHasher::LEAF.hash(b"data"));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in ".{0,200}") {
            let once = LeafHasher::normalize(&s);
            let twice = LeafHasher::normalize(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn surrounding_whitespace_never_changes_hash(s in "[a-zA-Z0-9 ]{0,80}") {
            let padded = format!("  \t{s}\n ");
            prop_assert_eq!(
                LeafHasher::LEAF.leaf_hash(&s),
                LeafHasher::LEAF.leaf_hash(&padded)
            );
        }
    }
}
