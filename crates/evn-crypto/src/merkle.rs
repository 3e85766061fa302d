use serde::{Deserialize, Serialize};

use evn_types::Digest;

/// Side of a sibling in a Merkle proof path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Binary Merkle tree committing to an ordered leaf sequence.
///
/// Order is a commitment parameter: `build([a, b]) != build([b, a])` in
/// general. Supports generating inclusion proofs and verifying them.
///
/// Proof generation and verification use one canonical combination rule —
/// siblings are concatenated in tree-position order, carried explicitly as
/// [`Side`] in the proof path. Both paths apply the identical rule.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// The root hash of the tree.
    root: Digest,
    /// Original leaf hashes, in input order.
    leaves: Vec<Digest>,
    /// All tree nodes, stored level by level.
    /// Level 0 = leaves, last element = root.
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// Build a Merkle tree from ordered leaf digests.
    ///
    /// An empty list produces the zero-sentinel root. A single leaf is its
    /// own root, unhashed. With more leaves, adjacent pairs are hashed
    /// left-to-right (duplicating the last hash when the count is odd)
    /// until one digest remains.
    pub fn build(leaves: Vec<Digest>) -> Self {
        if leaves.is_empty() {
            return Self {
                root: Digest::zero(),
                leaves: vec![],
                levels: vec![],
            };
        }

        let mut levels: Vec<Vec<Digest>> = vec![leaves.clone()];
        let mut current = leaves.clone();

        while current.len() > 1 {
            let mut next = Vec::with_capacity((current.len() + 1) / 2);
            for pair in current.chunks(2) {
                let hash = if pair.len() == 2 {
                    hash_pair(&pair[0], &pair[1])
                } else {
                    // Odd node: hash with itself
                    hash_pair(&pair[0], &pair[0])
                };
                next.push(hash);
            }
            levels.push(next.clone());
            current = next;
        }

        let root = current[0];
        Self {
            root,
            leaves,
            levels,
        }
    }

    /// The root digest of the tree.
    pub fn root(&self) -> Digest {
        self.root
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Generate an inclusion proof for the leaf at `index`.
    ///
    /// Walks the same pairing structure used by [`MerkleTree::build`],
    /// emitting at each level the sibling digest needed to recompute the
    /// parent. Returns `None` for an out-of-bounds index.
    pub fn prove_inclusion(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaves.len() || self.levels.is_empty() {
            return None;
        }

        let mut path = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_idx = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
            let sibling = if sibling_idx < level.len() {
                level[sibling_idx]
            } else {
                // Odd level: the last element pairs with itself
                level[idx]
            };
            let side = if idx % 2 == 0 {
                Side::Right
            } else {
                Side::Left
            };
            path.push((sibling, side));
            idx /= 2;
        }

        Some(MerkleProof {
            leaf: self.leaves[index],
            path,
            root: self.root,
        })
    }
}

/// Merkle inclusion proof.
///
/// The minimal sibling set needed to recompute the root from one leaf,
/// proving inclusion without revealing the rest of the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The leaf being proven.
    pub leaf: Digest,
    /// Path of (sibling_digest, sibling_side) pairs from leaf to root.
    pub path: Vec<(Digest, Side)>,
    /// Expected root digest.
    pub root: Digest,
}

impl MerkleProof {
    /// Verify the proof against its embedded root.
    pub fn verify(&self) -> bool {
        self.verify_against(&self.root)
    }

    /// Recompute the root from the leaf and path using the same
    /// tree-position combination rule as generation, and compare against
    /// `root`. Returns `true` only on exact equality.
    pub fn verify_against(&self, root: &Digest) -> bool {
        let mut current = self.leaf;
        for (sibling, side) in &self.path {
            current = match side {
                Side::Left => hash_pair(sibling, &current),
                Side::Right => hash_pair(&current, sibling),
            };
        }
        current == *root
    }
}

fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"evn-merkle-v1:");
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Digest::from_hash(*hasher.finalize().as_bytes())
}
