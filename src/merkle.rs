//! Fixed-depth Merkle tree over Poseidon leaf and node hashes.
//!
//! The tree is stored as an arena of layers, leaves first. Layer `d` holds
//! `2^(depth - d)` values and the last layer holds only the root. Leaves are
//! `hash_leaf(secret)` for each supplied secret; the remaining slots are
//! padded with a literal zero, which is never passed through the hash.

use crate::error::{MerkleError, Result};
use crate::field::FieldElement;
use crate::hasher::FieldHasher;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deepest tree accepted by [`MerkleTree::build`].
///
/// A depth-20 tree already holds about a million leaves and two million field
/// elements in memory.
pub const MAX_TREE_DEPTH: usize = 20;

/// Inclusion proof for one leaf.
///
/// `path_indices[d] == 1` means the path node at level `d` is a right child,
/// so its sibling `path_elements[d]` sits on the left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    pub root: FieldElement,
    pub path_elements: Vec<FieldElement>,
    pub path_indices: Vec<u8>,
    pub leaf_index: usize,
}

/// A complete binary Merkle tree of fixed depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    layers: Vec<Vec<FieldElement>>,
}

fn check_depth(depth: usize) -> Result<usize> {
    if depth == 0 || depth > MAX_TREE_DEPTH {
        return Err(MerkleError::InvalidDepth {
            depth,
            max: MAX_TREE_DEPTH,
        });
    }
    Ok(1usize << depth)
}

impl MerkleTree {
    /// Builds a tree committing to `secrets`, in order, at the given depth.
    ///
    /// # Errors
    /// - [`MerkleError::InvalidDepth`] if `depth` is 0 or above [`MAX_TREE_DEPTH`]
    /// - [`MerkleError::TooManyMembers`] if `secrets.len() > 2^depth`
    ///
    /// # Example
    ///
    /// ```
    /// use zkp_merkle_membership::{FieldElement, MerkleTree, PoseidonHasher};
    ///
    /// let hasher = PoseidonHasher::new().unwrap();
    /// let secrets: Vec<FieldElement> = [11u64, 22, 33, 44].into_iter().map(Into::into).collect();
    /// let tree = MerkleTree::build(&hasher, &secrets, 4).unwrap();
    /// assert_eq!(tree.leaves().len(), 16);
    /// ```
    pub fn build<H: FieldHasher + ?Sized>(
        hasher: &H,
        secrets: &[FieldElement],
        depth: usize,
    ) -> Result<Self> {
        let capacity = check_depth(depth)?;
        if secrets.len() > capacity {
            return Err(MerkleError::TooManyMembers {
                count: secrets.len(),
                capacity,
                depth,
            });
        }

        let leaves: Vec<FieldElement> = secrets.iter().map(|s| hasher.hash_leaf(*s)).collect();
        debug!(
            "Hashed {} secrets into leaves (depth {}, capacity {})",
            leaves.len(),
            depth,
            capacity
        );

        Self::from_leaves(hasher, leaves, depth)
    }

    /// Builds a tree from leaves that are already hashed.
    ///
    /// Missing leaves up to `2^depth` are filled with zero.
    pub fn from_leaves<H: FieldHasher + ?Sized>(
        hasher: &H,
        mut leaves: Vec<FieldElement>,
        depth: usize,
    ) -> Result<Self> {
        let capacity = check_depth(depth)?;
        if leaves.len() > capacity {
            return Err(MerkleError::TooManyMembers {
                count: leaves.len(),
                capacity,
                depth,
            });
        }

        leaves.resize(capacity, FieldElement::zero());

        let mut layers = Vec::with_capacity(depth + 1);
        layers.push(leaves);

        for d in 0..depth {
            let level = &layers[d];
            let next: Vec<FieldElement> = level
                .chunks_exact(2)
                .map(|pair| hasher.hash_node(pair[0], pair[1]))
                .collect();
            layers.push(next);
        }

        let tree = MerkleTree { layers };
        debug!("Built Merkle tree, root 0x{}", tree.root().to_hex());
        Ok(tree)
    }

    pub fn root(&self) -> FieldElement {
        self.layers[self.depth()][0]
    }

    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// All `2^depth` leaves, padding included.
    pub fn leaves(&self) -> &[FieldElement] {
        &self.layers[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Layer at distance `level` from the leaves, if it exists.
    pub fn layer(&self, level: usize) -> Option<&[FieldElement]> {
        self.layers.get(level).map(Vec::as_slice)
    }

    pub fn layers(&self) -> &[Vec<FieldElement>] {
        &self.layers
    }

    /// Generate the inclusion proof for the leaf at `leaf_index`.
    ///
    /// # Errors
    /// Returns [`MerkleError::IndexOutOfRange`] if `leaf_index >= 2^depth`.
    pub fn generate_proof(&self, leaf_index: usize) -> Result<MerkleProof> {
        let leaf_count = self.leaf_count();
        if leaf_index >= leaf_count {
            return Err(MerkleError::IndexOutOfRange {
                index: leaf_index,
                leaf_count,
            });
        }

        let depth = self.depth();
        let mut path_elements = Vec::with_capacity(depth);
        let mut path_indices = Vec::with_capacity(depth);
        let mut index = leaf_index;

        for level in &self.layers[..depth] {
            let is_right = index % 2 == 1;
            let sibling_index = if is_right { index - 1 } else { index + 1 };

            path_elements.push(level[sibling_index]);
            path_indices.push(u8::from(is_right));

            index /= 2;
        }

        Ok(MerkleProof {
            root: self.root(),
            path_elements,
            path_indices,
            leaf_index,
        })
    }

    /// Verify a proof for `leaf` against this tree's root.
    ///
    /// Fails if the proof claims a different root, even when the path itself
    /// is internally consistent.
    pub fn verify_proof<H: FieldHasher + ?Sized>(
        &self,
        hasher: &H,
        leaf: FieldElement,
        proof: &MerkleProof,
    ) -> bool {
        if proof.root != self.root() {
            return false;
        }
        proof.verify(hasher, leaf)
    }
}

/// Recompute a root from `leaf` and an authentication path.
///
/// Returns `None` if the two sequences differ in length or an index is not 0 or 1.
pub fn compute_root<H: FieldHasher + ?Sized>(
    hasher: &H,
    leaf: FieldElement,
    path_elements: &[FieldElement],
    path_indices: &[u8],
) -> Option<FieldElement> {
    if path_elements.len() != path_indices.len() {
        return None;
    }

    let mut current = leaf;
    for (sibling, bit) in path_elements.iter().zip(path_indices) {
        current = match bit {
            0 => hasher.hash_node(current, *sibling),
            1 => hasher.hash_node(*sibling, current),
            _ => return None,
        };
    }
    Some(current)
}

impl MerkleProof {
    pub fn depth(&self) -> usize {
        self.path_elements.len()
    }

    /// Root obtained by folding `leaf` up this proof's path.
    pub fn compute_root<H: FieldHasher + ?Sized>(
        &self,
        hasher: &H,
        leaf: FieldElement,
    ) -> Option<FieldElement> {
        compute_root(hasher, leaf, &self.path_elements, &self.path_indices)
    }

    /// Check that `leaf` hashes up this path to the proof's own root.
    pub fn verify<H: FieldHasher + ?Sized>(&self, hasher: &H, leaf: FieldElement) -> bool {
        match self.compute_root(hasher, leaf) {
            Some(root) => root == self.root,
            None => {
                debug!(
                    "Malformed proof: {} path elements, {} path indices",
                    self.path_elements.len(),
                    self.path_indices.len()
                );
                false
            }
        }
    }
}

impl fmt::Display for MerkleProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MerkleProof:\n  Root: 0x{}\n  Leaf index: {}\n  Depth: {}\n  Path indices: {:?}",
            self.root.to_hex(),
            self.leaf_index,
            self.depth(),
            self.path_indices
        )
    }
}
