//! Poseidon Merkle Membership Commitments
//!
//! This library builds fixed-depth Merkle trees over secret field elements and
//! extracts inclusion paths in the shape a membership circuit consumes. It
//! never proves or verifies a SNARK; it produces the root, the leaves and the
//! authentication path that the proving toolchain takes as plain data.
//!
//! # Components
//!
//! - [`PoseidonHasher`]: unary leaf hash and binary node hash ([`FieldHasher`])
//! - [`MerkleTree`]: fixed-depth tree, zero-padded to `2^depth` leaves
//! - [`MerkleProof`]: sibling path plus left/right bits for one leaf
//! - [`WitnessInput`]: JSON input for witness generation
//! - [`FieldElement`]: canonical element of the Pallas base field
//!
//! # Example
//!
//! ```
//! use zkp_merkle_membership::{FieldElement, FieldHasher, MerkleTree, PoseidonHasher};
//!
//! let hasher = PoseidonHasher::new().unwrap();
//! let secrets: Vec<FieldElement> = [11u64, 22, 33, 44].into_iter().map(Into::into).collect();
//!
//! let tree = MerkleTree::build(&hasher, &secrets, 4).unwrap();
//! let proof = tree.generate_proof(2).unwrap();
//!
//! assert!(proof.verify(&hasher, hasher.hash_leaf(secrets[2])));
//! assert!(!proof.verify(&hasher, hasher.hash_leaf(secrets[3])));
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod hasher;
pub mod merkle;
pub mod types;
pub mod utils;


pub use error::{MerkleError, Result};
pub use field::FieldElement;
pub use hasher::{FieldHasher, PoseidonHasher};
pub use merkle::{compute_root, MerkleProof, MerkleTree, MAX_TREE_DEPTH};
pub use types::WitnessInput;
