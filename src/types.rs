//! Witness-generation input handed to the external circuit toolchain.

use crate::field::FieldElement;
use crate::hasher::FieldHasher;
use crate::merkle::{compute_root, MerkleProof};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Input object for witness generation.
///
/// Every field element is a decimal string, `pathIndices` are plain 0/1
/// integers. `context` scopes the circuit's nullifier to one action or epoch;
/// it is carried through unchanged and never interpreted here.
///
/// # Example
///
/// ```json
/// {
///   "secret": "33",
///   "pathElements": ["...", "...", "...", "..."],
///   "pathIndices": [0, 1, 0, 0],
///   "rootExpected": "...",
///   "context": "12345"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WitnessInput {
    pub secret: String,
    pub path_elements: Vec<String>,
    pub path_indices: Vec<u8>,
    pub root_expected: String,
    pub context: String,
}

impl WitnessInput {
    /// Assemble the input for the member holding `secret`.
    pub fn from_proof(secret: FieldElement, proof: &MerkleProof, context: FieldElement) -> Self {
        Self {
            secret: secret.to_decimal_string(),
            path_elements: proof
                .path_elements
                .iter()
                .map(FieldElement::to_decimal_string)
                .collect(),
            path_indices: proof.path_indices.clone(),
            root_expected: proof.root.to_decimal_string(),
            context: context.to_decimal_string(),
        }
    }

    pub fn parse_secret(&self) -> Result<FieldElement> {
        FieldElement::from_decimal_str(&self.secret).context("Invalid secret")
    }

    pub fn parse_root(&self) -> Result<FieldElement> {
        FieldElement::from_decimal_str(&self.root_expected).context("Invalid rootExpected")
    }

    pub fn parse_context(&self) -> Result<FieldElement> {
        FieldElement::from_decimal_str(&self.context).context("Invalid context")
    }

    pub fn parse_path_elements(&self) -> Result<Vec<FieldElement>> {
        self.path_elements
            .iter()
            .enumerate()
            .map(|(i, e)| {
                FieldElement::from_decimal_str(e)
                    .with_context(|| format!("Invalid pathElements[{i}]: '{e}'"))
            })
            .collect()
    }

    /// Checks structure and that the path actually reaches `rootExpected`.
    ///
    /// # Errors
    /// Returns an error if:
    /// - any field is not a canonical decimal field element
    /// - `pathElements` and `pathIndices` differ in length or are empty
    /// - a path index is not 0 or 1
    /// - `hash_leaf(secret)` folded along the path does not equal `rootExpected`
    pub fn validate<H: FieldHasher + ?Sized>(&self, hasher: &H) -> Result<()> {
        debug!("Validating witness input");
        debug!("Path length: {}", self.path_elements.len());

        let secret = self.parse_secret()?;
        let root = self.parse_root()?;
        self.parse_context()?;
        let path_elements = self.parse_path_elements()?;

        if path_elements.is_empty() {
            return Err(anyhow::anyhow!(
                "pathElements cannot be empty. Expected one sibling per tree level."
            ));
        }
        if path_elements.len() != self.path_indices.len() {
            return Err(anyhow::anyhow!(
                "Path length mismatch: {} pathElements but {} pathIndices",
                path_elements.len(),
                self.path_indices.len()
            ));
        }
        self.check_path_bits()?;

        let leaf = hasher.hash_leaf(secret);
        let computed = compute_root(hasher, leaf, &path_elements, &self.path_indices)
            .context("Failed to recompute root from path")?;
        if computed != root {
            return Err(anyhow::anyhow!(
                "Root mismatch: path recomputes to {}, but rootExpected is {}. The secret is not a member of this tree or the path was tampered with.",
                computed,
                root
            ));
        }

        debug!("Witness input validated against root 0x{}", root.to_hex());
        Ok(())
    }

    fn check_path_bits(&self) -> Result<()> {
        match self.path_indices.iter().enumerate().find(|(_, bit)| **bit > 1) {
            Some((i, bit)) => Err(anyhow::anyhow!(
                "pathIndices[{i}] must be 0 or 1, got {bit}"
            )),
            None => Ok(()),
        }
    }

    /// Rebuild the proof carried by this input.
    ///
    /// The leaf index is recovered from the path bits, so every entry of
    /// `pathIndices` must be 0 or 1; anything else is an error.
    pub fn to_proof(&self) -> Result<MerkleProof> {
        self.check_path_bits()?;
        let path_elements = self.parse_path_elements()?;
        let leaf_index = self
            .path_indices
            .iter()
            .rev()
            .fold(0usize, |acc, bit| (acc << 1) | usize::from(*bit));

        Ok(MerkleProof {
            root: self.parse_root()?,
            path_elements,
            path_indices: self.path_indices.clone(),
            leaf_index,
        })
    }
}
