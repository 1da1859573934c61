//! Poseidon hashing for leaves and internal nodes.
//!
//! Both arities run the same `P128Pow5T3` permutation (width 3, rate 2). The
//! sponge encodes the message length in its capacity element, so a one-input
//! leaf hash and a two-input node hash live in separate domains and a leaf can
//! never be replayed as an internal pair.

use crate::error::{MerkleError, Result};
use crate::field::FieldElement;
use halo2_gadgets::poseidon::primitives::{Mds, P128Pow5T3 as PoseidonSpec, Spec};
use log::debug;
use pasta_curves::group::ff::PrimeField;
use pasta_curves::pallas;
use std::fmt;

/// Poseidon state width.
pub const WIDTH: usize = 3;
/// Poseidon sponge rate.
pub const RATE: usize = 2;

type State = [pallas::Base; WIDTH];

/// Hash interface used by tree construction and proof verification.
///
/// Implementations must be deterministic and order sensitive in
/// [`hash_node`](FieldHasher::hash_node).
pub trait FieldHasher: Send + Sync {
    /// Unary hash, applied to a member secret to produce its leaf.
    fn hash_leaf(&self, value: FieldElement) -> FieldElement;

    /// Binary hash of an ordered `(left, right)` child pair.
    fn hash_node(&self, left: FieldElement, right: FieldElement) -> FieldElement;
}

/// Poseidon over the Pallas base field.
///
/// Owns the round constants and MDS matrix loaded by [`PoseidonHasher::new`];
/// every hash call reuses them. Construct once and share by reference.
#[derive(Clone)]
pub struct PoseidonHasher {
    round_constants: Vec<State>,
    mds: Mds<pallas::Base, WIDTH>,
    full_rounds: usize,
    partial_rounds: usize,
}

impl PoseidonHasher {
    /// Loads the permutation constants and checks them once.
    ///
    /// # Errors
    /// Returns [`MerkleError::HasherInit`] if the round constants do not match
    /// the configured round count or the stored MDS inverse is wrong. Either
    /// case means the hasher must not be used.
    pub fn new() -> Result<Self> {
        let (round_constants, mds, mds_inv) =
            <PoseidonSpec as Spec<pallas::Base, WIDTH, RATE>>::constants();
        let full_rounds = <PoseidonSpec as Spec<pallas::Base, WIDTH, RATE>>::full_rounds();
        let partial_rounds = <PoseidonSpec as Spec<pallas::Base, WIDTH, RATE>>::partial_rounds();
        let rounds = full_rounds + partial_rounds;

        if full_rounds % 2 != 0 {
            return Err(MerkleError::HasherInit(format!(
                "full round count {full_rounds} must be even"
            )));
        }
        if round_constants.len() != rounds {
            return Err(MerkleError::HasherInit(format!(
                "expected {} round constants ({} full + {} partial), found {}",
                rounds,
                full_rounds,
                partial_rounds,
                round_constants.len()
            )));
        }

        check_mds_inverse(&mds, &mds_inv)?;

        debug!(
            "Poseidon initialized: width={}, rate={}, full_rounds={}, partial_rounds={}",
            WIDTH, RATE, full_rounds, partial_rounds
        );

        Ok(Self {
            round_constants,
            mds,
            full_rounds,
            partial_rounds,
        })
    }

    /// Total number of permutation rounds.
    pub fn rounds(&self) -> usize {
        self.full_rounds + self.partial_rounds
    }

    fn apply_mds(&self, state: &mut State) {
        let mut next = [pallas::Base::zero(); WIDTH];
        for (out, row) in next.iter_mut().zip(self.mds.iter()) {
            for (m, word) in row.iter().zip(state.iter()) {
                *out += *m * word;
            }
        }
        *state = next;
    }

    /// Half the full rounds, then the partial rounds, then the other half.
    fn permute(&self, state: &mut State) {
        let half = self.full_rounds / 2;
        let (first, rest) = self.round_constants.split_at(half);
        let (partial, last) = rest.split_at(self.partial_rounds);

        for rcs in first {
            self.full_round(state, rcs);
        }
        for rcs in partial {
            for (word, rc) in state.iter_mut().zip(rcs.iter()) {
                *word += rc;
            }
            state[0] = <PoseidonSpec as Spec<pallas::Base, WIDTH, RATE>>::sbox(state[0]);
            self.apply_mds(state);
        }
        for rcs in last {
            self.full_round(state, rcs);
        }
    }

    fn full_round(&self, state: &mut State, rcs: &State) {
        for (word, rc) in state.iter_mut().zip(rcs.iter()) {
            *word = <PoseidonSpec as Spec<pallas::Base, WIDTH, RATE>>::sbox(*word + rc);
        }
        self.apply_mds(state);
    }

    /// Constant-length sponge for at most `RATE` inputs: one absorption, one
    /// permutation, first rate word squeezed. Zero padding is implicit.
    fn sponge<const L: usize>(&self, inputs: [pallas::Base; L]) -> pallas::Base {
        debug_assert!(L >= 1 && L <= RATE);

        let mut state = [pallas::Base::zero(); WIDTH];
        state[RATE] = pallas::Base::from_u128((L as u128) << 64);
        for (word, value) in state.iter_mut().zip(inputs.iter()) {
            *word += value;
        }

        self.permute(&mut state);
        state[0]
    }
}

impl fmt::Debug for PoseidonHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoseidonHasher")
            .field("width", &WIDTH)
            .field("rate", &RATE)
            .field("full_rounds", &self.full_rounds)
            .field("partial_rounds", &self.partial_rounds)
            .finish()
    }
}

fn check_mds_inverse(
    mds: &Mds<pallas::Base, WIDTH>,
    mds_inv: &Mds<pallas::Base, WIDTH>,
) -> Result<()> {
    for (i, row) in mds.iter().enumerate() {
        for j in 0..WIDTH {
            let mut acc = pallas::Base::zero();
            for (k, value) in row.iter().enumerate() {
                acc += *value * mds_inv[k][j];
            }

            let expected = if i == j {
                pallas::Base::from(1u64)
            } else {
                pallas::Base::zero()
            };
            if acc != expected {
                return Err(MerkleError::HasherInit(format!(
                    "MDS matrix and its inverse disagree at ({i}, {j})"
                )));
            }
        }
    }
    Ok(())
}

impl FieldHasher for PoseidonHasher {
    #[inline]
    fn hash_leaf(&self, value: FieldElement) -> FieldElement {
        self.sponge([value.inner()]).into()
    }

    #[inline]
    fn hash_node(&self, left: FieldElement, right: FieldElement) -> FieldElement {
        self.sponge([left.inner(), right.inner()]).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halo2_gadgets::poseidon::primitives::{self as poseidon, ConstantLength};

    fn hasher() -> PoseidonHasher {
        PoseidonHasher::new().expect("Poseidon constants should be consistent")
    }

    fn samples() -> Vec<pallas::Base> {
        vec![
            pallas::Base::zero(),
            pallas::Base::from(1u64),
            pallas::Base::from(33u64),
            pallas::Base::from(u64::MAX),
            -pallas::Base::from(1u64),
        ]
    }

    #[test]
    fn test_initialization_reports_rounds() {
        // P128Pow5T3: 8 full + 56 partial rounds
        assert_eq!(hasher().rounds(), 64);
    }

    #[test]
    fn test_hasher_owns_constants() {
        let h = hasher();
        let (round_constants, mds, _) =
            <PoseidonSpec as Spec<pallas::Base, WIDTH, RATE>>::constants();

        assert_eq!(h.round_constants.len(), h.rounds());
        assert_eq!(h.round_constants, round_constants);
        assert_eq!(h.mds, mds);
    }

    #[test]
    fn test_leaf_hash_deterministic() {
        let h = hasher();
        let x = FieldElement::from_u64(33);
        assert_eq!(h.hash_leaf(x), h.hash_leaf(x));
    }

    #[test]
    fn test_independent_instances_agree() {
        let a = hasher();
        let b = hasher();
        let x = FieldElement::from_u64(11);
        let y = FieldElement::from_u64(22);
        assert_eq!(a.hash_leaf(x), b.hash_leaf(x));
        assert_eq!(a.hash_node(x, y), b.hash_node(x, y));
    }

    #[test]
    fn test_node_hash_is_order_sensitive() {
        let h = hasher();
        let x = FieldElement::from_u64(1);
        let y = FieldElement::from_u64(2);
        assert_ne!(h.hash_node(x, y), h.hash_node(y, x));
    }

    #[test]
    fn test_leaf_and_node_domains_differ() {
        let h = hasher();
        let x = FieldElement::from_u64(7);
        assert_ne!(h.hash_leaf(x), h.hash_node(x, FieldElement::zero()));
        assert_ne!(h.hash_leaf(x), h.hash_node(FieldElement::zero(), x));
    }

    #[test]
    fn test_leaf_hash_of_zero_is_not_zero() {
        let h = hasher();
        assert!(!h.hash_leaf(FieldElement::zero()).is_zero());
    }

    #[test]
    fn test_leaf_hash_matches_raw_sponge() {
        let h = hasher();
        for x in samples() {
            let expected =
                poseidon::Hash::<_, PoseidonSpec, ConstantLength<1>, WIDTH, RATE>::init()
                    .hash([x]);
            assert_eq!(h.hash_leaf(x.into()), FieldElement::from_base(expected));
        }
    }

    #[test]
    fn test_node_hash_matches_raw_sponge() {
        let h = hasher();
        for left in samples() {
            for right in samples() {
                let expected =
                    poseidon::Hash::<_, PoseidonSpec, ConstantLength<2>, WIDTH, RATE>::init()
                        .hash([left, right]);
                assert_eq!(
                    h.hash_node(left.into(), right.into()),
                    FieldElement::from_base(expected)
                );
            }
        }
    }
}
