use proptest::prelude::*;
use zkp_merkle_membership::{
    FieldElement, FieldHasher, MerkleError, MerkleTree, PoseidonHasher, WitnessInput,
};

fn scenario() -> (PoseidonHasher, MerkleTree, Vec<FieldElement>) {
    let hasher = PoseidonHasher::new().expect("Poseidon should initialize");
    let secrets: Vec<FieldElement> = [11u64, 22, 33, 44]
        .into_iter()
        .map(FieldElement::from_u64)
        .collect();
    let tree = MerkleTree::build(&hasher, &secrets, 4).expect("Failed to build tree");
    (hasher, tree, secrets)
}

#[test]
fn test_four_members_depth_four() {
    let (hasher, tree, secrets) = scenario();

    assert_eq!(tree.leaves().len(), 16);
    for (i, s) in secrets.iter().enumerate() {
        assert_eq!(tree.leaves()[i], hasher.hash_leaf(*s));
    }
    assert!(tree.leaves()[4..].iter().all(FieldElement::is_zero));

    let proof = tree.generate_proof(2).expect("Failed to extract proof");
    assert_eq!(proof.path_elements.len(), 4);
    assert_eq!(proof.path_indices.len(), 4);
    assert_eq!(proof.root, tree.root());

    assert!(proof.verify(&hasher, hasher.hash_leaf(FieldElement::from_u64(33))));
    assert!(!proof.verify(&hasher, hasher.hash_leaf(FieldElement::from_u64(44))));
}

#[test]
fn test_witness_input_for_member_33() {
    let (hasher, tree, secrets) = scenario();
    let proof = tree.generate_proof(2).unwrap();
    let context = FieldElement::from_decimal_str("12345").unwrap();

    let input = WitnessInput::from_proof(secrets[2], &proof, context);
    input.validate(&hasher).expect("Witness input should validate");

    let json = serde_json::to_string(&input).unwrap();
    let parsed: WitnessInput = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, input);
    assert_eq!(parsed.parse_root().unwrap(), tree.root());
}

#[test]
fn test_every_leaf_roundtrips() {
    let (hasher, tree, _) = scenario();

    for index in 0..tree.leaf_count() {
        let proof = tree.generate_proof(index).unwrap();
        assert!(
            tree.verify_proof(&hasher, tree.leaves()[index], &proof),
            "leaf {index} failed to verify"
        );
    }
}

#[test]
fn test_out_of_range_index() {
    let (_, tree, _) = scenario();
    assert!(matches!(
        tree.generate_proof(16),
        Err(MerkleError::IndexOutOfRange {
            index: 16,
            leaf_count: 16
        })
    ));
}

#[test]
fn test_shared_hasher_across_threads() {
    let hasher = PoseidonHasher::new().unwrap();

    let roots: Vec<FieldElement> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let hasher = &hasher;
                scope.spawn(move || {
                    let secrets: Vec<FieldElement> =
                        (0..8u64).map(|i| FieldElement::from_u64(t * 100 + i)).collect();
                    MerkleTree::build(hasher, &secrets, 3).unwrap().root()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (t, root) in roots.iter().enumerate() {
        let secrets: Vec<FieldElement> = (0..8u64)
            .map(|i| FieldElement::from_u64(t as u64 * 100 + i))
            .collect();
        assert_eq!(*root, MerkleTree::build(&hasher, &secrets, 3).unwrap().root());
    }
}

fn tree_inputs() -> impl Strategy<Value = (usize, Vec<u64>)> {
    (1usize..=5).prop_flat_map(|depth| {
        (
            Just(depth),
            prop::collection::vec(any::<u64>(), 0..=(1usize << depth)),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_layer_shape((depth, values) in tree_inputs()) {
        let hasher = PoseidonHasher::new().unwrap();
        let secrets: Vec<FieldElement> = values.into_iter().map(FieldElement::from_u64).collect();
        let tree = MerkleTree::build(&hasher, &secrets, depth).unwrap();

        prop_assert_eq!(tree.leaves().len(), 1usize << depth);
        for d in 1..=depth {
            prop_assert_eq!(tree.layer(d).unwrap().len() * 2, tree.layer(d - 1).unwrap().len());
        }
        prop_assert_eq!(tree.layer(depth).unwrap().len(), 1);
    }

    #[test]
    fn prop_extracted_proofs_verify(
        (depth, values) in tree_inputs(),
        seed in any::<usize>(),
    ) {
        let hasher = PoseidonHasher::new().unwrap();
        let secrets: Vec<FieldElement> = values.into_iter().map(FieldElement::from_u64).collect();
        let tree = MerkleTree::build(&hasher, &secrets, depth).unwrap();

        let index = seed % tree.leaf_count();
        let proof = tree.generate_proof(index).unwrap();
        prop_assert_eq!(proof.depth(), depth);
        prop_assert!(proof.verify(&hasher, tree.leaves()[index]));
    }

    #[test]
    fn prop_flipped_index_bit_fails(
        depth in 1usize..=5,
        offset in any::<u32>(),
        seed in any::<usize>(),
        level in any::<usize>(),
    ) {
        let hasher = PoseidonHasher::new().unwrap();
        // Distinct secrets at every slot so no node equals its sibling.
        let secrets: Vec<FieldElement> = (0..(1u64 << depth))
            .map(|i| FieldElement::from_u64(u64::from(offset) + i))
            .collect();
        let tree = MerkleTree::build(&hasher, &secrets, depth).unwrap();

        let index = seed % tree.leaf_count();
        let mut proof = tree.generate_proof(index).unwrap();
        proof.path_indices[level % depth] ^= 1;
        prop_assert!(!proof.verify(&hasher, tree.leaves()[index]));
    }

    #[test]
    fn prop_flipped_sibling_bit_fails(
        (depth, values) in tree_inputs(),
        seed in any::<usize>(),
        level in any::<usize>(),
        bit in 0usize..255,
    ) {
        let hasher = PoseidonHasher::new().unwrap();
        let secrets: Vec<FieldElement> = values.into_iter().map(FieldElement::from_u64).collect();
        let tree = MerkleTree::build(&hasher, &secrets, depth).unwrap();

        let index = seed % tree.leaf_count();
        let mut proof = tree.generate_proof(index).unwrap();
        let level = level % depth;

        let mut bytes = proof.path_elements[level].to_repr();
        bytes[bit / 8] ^= 1 << (bit % 8);
        let flipped = FieldElement::from_repr(bytes);
        prop_assume!(flipped.is_ok());
        proof.path_elements[level] = flipped.unwrap();

        prop_assert!(!proof.verify(&hasher, tree.leaves()[index]));
    }
}
