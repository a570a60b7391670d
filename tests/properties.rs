//! Property tests over randomly generated witness sets.
//!
//! A small vocabulary forces repeated tokens, transpositions and gaps.

use proptest::prelude::*;

use collation_kernel::{
    AlgorithmKind, CollationConfig, CollationSession, ComparatorKind, Sigil, Token, Witness,
};

const VOCABULARY: &[&str] = &["a", "b", "c", "d", "e"];

fn witnesses_strategy() -> impl Strategy<Value = Vec<Witness>> {
    prop::collection::vec(
        prop::collection::vec(prop::sample::select(VOCABULARY), 0..8),
        0..5,
    )
    .prop_map(|texts| {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, words)| Witness::from_words(format!("W{i}"), words))
            .collect()
    })
}

fn algorithm_strategy() -> impl Strategy<Value = AlgorithmKind> {
    prop_oneof![Just(AlgorithmKind::Islands), Just(AlgorithmKind::needleman_wunsch())]
}

fn session(algorithm: AlgorithmKind, witnesses: &[Witness]) -> CollationSession {
    let mut session = CollationSession::new(CollationConfig::new(algorithm, ComparatorKind::Equality));
    session.collate(witnesses).unwrap();
    session
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_table_columns_reproduce_witnesses(
        witnesses in witnesses_strategy(),
        algorithm in algorithm_strategy(),
    ) {
        let mut session = session(algorithm, &witnesses);
        prop_assert!(session.graph().validate(&witnesses).is_ok());

        let table = session.to_table().unwrap();
        for witness in &witnesses {
            let column: Vec<Token> = table.column(witness.sigil()).into_iter().cloned().collect();
            prop_assert_eq!(column.as_slice(), witness.tokens());
        }
    }

    #[test]
    fn prop_rank_increases_along_edges(
        witnesses in witnesses_strategy(),
        algorithm in algorithm_strategy(),
    ) {
        let mut graph = session(algorithm, &witnesses).into_graph();
        graph.rank().unwrap();

        prop_assert_eq!(graph.rank_of(graph.start()), Some(0));
        for edge in graph.edges(None) {
            prop_assert!(graph.rank_of(edge.to) > graph.rank_of(edge.from));
        }
    }

    #[test]
    fn prop_join_is_idempotent(
        witnesses in witnesses_strategy(),
        algorithm in algorithm_strategy(),
    ) {
        let mut graph = session(algorithm, &witnesses).into_graph();
        graph.join().unwrap();
        let once = graph.fingerprint();

        prop_assert_eq!(graph.join().unwrap(), 0);
        prop_assert_eq!(graph.fingerprint(), once);
        prop_assert!(graph.validate(&witnesses).is_ok());
    }

    #[test]
    fn prop_collation_is_deterministic(
        witnesses in witnesses_strategy(),
        algorithm in algorithm_strategy(),
    ) {
        let first = session(algorithm, &witnesses).into_graph().fingerprint();
        let second = session(algorithm, &witnesses).into_graph().fingerprint();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_every_token_lands_in_one_vertex(witnesses in witnesses_strategy()) {
        let graph = session(AlgorithmKind::Islands, &witnesses).into_graph();
        let total: usize = witnesses.iter().map(Witness::len).sum();
        let placed: usize = graph.vertices(None).iter().map(|v| v.tokens().len()).sum();
        prop_assert_eq!(placed, total);

        let sigils: Vec<Sigil> = witnesses.iter().map(|w| w.sigil().clone()).collect();
        prop_assert_eq!(graph.witnesses().into_iter().collect::<Vec<_>>(), {
            let mut sorted = sigils;
            sorted.sort();
            sorted
        });
    }
}
