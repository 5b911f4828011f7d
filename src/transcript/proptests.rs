//! Property-based tests for the transcript store
//!
//! The maintained pending counter must agree with a full scan after any
//! sequence of operations, and ids must stay in insertion order.

use super::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    AppendUser(String),
    AppendPending,
    Settle { index: usize, ok: bool },
    Touch { index: usize },
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => "[a-z ]{0,12}".prop_map(Op::AppendUser),
        3 => Just(Op::AppendPending),
        4 => (0usize..32, any::<bool>()).prop_map(|(index, ok)| Op::Settle { index, ok }),
        1 => (0usize..32).prop_map(|index| Op::Touch { index }),
        1 => Just(Op::Clear),
    ]
}

fn pick(store: &TranscriptStore, index: usize) -> Option<TurnId> {
    let turns = store.snapshot();
    if turns.is_empty() {
        None
    } else {
        Some(turns[index % turns.len()].id)
    }
}

proptest! {
    #[test]
    fn prop_pending_counter_matches_scan(ops in proptest::collection::vec(arb_op(), 0..64)) {
        let mut store = TranscriptStore::new();

        for op in ops {
            match op {
                Op::AppendUser(text) => {
                    store.append(Author::User, text, TurnStatus::Complete, None);
                }
                Op::AppendPending => {
                    let correlation_id = Some(CorrelationId::new());
                    store.append(Author::Agent, "", TurnStatus::Pending, correlation_id);
                }
                Op::Settle { index, ok } => {
                    if let Some(id) = pick(&store, index) {
                        let status = if ok { TurnStatus::Complete } else { TurnStatus::Failed };
                        let _ = store.settle(id, status, "settled");
                    }
                }
                Op::Touch { index } => {
                    if let Some(id) = pick(&store, index) {
                        store.update(id, |t| t.text.push('.')).unwrap();
                    }
                }
                Op::Clear => store.clear(),
            }

            prop_assert_eq!(store.pending_count(), store.recount_pending());
        }
    }

    #[test]
    fn prop_snapshot_preserves_insertion_order(
        texts in proptest::collection::vec("[a-z]{1,8}", 1..20),
    ) {
        let mut store = TranscriptStore::new();
        let ids: Vec<TurnId> = texts
            .iter()
            .map(|t| store.append(Author::User, t.clone(), TurnStatus::Complete, None))
            .collect();

        let snapshot = store.snapshot();
        prop_assert_eq!(snapshot.iter().map(|t| t.id).collect::<Vec<_>>(), ids);
        prop_assert_eq!(snapshot.iter().map(|t| t.text.clone()).collect::<Vec<_>>(), texts);
    }

    #[test]
    fn prop_settled_turns_never_change(
        settle_order in Just((0usize..8).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let mut store = TranscriptStore::new();
        let ids: Vec<TurnId> = (0..8)
            .map(|_| store.append(Author::Agent, "", TurnStatus::Pending, None))
            .collect();

        for idx in &settle_order {
            store.settle(ids[*idx], TurnStatus::Complete, format!("answer {idx}")).unwrap();
        }
        for idx in &settle_order {
            prop_assert!(store.settle(ids[*idx], TurnStatus::Failed, "late").is_err());
        }

        for (idx, id) in ids.iter().enumerate() {
            let turn = store.get(*id).unwrap();
            prop_assert_eq!(turn.status, TurnStatus::Complete);
            prop_assert_eq!(&turn.text, &format!("answer {idx}"));
        }
        prop_assert_eq!(store.pending_count(), 0);
    }
}
