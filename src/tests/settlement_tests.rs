use rust_decimal_macros::dec;

use super::{abc_snapshot, expense, participant, payment, trip};
use crate::core::engine::{self, settlement};
use crate::core::errors::SmartSplitError;
use crate::core::models::settlement::{Balances, Settlement};
use crate::core::models::trip::TripSnapshot;

fn transfer(from: &str, to: &str, amount: rust_decimal::Decimal) -> Settlement {
    Settlement {
        from_id: from.to_string(),
        to_id: to.to_string(),
        amount,
    }
}

#[test]
fn test_largest_debtor_pays_first() {
    let settlements =
        engine::compute_settlements(&abc_snapshot(vec![expense("e1", dec!(100), "A", &["A", "B", "C"])])).unwrap();

    assert_eq!(
        settlements,
        vec![transfer("C", "A", dec!(33.34)), transfer("B", "A", dec!(33.33))]
    );
}

#[test]
fn test_single_payment_yields_single_settlement() {
    let settlements = engine::compute_settlements(&abc_snapshot(vec![payment("p1", dec!(50), "B", "A")])).unwrap();
    assert_eq!(settlements, vec![transfer("B", "A", dec!(50))]);
}

#[test]
fn test_settled_trip_has_no_transfers() {
    let settlements = engine::compute_settlements(&abc_snapshot(vec![
        expense("e1", dec!(20), "A", &["A", "B"]),
        expense("e2", dec!(20), "B", &["A", "B"]),
    ]))
    .unwrap();
    assert!(settlements.is_empty());
}

#[test]
fn test_independent_of_participant_order() {
    let entries = vec![
        expense("e1", dec!(120), "A", &[]),
        expense("e2", dec!(45.50), "D", &["B", "C", "D"]),
        payment("p1", dec!(10), "C", "A"),
    ];
    let forward = TripSnapshot::new(
        trip(),
        vec![
            participant("A", "Alice"),
            participant("B", "Bob"),
            participant("C", "Carol"),
            participant("D", "Dan"),
        ],
        entries.clone(),
    );
    let mut backward = forward.clone();
    backward.participants.reverse();

    assert_eq!(
        engine::compute_settlements(&forward).unwrap(),
        engine::compute_settlements(&backward).unwrap()
    );
}

#[test]
fn test_equal_balances_break_ties_by_id() {
    let balances: Balances = vec![
        ("z".to_string(), dec!(10)),
        ("y".to_string(), dec!(10)),
        ("b".to_string(), dec!(-10)),
        ("a".to_string(), dec!(-10)),
    ]
    .into_iter()
    .collect();

    let settlements = settlement::solve(&balances).unwrap();
    assert_eq!(
        settlements,
        vec![transfer("a", "y", dec!(10)), transfer("b", "z", dec!(10))]
    );
}

#[test]
fn test_unbalanced_input_is_rejected() {
    let balances: Balances = vec![("a".to_string(), dec!(10)), ("b".to_string(), dec!(-9))]
        .into_iter()
        .collect();
    assert_eq!(settlement::solve(&balances), Err(SmartSplitError::UnbalancedLedger(dec!(1))));
}

#[test]
fn test_summary_bundles_balances_and_stats() {
    let summary = engine::summarize(&abc_snapshot(vec![expense("e1", dec!(60), "B", &[])])).unwrap();
    assert_eq!(summary.balances.get("B"), dec!(40));
    assert_eq!(summary.stats["B"].paid, dec!(60));
    assert_eq!(summary.settlements.len(), 2);
    let total: rust_decimal::Decimal = summary.settlements.iter().map(|s| s.amount).sum();
    assert_eq!(total, dec!(40));
}
