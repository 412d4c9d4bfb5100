use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{day, participant, trip};
use crate::core::engine::{self, Ledger, timeline};
use crate::core::models::{expense::ExpenseEntry, trip::TripSnapshot};

type RawEntry = (i64, usize, u32, bool, Option<Vec<u32>>);

fn build_snapshot(n: usize, raw: Vec<RawEntry>) -> TripSnapshot {
    let ids: Vec<String> = (0..n).map(|i| format!("p{}", i)).collect();
    let participants = ids.iter().map(|id| participant(id, &id.to_uppercase())).collect();

    let expenses = raw
        .into_iter()
        .enumerate()
        .map(|(i, (cents, payer, mask, is_payment, weights))| {
            let amount = Decimal::new(cents, 2);
            let (split_among, weights) = if is_payment {
                (vec![ids[(payer + 1) % n].clone()], None)
            } else {
                let members: Vec<usize> = (0..n).filter(|bit| mask & (1 << bit) != 0).collect();
                let weights = weights.map(|w| members.iter().map(|m| Decimal::from(w[*m])).collect());
                (members.iter().map(|m| ids[*m].clone()).collect(), weights)
            };
            ExpenseEntry {
                id: format!("e{}", i),
                trip_id: trip().id,
                description: format!("entry {}", i),
                amount,
                date: day((i % 5) as u32 + 1),
                category: ["Food", "Travel", "Stay"][i % 3].to_string(),
                paid_by: ids[payer].clone(),
                split_among,
                is_payment,
                weights,
            }
        })
        .collect();

    TripSnapshot::new(trip(), participants, expenses)
}

fn snapshot_strategy() -> impl Strategy<Value = TripSnapshot> {
    (2usize..=6)
        .prop_flat_map(|n| {
            let entry = (
                1i64..10_000_000,
                0..n,
                1u32..(1u32 << n),
                any::<bool>(),
                prop::option::of(prop::collection::vec(1u32..10, n)),
            );
            (Just(n), prop::collection::vec(entry, 0..25))
        })
        .prop_map(|(n, raw)| build_snapshot(n, raw))
}

proptest! {
    #[test]
    fn prop_balances_sum_to_zero(snapshot in snapshot_strategy()) {
        let balances = engine::compute_balances(&snapshot).unwrap();
        prop_assert_eq!(balances.sum(), Decimal::ZERO);
        prop_assert_eq!(balances.len(), snapshot.participants.len());
    }

    #[test]
    fn prop_settlements_clear_every_balance(snapshot in snapshot_strategy()) {
        let balances = engine::compute_balances(&snapshot).unwrap();
        let settlements = engine::compute_settlements(&snapshot).unwrap();

        let mut outgoing: BTreeMap<&str, Decimal> = BTreeMap::new();
        let mut incoming: BTreeMap<&str, Decimal> = BTreeMap::new();
        for s in &settlements {
            prop_assert!(s.amount > Decimal::ZERO);
            prop_assert_ne!(&s.from_id, &s.to_id);
            *outgoing.entry(s.from_id.as_str()).or_insert(Decimal::ZERO) += s.amount;
            *incoming.entry(s.to_id.as_str()).or_insert(Decimal::ZERO) += s.amount;
        }
        for (id, balance) in balances.iter() {
            let out = outgoing.get(id.as_str()).copied().unwrap_or(Decimal::ZERO);
            let inc = incoming.get(id.as_str()).copied().unwrap_or(Decimal::ZERO);
            prop_assert_eq!(out, (-*balance).max(Decimal::ZERO));
            prop_assert_eq!(inc, (*balance).max(Decimal::ZERO));
        }
        prop_assert!(settlements.len() < snapshot.participants.len());
    }

    #[test]
    fn prop_settlements_ignore_participant_order(snapshot in snapshot_strategy()) {
        let mut reordered = snapshot.clone();
        reordered.participants.reverse();
        prop_assert_eq!(
            engine::compute_settlements(&snapshot).unwrap(),
            engine::compute_settlements(&reordered).unwrap()
        );
    }

    #[test]
    fn prop_analytics_breakdowns_add_up(snapshot in snapshot_strategy()) {
        let data = engine::compute_analytics(&snapshot).unwrap();
        let categories: Decimal = data.category_stats.iter().map(|c| c.total).sum();
        let shares: Decimal = data.individual_share_stats.iter().map(|s| s.total).sum();
        let paid: Decimal = data.total_payer_stats.iter().map(|p| p.amount).sum();
        let daily: Decimal = data.daily_stats.iter().map(|b| b.value).sum();
        prop_assert_eq!(categories, data.total_trip_cost);
        prop_assert_eq!(shares, data.total_trip_cost);
        prop_assert_eq!(paid, data.total_trip_cost);
        prop_assert_eq!(daily, data.total_trip_cost);
    }

    #[test]
    fn prop_latest_daily_point_matches_final_balances(snapshot in snapshot_strategy()) {
        let balances = engine::compute_balances(&snapshot).unwrap();
        let ledger = Ledger::new(snapshot).unwrap();
        let points = timeline::daily_balances(&ledger);
        if let Some(latest) = points.first() {
            prop_assert_eq!(&latest.balances, &balances);
        }
        for point in &points {
            prop_assert_eq!(point.balances.sum(), Decimal::ZERO);
        }
    }
}
