use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{abc_snapshot, expense, in_category, on, payment};
use crate::core::engine::{self, analytics};

#[test]
fn test_breakdowns_sum_to_parent_totals() {
    let data = engine::compute_analytics(&abc_snapshot(vec![
        in_category(expense("e1", dec!(100), "A", &["A", "B", "C"]), "Food"),
        in_category(on(expense("e2", dec!(55.55), "B", &["B", "C"]), 2), "Travel"),
        in_category(on(expense("e3", dec!(10), "A", &["C"]), 2), "Food"),
        on(payment("p1", dec!(20), "C", "A"), 3),
    ]))
    .unwrap();

    assert_eq!(data.total_trip_cost, dec!(165.55));

    let category_sum: Decimal = data.category_stats.iter().map(|c| c.total).sum();
    assert_eq!(category_sum, data.total_trip_cost);
    for category in &data.category_stats {
        let involved: Decimal = category.involved.iter().map(|p| p.amount).sum();
        assert_eq!(involved, category.total);
    }

    let payer_sum: Decimal = data.total_payer_stats.iter().map(|p| p.amount).sum();
    assert_eq!(payer_sum, data.total_trip_cost);
    for payer in &data.total_payer_stats {
        let by_category: Decimal = payer.categories.iter().map(|c| c.amount).sum();
        assert_eq!(by_category, payer.amount);
    }

    let share_sum: Decimal = data.individual_share_stats.iter().map(|s| s.total).sum();
    assert_eq!(share_sum, data.total_trip_cost);

    let slice_sum: Decimal = data.participant_stats.iter().map(|s| s.value).sum();
    assert_eq!(slice_sum, data.total_trip_cost);
}

#[test]
fn test_payments_are_not_trip_cost() {
    let data = engine::compute_analytics(&abc_snapshot(vec![payment("p1", dec!(50), "B", "A")])).unwrap();
    assert_eq!(data.total_trip_cost, dec!(0));
    assert!(data.category_stats.is_empty());
    assert!(data.participant_stats.iter().all(|s| s.value.is_zero()));
}

#[test]
fn test_daily_stats_fill_gaps_with_zero() {
    let data = engine::compute_analytics(&abc_snapshot(vec![
        on(expense("e1", dec!(30), "A", &[]), 1),
        on(expense("e2", dec!(12), "B", &[]), 4),
    ]))
    .unwrap();

    let values: Vec<Decimal> = data.daily_stats.iter().map(|b| b.value).collect();
    assert_eq!(values, vec![dec!(30), dec!(0), dec!(0), dec!(12)]);
    assert_eq!(data.daily_stats[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    assert_eq!(data.daily_stats[0].label, "Jun 1");
}

#[test]
fn test_uninvolved_participant_charts_zero() {
    let data = engine::compute_analytics(&abc_snapshot(vec![expense("e1", dec!(40), "A", &["A", "B"])])).unwrap();

    let carol = data.participant_stats.iter().find(|s| s.participant_id == "C").unwrap();
    assert_eq!(carol.value, dec!(0));
    let carol_share = data
        .individual_share_stats
        .iter()
        .find(|s| s.participant_id == "C")
        .unwrap();
    assert_eq!(carol_share.total, dec!(0));
    assert!(carol_share.categories.is_empty());
}

#[test]
fn test_stats_sorted_largest_first() {
    let data = engine::compute_analytics(&abc_snapshot(vec![
        in_category(expense("e1", dec!(10), "A", &[]), "Snacks"),
        in_category(expense("e2", dec!(90), "C", &[]), "Hotel"),
    ]))
    .unwrap();

    assert_eq!(data.participant_stats[0].participant_id, "C");
    assert_eq!(data.category_stats[0].category, "Hotel");
    assert_eq!(data.total_payer_stats[0].id, "C");
}

#[test]
fn test_participant_colors_are_stable() {
    let first = analytics::participant_color("participant-42");
    assert_eq!(first, analytics::participant_color("participant-42"));
    assert!(analytics::CHART_PALETTE.contains(&first));
}

#[test]
fn test_empty_trip_has_empty_analytics() {
    let data = engine::compute_analytics(&abc_snapshot(vec![])).unwrap();
    assert!(data.daily_stats.is_empty());
    assert_eq!(data.participant_stats.len(), 3);
    assert_eq!(data.total_trip_cost, dec!(0));
}
