use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::debug;

use crate::core::engine::balance::{BalanceSheet, entry_shares};
use crate::core::engine::ledger::Ledger;
use crate::core::models::analytics::{
    AnalyticsData, CategoryAmount, CategoryStats, ChartBar, ChartSlice, IndividualShareStat, ParticipantAmount,
    TotalPayerStat,
};

pub const CHART_PALETTE: [&str; 6] = ["#4ADE80", "#60A5FA", "#FB923C", "#A78BFA", "#F472B6", "#FACC15"];

/// Palette colour for a participant. Hash based, so it survives reordering and restarts.
pub fn participant_color(participant_id: &str) -> &'static str {
    let digest = Sha256::digest(participant_id.as_bytes());
    CHART_PALETTE[digest[0] as usize % CHART_PALETTE.len()]
}

// descending total, ties by id
fn sort_by_total<T>(items: &mut [T], total: impl Fn(&T) -> Decimal, id: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| total(b).cmp(&total(a)).then_with(|| id(a).cmp(id(b))));
}

fn category_breakdown(categories: BTreeMap<String, Decimal>) -> Vec<CategoryAmount> {
    let mut breakdown: Vec<CategoryAmount> = categories
        .into_iter()
        .map(|(category, amount)| CategoryAmount { category, amount })
        .collect();
    sort_by_total(&mut breakdown, |c| c.amount, |c| c.category.as_str());
    breakdown
}

/// Chart and breakdown figures for a trip.
///
/// Only genuine expenses are counted; payments move money between
/// participants without adding to the trip's cost. Shares come from the same
/// split routine as the balances, so every breakdown adds up to its parent
/// total exactly.
pub fn aggregate(ledger: &Ledger, sheet: &BalanceSheet) -> AnalyticsData {
    let mut total_trip_cost = Decimal::ZERO;
    let mut paid_by: BTreeMap<&str, BTreeMap<String, Decimal>> = BTreeMap::new();
    let mut owed_by: BTreeMap<&str, BTreeMap<String, Decimal>> = BTreeMap::new();
    let mut categories: BTreeMap<&str, (Decimal, BTreeMap<&str, Decimal>)> = BTreeMap::new();
    let mut daily: BTreeMap<chrono::NaiveDate, Decimal> = BTreeMap::new();

    for expense in ledger.expenses() {
        total_trip_cost += expense.amount;
        *daily.entry(expense.day()).or_insert(Decimal::ZERO) += expense.amount;
        *paid_by
            .entry(expense.paid_by.as_str())
            .or_default()
            .entry(expense.category.clone())
            .or_insert(Decimal::ZERO) += expense.amount;

        let (category_total, involved) = categories
            .entry(expense.category.as_str())
            .or_insert((Decimal::ZERO, BTreeMap::new()));
        *category_total += expense.amount;

        for (member, share) in entry_shares(expense) {
            *involved.entry(member).or_insert(Decimal::ZERO) += share;
            *owed_by
                .entry(member)
                .or_default()
                .entry(expense.category.clone())
                .or_insert(Decimal::ZERO) += share;
        }
    }

    let mut participant_stats: Vec<ChartSlice> = ledger
        .participants()
        .iter()
        .map(|p| ChartSlice {
            participant_id: p.id.clone(),
            label: p.name.clone(),
            value: sheet.stats.get(&p.id).map_or(Decimal::ZERO, |s| s.paid),
            color: participant_color(&p.id).to_string(),
        })
        .collect();
    sort_by_total(&mut participant_stats, |s| s.value, |s| s.participant_id.as_str());

    let daily_stats = match ledger.span() {
        Some((first, last)) => first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|day| ChartBar {
                date: day,
                label: day.format("%b %-d").to_string(),
                value: daily.get(&day).copied().unwrap_or(Decimal::ZERO),
            })
            .collect(),
        None => Vec::new(),
    };

    let mut category_stats: Vec<CategoryStats> = categories
        .into_iter()
        .map(|(category, (total, involved))| {
            let mut involved: Vec<ParticipantAmount> = involved
                .into_iter()
                .map(|(id, amount)| ParticipantAmount {
                    participant_id: id.to_string(),
                    name: ledger.participant_name(id).to_string(),
                    amount,
                })
                .collect();
            sort_by_total(&mut involved, |p| p.amount, |p| p.participant_id.as_str());
            CategoryStats {
                category: category.to_string(),
                total,
                involved,
            }
        })
        .collect();
    sort_by_total(&mut category_stats, |c| c.total, |c| c.category.as_str());

    let mut total_payer_stats: Vec<TotalPayerStat> = ledger
        .participants()
        .iter()
        .map(|p| {
            let categories = paid_by.remove(p.id.as_str()).unwrap_or_default();
            TotalPayerStat {
                id: p.id.clone(),
                name: p.name.clone(),
                amount: categories.values().copied().sum(),
                categories: category_breakdown(categories),
            }
        })
        .collect();
    sort_by_total(&mut total_payer_stats, |s| s.amount, |s| s.id.as_str());

    let mut individual_share_stats: Vec<IndividualShareStat> = ledger
        .participants()
        .iter()
        .map(|p| {
            let categories = owed_by.remove(p.id.as_str()).unwrap_or_default();
            IndividualShareStat {
                participant_id: p.id.clone(),
                name: p.name.clone(),
                total: categories.values().copied().sum(),
                categories: category_breakdown(categories),
            }
        })
        .collect();
    sort_by_total(&mut individual_share_stats, |s| s.total, |s| s.participant_id.as_str());

    debug!(
        "Aggregated analytics for trip {}: {} categories over {} days",
        ledger.trip().id,
        category_stats.len(),
        daily_stats.len()
    );

    AnalyticsData {
        participant_stats,
        daily_stats,
        category_stats,
        total_trip_cost,
        total_payer_stats,
        individual_share_stats,
    }
}
