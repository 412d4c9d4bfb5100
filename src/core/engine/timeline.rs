use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::core::engine::balance::apply_entry;
use crate::core::engine::ledger::Ledger;
use crate::core::models::{
    analytics::{DailyBalancePoint, DayGroup},
    expense::ExpenseEntry,
    settlement::Balances,
};

fn by_day(ledger: &Ledger) -> BTreeMap<NaiveDate, Vec<&ExpenseEntry>> {
    let mut days: BTreeMap<NaiveDate, Vec<&ExpenseEntry>> = BTreeMap::new();
    for entry in ledger.entries() {
        days.entry(entry.day()).or_default().push(entry);
    }
    days
}

/// Running balances at the close of every day that has entries, newest first.
pub fn daily_balances(ledger: &Ledger) -> Vec<DailyBalancePoint> {
    let mut running: Balances = ledger
        .participants()
        .iter()
        .map(|p| (p.id.clone(), Decimal::ZERO))
        .collect();

    let mut points: Vec<DailyBalancePoint> = by_day(ledger)
        .into_iter()
        .map(|(date, entries)| {
            for entry in entries {
                apply_entry(&mut running, entry);
            }
            DailyBalancePoint {
                date,
                balances: running.clone(),
            }
        })
        .collect();
    points.reverse();
    points
}

/// Entries bucketed by calendar day, newest day first; entries keep date order inside a day.
pub fn group_by_day(ledger: &Ledger) -> Vec<DayGroup> {
    by_day(ledger)
        .into_iter()
        .rev()
        .map(|(date, entries)| DayGroup {
            date,
            entries: entries.into_iter().cloned().collect(),
        })
        .collect()
}
