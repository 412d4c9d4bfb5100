use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use crate::core::engine::ledger::Ledger;
use crate::core::engine::rounding::{split_equally, split_weighted};
use crate::core::errors::SmartSplitError;
use crate::core::models::{
    expense::ExpenseEntry,
    settlement::{Balances, MoneyStats},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceSheet {
    pub balances: Balances,
    pub stats: BTreeMap<String, MoneyStats>,
}

/// Each split member's share of a non-payment entry, in split order.
///
/// Payments have no shares.
pub fn entry_shares(entry: &ExpenseEntry) -> Vec<(&str, Decimal)> {
    if entry.is_payment {
        return Vec::new();
    }
    let shares = match &entry.weights {
        Some(weights) => split_weighted(entry.amount, weights),
        None => split_equally(entry.amount, entry.split_among.len()),
    };
    entry.split_among.iter().map(String::as_str).zip(shares).collect()
}

/// Applies one entry to running balances.
pub fn apply_entry(balances: &mut Balances, entry: &ExpenseEntry) {
    if let Some(recipient) = entry.recipient() {
        balances.debit(&entry.paid_by, entry.amount);
        balances.credit(recipient, entry.amount);
        return;
    }
    balances.credit(&entry.paid_by, entry.amount);
    for (member, share) in entry_shares(entry) {
        balances.debit(member, share);
    }
}

fn apply_stats(stats: &mut BTreeMap<String, MoneyStats>, entry: &ExpenseEntry) {
    if let Some(recipient) = entry.recipient() {
        stats.entry(entry.paid_by.clone()).or_default().sent += entry.amount;
        stats.entry(recipient.to_string()).or_default().received += entry.amount;
        return;
    }
    stats.entry(entry.paid_by.clone()).or_default().paid += entry.amount;
    for (member, share) in entry_shares(entry) {
        stats.entry(member.to_string()).or_default().share += share;
    }
}

/// Net balance and money stats for every participant of the ledger.
///
/// Participants without entries appear with zero. The balances always sum to
/// exactly zero; anything else is reported as `UnbalancedLedger`.
pub fn calculate(ledger: &Ledger) -> Result<BalanceSheet, SmartSplitError> {
    ledger.validate()?;

    let mut balances: Balances = ledger
        .participants()
        .iter()
        .map(|p| (p.id.clone(), Decimal::ZERO))
        .collect();
    let mut stats: BTreeMap<String, MoneyStats> = ledger
        .participants()
        .iter()
        .map(|p| (p.id.clone(), MoneyStats::default()))
        .collect();

    for entry in ledger.entries() {
        apply_entry(&mut balances, entry);
        apply_stats(&mut stats, entry);
    }

    let sum = balances.sum();
    if !sum.is_zero() {
        return Err(SmartSplitError::UnbalancedLedger(sum));
    }

    debug!(
        "Calculated balances for trip {} over {} entries",
        ledger.trip().id,
        ledger.entries().len()
    );
    Ok(BalanceSheet { balances, stats })
}
