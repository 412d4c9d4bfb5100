use rust_decimal::Decimal;
use std::cmp::Ordering;
use tracing::debug;

use crate::core::engine::rounding::{is_negligible, round_minor};
use crate::core::errors::SmartSplitError;
use crate::core::models::settlement::{Balances, Settlement};

// creditors: largest first; ties by id
fn creditor_order(a: &(String, Decimal), b: &(String, Decimal)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

// debtors: most negative first; ties by id
fn debtor_order(a: &(String, Decimal), b: &(String, Decimal)) -> Ordering {
    a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0))
}

/// Turns net balances into directed transfers that zero every balance.
///
/// Greedy largest-first matching: the biggest creditor is paid by the biggest
/// debtor until one of them is square, then both lists are re-sorted. This is
/// the usual practical approximation; it does not guarantee the minimum
/// number of transfers, which is NP-hard in general.
///
/// Output depends only on the balance values and participant ids, never on
/// map insertion order.
pub fn solve(balances: &Balances) -> Result<Vec<Settlement>, SmartSplitError> {
    let sum = balances.sum();
    if !round_minor(sum).is_zero() {
        return Err(SmartSplitError::UnbalancedLedger(sum));
    }

    let mut creditors: Vec<(String, Decimal)> = balances
        .iter()
        .filter(|(_, amount)| **amount > Decimal::ZERO && !is_negligible(**amount))
        .map(|(id, amount)| (id.clone(), *amount))
        .collect();
    let mut debtors: Vec<(String, Decimal)> = balances
        .iter()
        .filter(|(_, amount)| **amount < Decimal::ZERO && !is_negligible(**amount))
        .map(|(id, amount)| (id.clone(), *amount))
        .collect();

    creditors.sort_by(creditor_order);
    debtors.sort_by(debtor_order);

    let mut settlements = Vec::new();
    while !creditors.is_empty() && !debtors.is_empty() {
        let (creditor, credit) = creditors[0].clone();
        let (debtor, debit) = debtors[0].clone();
        let amount = credit.min(-debit);

        settlements.push(Settlement {
            from_id: debtor,
            to_id: creditor,
            amount,
        });

        creditors[0].1 -= amount;
        debtors[0].1 += amount;

        if is_negligible(creditors[0].1) {
            creditors.remove(0);
        }
        if is_negligible(debtors[0].1) {
            debtors.remove(0);
        }
        creditors.sort_by(creditor_order);
        debtors.sort_by(debtor_order);
    }

    debug!(
        "Solved {} balances into {} settlements",
        balances.len(),
        settlements.len()
    );
    Ok(settlements)
}
