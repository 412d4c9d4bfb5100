//! Settlement and analytics engine.
//!
//! Pure and synchronous: every entry point takes a trip snapshot, validates it
//! into a [`Ledger`] and either returns a complete result or fails before
//! producing anything. No I/O, no shared state, safe to call from any number
//! of request handlers at once.

pub mod analytics;
pub mod balance;
pub mod ledger;
pub mod rounding;
pub mod settlement;
pub mod timeline;

pub use balance::BalanceSheet;
pub use ledger::Ledger;

use crate::core::errors::SmartSplitError;
use crate::core::models::{
    analytics::AnalyticsData,
    settlement::{Balances, Settlement, SettlementSummary},
    trip::TripSnapshot,
};

pub fn compute_balances(snapshot: &TripSnapshot) -> Result<Balances, SmartSplitError> {
    let ledger = Ledger::new(snapshot.clone())?;
    Ok(balance::calculate(&ledger)?.balances)
}

pub fn compute_settlements(snapshot: &TripSnapshot) -> Result<Vec<Settlement>, SmartSplitError> {
    let balances = compute_balances(snapshot)?;
    settlement::solve(&balances)
}

pub fn compute_analytics(snapshot: &TripSnapshot) -> Result<AnalyticsData, SmartSplitError> {
    let ledger = Ledger::new(snapshot.clone())?;
    let sheet = balance::calculate(&ledger)?;
    Ok(analytics::aggregate(&ledger, &sheet))
}

/// Balances, per-participant stats and settlements in one pass.
pub fn summarize(snapshot: &TripSnapshot) -> Result<SettlementSummary, SmartSplitError> {
    let ledger = Ledger::new(snapshot.clone())?;
    Ok(summarize_ledger(&ledger)?.0)
}

/// Same as [`summarize`] over an already validated ledger; also hands back the
/// balance sheet so analytics can reuse it.
pub fn summarize_ledger(ledger: &Ledger) -> Result<(SettlementSummary, BalanceSheet), SmartSplitError> {
    let sheet = balance::calculate(ledger)?;
    let settlements = settlement::solve(&sheet.balances)?;
    let summary = SettlementSummary {
        settlements,
        stats: sheet.stats.clone(),
        balances: sheet.balances.clone(),
    };
    Ok((summary, sheet))
}
