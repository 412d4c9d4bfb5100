use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::core::constants::{MAX_ENTRY_AMOUNT, MAX_SPLIT_WEIGHT};
use crate::core::engine::rounding::has_sub_minor_precision;
use crate::core::errors::SmartSplitError;
use crate::core::models::{
    expense::ExpenseEntry,
    trip::{Participant, Trip, TripSnapshot},
};

/// Validated, read-only view over one trip's participants and entries.
///
/// Construction is the only way in: a `Ledger` that exists satisfies every
/// referential and amount invariant. Changes are made by building a new one.
#[derive(Clone, Debug)]
pub struct Ledger {
    trip: Trip,
    participants: Vec<Participant>,
    entries: Vec<ExpenseEntry>,
}

impl Ledger {
    pub fn new(snapshot: TripSnapshot) -> Result<Self, SmartSplitError> {
        let TripSnapshot {
            trip,
            participants,
            expenses,
        } = snapshot;

        let mut seen = HashSet::new();
        for participant in &participants {
            if participant.trip_id != trip.id {
                return Err(SmartSplitError::InvalidLedger(format!(
                    "participant {} belongs to trip {}, not {}",
                    participant.id, participant.trip_id, trip.id
                )));
            }
            if !seen.insert(participant.id.as_str()) {
                return Err(SmartSplitError::InvalidLedger(format!(
                    "participant {} listed twice",
                    participant.id
                )));
            }
        }

        let mut entries: Vec<ExpenseEntry> = expenses
            .into_iter()
            .map(|mut entry| {
                if entry.split_among.is_empty() && !entry.is_payment {
                    entry.split_among = participants.iter().map(|p| p.id.clone()).collect();
                }
                entry
            })
            .collect();
        // stable: entries sharing a timestamp keep their input order
        entries.sort_by_key(|entry| entry.date);

        let ledger = Ledger {
            trip,
            participants,
            entries,
        };
        ledger.validate()?;
        Ok(ledger)
    }

    /// Re-checks every entry against the participant list.
    pub fn validate(&self) -> Result<(), SmartSplitError> {
        let members: HashSet<&str> = self.participants.iter().map(|p| p.id.as_str()).collect();
        for entry in &self.entries {
            self.validate_entry(entry, &members)?;
        }
        Ok(())
    }

    fn validate_entry(&self, entry: &ExpenseEntry, members: &HashSet<&str>) -> Result<(), SmartSplitError> {
        let invalid = |reason: String| SmartSplitError::InvalidLedger(format!("entry {}: {}", entry.id, reason));

        if entry.trip_id != self.trip.id {
            return Err(invalid(format!("belongs to trip {}", entry.trip_id)));
        }
        if entry.amount < Decimal::ZERO {
            return Err(invalid(format!("negative amount {}", entry.amount)));
        }
        if !entry.is_payment && entry.amount <= Decimal::ZERO {
            return Err(invalid("expense amount must be greater than 0".to_string()));
        }
        if entry.amount > Decimal::from(MAX_ENTRY_AMOUNT) {
            return Err(invalid(format!("amount {} exceeds {}", entry.amount, MAX_ENTRY_AMOUNT)));
        }
        if has_sub_minor_precision(entry.amount) {
            return Err(invalid(format!("amount {} has more than two decimal places", entry.amount)));
        }
        if !members.contains(entry.paid_by.as_str()) {
            return Err(invalid(format!("payer {} is not a trip participant", entry.paid_by)));
        }
        if entry.split_among.is_empty() {
            return Err(invalid("split set is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for member in &entry.split_among {
            if !members.contains(member.as_str()) {
                return Err(invalid(format!("split member {} is not a trip participant", member)));
            }
            if !seen.insert(member.as_str()) {
                return Err(invalid(format!("split member {} listed twice", member)));
            }
        }

        if entry.is_payment {
            if entry.split_among.len() != 1 {
                return Err(invalid("payment must have exactly one recipient".to_string()));
            }
            if entry.weights.is_some() {
                return Err(invalid("payment cannot carry split weights".to_string()));
            }
        }

        if let Some(weights) = &entry.weights {
            if weights.len() != entry.split_among.len() {
                return Err(invalid(format!(
                    "{} weights for {} split members",
                    weights.len(),
                    entry.split_among.len()
                )));
            }
            if weights.iter().any(|w| *w <= Decimal::ZERO) {
                return Err(invalid("split weights must be positive".to_string()));
            }
            if weights.iter().any(|w| *w > Decimal::from(MAX_SPLIT_WEIGHT)) {
                return Err(invalid(format!("split weights cannot exceed {}", MAX_SPLIT_WEIGHT)));
            }
        }
        Ok(())
    }

    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    pub fn participant_name(&self, participant_id: &str) -> &str {
        self.participant(participant_id).map_or("Unknown", |p| p.name.as_str())
    }

    /// All entries, ordered by date.
    pub fn entries(&self) -> &[ExpenseEntry] {
        &self.entries
    }

    /// Genuine expenses, payments excluded.
    pub fn expenses(&self) -> impl Iterator<Item = &ExpenseEntry> {
        self.entries.iter().filter(|e| !e.is_payment)
    }

    pub fn payments(&self) -> impl Iterator<Item = &ExpenseEntry> {
        self.entries.iter().filter(|e| e.is_payment)
    }

    /// `(expenses, payments)`
    pub fn partition(&self) -> (Vec<&ExpenseEntry>, Vec<&ExpenseEntry>) {
        self.entries.iter().partition(|e| !e.is_payment)
    }

    pub fn in_category(&self, category: &str) -> Vec<&ExpenseEntry> {
        self.entries.iter().filter(|e| e.category == category).collect()
    }

    /// Entries whose calendar day falls in `start..=end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Vec<&ExpenseEntry> {
        self.entries
            .iter()
            .filter(|e| {
                let day = e.day();
                day >= start && day <= end
            })
            .collect()
    }

    /// Entries where the participant pays or shares.
    pub fn involving(&self, participant_id: &str) -> Vec<&ExpenseEntry> {
        self.entries.iter().filter(|e| e.involves(participant_id)).collect()
    }

    /// First and last calendar day carrying an entry.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.entries.first()?.day();
        let last = self.entries.last()?.day();
        Some((first, last))
    }
}
