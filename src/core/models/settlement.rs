use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Directed transfer that moves `amount` from a debtor to a creditor.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub from_id: String,
    pub to_id: String,
    #[schema(value_type = String, example = "33.34")]
    pub amount: Decimal,
}

/// Net position per participant id. Positive is owed by the group, negative owes the group.
///
/// Keyed by a `BTreeMap` so iteration order never depends on insertion order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct Balances(BTreeMap<String, Decimal>);

impl Balances {
    pub fn new() -> Self {
        Balances(BTreeMap::new())
    }

    pub fn get(&self, participant_id: &str) -> Decimal {
        self.0.get(participant_id).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn credit(&mut self, participant_id: &str, amount: Decimal) {
        *self.0.entry(participant_id.to_string()).or_insert(Decimal::ZERO) += amount;
    }

    pub fn debit(&mut self, participant_id: &str, amount: Decimal) {
        *self.0.entry(participant_id.to_string()).or_insert(Decimal::ZERO) -= amount;
    }

    pub fn sum(&self) -> Decimal {
        self.0.values().copied().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Decimal)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Decimal)> for Balances {
    fn from_iter<T: IntoIterator<Item = (String, Decimal)>>(iter: T) -> Self {
        let mut balances = Balances::new();
        for (id, amount) in iter {
            balances.credit(&id, amount);
        }
        balances
    }
}

/// What a participant fronted, owes, sent and received across a trip.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MoneyStats {
    #[schema(value_type = String)]
    pub paid: Decimal,
    #[schema(value_type = String)]
    pub share: Decimal,
    #[schema(value_type = String)]
    pub sent: Decimal,
    #[schema(value_type = String)]
    pub received: Decimal,
}

impl MoneyStats {
    pub fn net(&self) -> Decimal {
        self.paid - self.share - self.sent + self.received
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettlementSummary {
    pub settlements: Vec<Settlement>,
    #[schema(value_type = Object)]
    pub stats: BTreeMap<String, MoneyStats>,
    pub balances: Balances,
}
