use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseEntry {
    pub id: String,
    pub trip_id: String,
    pub description: String,
    #[schema(value_type = String, example = "100.00")]
    pub amount: Decimal,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub date: DateTime<Utc>,
    pub category: String,
    pub paid_by: String,
    /// Participants sharing the cost. Empty means every trip participant.
    /// For a payment this holds exactly the recipient.
    #[serde(default)]
    pub split_among: Vec<String>,
    #[serde(default)]
    pub is_payment: bool,
    /// Optional per-member weights, parallel to `split_among`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<String>>)]
    pub weights: Option<Vec<Decimal>>,
}

impl ExpenseEntry {
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }

    /// Recipient of a payment entry.
    pub fn recipient(&self) -> Option<&str> {
        if self.is_payment {
            self.split_among.first().map(String::as_str)
        } else {
            None
        }
    }

    pub fn involves(&self, participant_id: &str) -> bool {
        self.paid_by == participant_id || self.split_among.iter().any(|id| id == participant_id)
    }
}
