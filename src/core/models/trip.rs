use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::expense::ExpenseEntry;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    #[default]
    Trip,
    Dining,
    Movies,
    Play,
}

impl std::fmt::Display for TripType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TripType::Trip => "trip",
            TripType::Dining => "dining",
            TripType::Movies => "movies",
            TripType::Play => "play",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    pub icon: Option<String>,
    pub custom_image: Option<String>,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    /// Single currency label for every amount in the trip; no conversion happens.
    pub currency: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub trip_id: String,
    pub name: String,
}

/// Fully hydrated trip as handed over by storage for one computation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripSnapshot {
    pub trip: Trip,
    pub participants: Vec<Participant>,
    pub expenses: Vec<ExpenseEntry>,
}

impl TripSnapshot {
    pub fn new(trip: Trip, participants: Vec<Participant>, expenses: Vec<ExpenseEntry>) -> Self {
        TripSnapshot {
            trip,
            participants,
            expenses,
        }
    }
}
