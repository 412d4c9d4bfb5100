use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
    Revert,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Expense,
    Participant,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemType::Expense => "expense",
            ItemType::Participant => "participant",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    pub id: String,
    pub trip_id: String,
    pub actor_name: String,
    pub action: ChangeAction,
    pub item_type: ItemType,
    pub item_id: String,
    pub description: String,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub timestamp: DateTime<Utc>,
    #[schema(value_type = Option<Object>)]
    pub previous_data: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub current_data: Option<Value>,
}

impl ChangeLogEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trip_id: &str,
        actor_name: &str,
        action: ChangeAction,
        item_type: ItemType,
        item_id: &str,
        description: String,
        previous_data: Option<Value>,
        current_data: Option<Value>,
    ) -> Self {
        ChangeLogEntry {
            id: Uuid::new_v4().to_string(),
            trip_id: trip_id.to_string(),
            actor_name: actor_name.to_string(),
            action,
            item_type,
            item_id: item_id.to_string(),
            description,
            timestamp: Utc::now(),
            previous_data,
            current_data,
        }
    }
}
