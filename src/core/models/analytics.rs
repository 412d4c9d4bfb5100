use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::expense::ExpenseEntry;
use super::settlement::Balances;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChartSlice {
    pub participant_id: String,
    pub label: String,
    #[schema(value_type = String)]
    pub value: Decimal,
    pub color: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChartBar {
    #[schema(value_type = String, example = "2024-06-01")]
    pub date: NaiveDate,
    pub label: String,
    #[schema(value_type = String)]
    pub value: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantAmount {
    pub participant_id: String,
    pub name: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAmount {
    pub category: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: String,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub involved: Vec<ParticipantAmount>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TotalPayerStat {
    pub id: String,
    pub name: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub categories: Vec<CategoryAmount>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndividualShareStat {
    pub participant_id: String,
    pub name: String,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub categories: Vec<CategoryAmount>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub participant_stats: Vec<ChartSlice>,
    pub daily_stats: Vec<ChartBar>,
    pub category_stats: Vec<CategoryStats>,
    #[schema(value_type = String)]
    pub total_trip_cost: Decimal,
    pub total_payer_stats: Vec<TotalPayerStat>,
    pub individual_share_stats: Vec<IndividualShareStat>,
}

/// Running balances after all entries dated on or before `date`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyBalancePoint {
    #[schema(value_type = String, example = "2024-06-01")]
    pub date: NaiveDate,
    pub balances: Balances,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayGroup {
    #[schema(value_type = String, example = "2024-06-01")]
    pub date: NaiveDate,
    pub entries: Vec<ExpenseEntry>,
}
