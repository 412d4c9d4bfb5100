use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::core::errors::{FieldError, SmartSplitError};
use crate::core::models::{trip::TripType, user::User};
use crate::core::services::{ExpenseDraft, ExpensePatch, TripDraft, TripPatch, UserStats};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: User,
    pub stats: UserStats,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    pub name: String,
    pub icon: Option<String>,
    pub custom_image: Option<String>,
    #[serde(rename = "type", default)]
    pub trip_type: Option<TripType>,
    pub currency: Option<String>,
}

impl From<CreateTripRequest> for TripDraft {
    fn from(req: CreateTripRequest) -> Self {
        TripDraft {
            name: req.name,
            trip_type: req.trip_type.unwrap_or_default(),
            icon: req.icon,
            custom_image: req.custom_image,
            currency: req.currency,
        }
    }
}

#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTripRequest {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub custom_image: Option<String>,
    #[serde(rename = "type", default)]
    pub trip_type: Option<TripType>,
    pub currency: Option<String>,
}

impl From<UpdateTripRequest> for TripPatch {
    fn from(req: UpdateTripRequest) -> Self {
        TripPatch {
            name: req.name,
            trip_type: req.trip_type,
            icon: req.icon,
            custom_image: req.custom_image,
            currency: req.currency,
        }
    }
}

/// Name recorded in the change log instead of the account holder's.
#[derive(Deserialize, ToSchema, Clone)]
pub struct ActorRef {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateParticipantRequest {
    pub name: String,
    pub actor: Option<ActorRef>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateParticipantRequest {
    pub name: String,
    pub actor: Option<ActorRef>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    pub description: String,
    #[schema(value_type = String, example = "100.00")]
    pub amount: Decimal,
    #[schema(value_type = Option<String>, example = "2024-06-01T12:34:56Z")]
    pub date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub paid_by: String,
    #[serde(default)]
    pub split_among: Vec<String>,
    #[serde(default)]
    pub is_payment: bool,
    #[schema(value_type = Option<Vec<String>>)]
    pub weights: Option<Vec<Decimal>>,
}

impl From<ExpenseInput> for ExpenseDraft {
    fn from(input: ExpenseInput) -> Self {
        ExpenseDraft {
            description: input.description,
            amount: input.amount,
            date: input.date,
            category: input.category,
            paid_by: input.paid_by,
            split_among: input.split_among,
            is_payment: input.is_payment,
            weights: input.weights,
        }
    }
}

#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseUpdateInput {
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub paid_by: Option<String>,
    pub split_among: Option<Vec<String>>,
    pub is_payment: Option<bool>,
    #[schema(value_type = Option<Vec<String>>)]
    pub weights: Option<Vec<Decimal>>,
}

impl From<ExpenseUpdateInput> for ExpensePatch {
    fn from(input: ExpenseUpdateInput) -> Self {
        ExpensePatch {
            description: input.description,
            amount: input.amount,
            date: input.date,
            category: input.category,
            paid_by: input.paid_by,
            split_among: input.split_among,
            is_payment: input.is_payment,
            weights: input.weights,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateExpenseRequest {
    pub expense: ExpenseInput,
    pub actor: Option<ActorRef>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateExpenseRequest {
    pub data: ExpenseUpdateInput,
    pub actor: Option<ActorRef>,
}

/// Query string for deletions, which carry no body.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActorQuery {
    pub actor_name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RevertAllResponse {
    pub reverted: usize,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldError>,
}

// Newtype wrapper for SmartSplitError to implement IntoResponse
pub struct ApiError(pub SmartSplitError);

impl From<SmartSplitError> for ApiError {
    fn from(err: SmartSplitError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let message = self.0.to_string();
        let (status, details) = match self.0 {
            SmartSplitError::InvalidLedger(_) | SmartSplitError::InvalidEmail(_) => (StatusCode::BAD_REQUEST, None),
            SmartSplitError::InvalidInput(_, field_error) => (StatusCode::BAD_REQUEST, Some(field_error)),
            SmartSplitError::TripNotFound(_)
            | SmartSplitError::ParticipantNotFound(_)
            | SmartSplitError::ExpenseNotFound(_)
            | SmartSplitError::ChangeLogNotFound(_)
            | SmartSplitError::UserNotFound(_) => (StatusCode::NOT_FOUND, None),
            SmartSplitError::NotTripOwner(_) => (StatusCode::FORBIDDEN, None),
            SmartSplitError::ParticipantInUse(_) | SmartSplitError::EmailAlreadyRegistered(_) => {
                (StatusCode::CONFLICT, None)
            }
            SmartSplitError::InvalidCredentials | SmartSplitError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, None),
            SmartSplitError::UnbalancedLedger(_)
            | SmartSplitError::InternalServerError(_)
            | SmartSplitError::StorageError(_)
            | SmartSplitError::LoggingError(_)
            | SmartSplitError::CacheError(_) => {
                error!(error = %message, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };
        (status, Json(ErrorResponse { error: message, details })).into_response()
    }
}
