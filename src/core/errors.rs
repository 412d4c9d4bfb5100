use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug, Serialize, PartialEq)]
pub enum SmartSplitError {
    /// Ledger input violates referential integrity or amount rules
    #[error("Invalid ledger: {0}")]
    InvalidLedger(String),

    /// Balances handed to the settlement solver do not sum to zero
    #[error("Unbalanced ledger: balances sum to {0}")]
    UnbalancedLedger(Decimal),

    /// Trip with given ID not found
    #[error("Trip {0} not found")]
    TripNotFound(String),

    /// Participant with given ID not found
    #[error("Participant {0} not found")]
    ParticipantNotFound(String),

    /// Expense with given ID not found
    #[error("Expense {0} not found")]
    ExpenseNotFound(String),

    /// Change log entry with given ID not found
    #[error("Change log {0} not found")]
    ChangeLogNotFound(String),

    /// User with given ID not found
    #[error("User {0} not found")]
    UserNotFound(String),

    /// Caller does not own the trip
    #[error("User {0} is not trip owner")]
    NotTripOwner(String),

    /// Participant is still referenced by expense entries
    #[error("Participant {0} is involved in expenses")]
    ParticipantInUse(String),

    /// Email is already registered
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    /// Email format is invalid
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Missing or rejected bearer credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}

impl SmartSplitError {
    pub fn invalid_input(field: &str, title: &str, description: impl Into<String>) -> Self {
        SmartSplitError::InvalidInput(
            field.to_string(),
            FieldError {
                field: field.to_string(),
                title: title.to_string(),
                description: description.into(),
            },
        )
    }
}
