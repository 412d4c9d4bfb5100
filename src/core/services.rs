use crate::auth::IdentityProvider;
use crate::auth::jwt::JwtService;
use crate::core::constants::{
    CATEGORY_MAX_LENGTH, DEFAULT_CATEGORY, DEFAULT_CURRENCY, DEFAULT_TRIP_ICON, DESCRIPTION_MAX_LENGTH,
    MAX_ENTRY_AMOUNT, NAME_MAX_LENGTH, PAYMENT_CATEGORY, TRIP_VIEW_TTL, UNKNOWN_ACTOR,
};
use crate::core::engine::{self, Ledger, analytics, rounding, timeline};
use crate::core::errors::SmartSplitError;
use crate::core::models::{
    analytics::{AnalyticsData, DailyBalancePoint, DayGroup},
    change_log::{ChangeAction, ChangeLogEntry, ItemType},
    expense::ExpenseEntry,
    settlement::{Balances, SettlementSummary},
    trip::{Participant, Trip, TripSnapshot, TripType},
    user::{Identity, User},
};
use crate::infrastructure::cache::Cache;
use crate::infrastructure::logging::ChangeLogSink;
use crate::infrastructure::storage::Storage;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Everything a trip page needs in one payload.
#[derive(Serialize, Debug, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripDetailsView {
    pub trip: Trip,
    pub participants: Vec<Participant>,
    pub expenses: Vec<ExpenseEntry>,
    pub logs: Vec<ChangeLogEntry>,
    pub settlement_data: SettlementSummary,
    pub daily_balances: Vec<DailyBalancePoint>,
    pub grouped_expenses: Vec<DayGroup>,
    pub analytics_data: AnalyticsData,
    /// Caller's own share of the trip's expenses.
    #[schema(value_type = String)]
    pub user_share: Decimal,
}

#[derive(Serialize, Debug, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub trip_count: usize,
    /// Sum of all non-payment entries across the user's trips.
    #[schema(value_type = String)]
    pub total_tracked: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct TripDraft {
    pub name: String,
    pub trip_type: TripType,
    pub icon: Option<String>,
    pub custom_image: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TripPatch {
    pub name: Option<String>,
    pub trip_type: Option<TripType>,
    pub icon: Option<String>,
    pub custom_image: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: Decimal,
    pub date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub paid_by: String,
    /// Empty means everyone in the trip.
    pub split_among: Vec<String>,
    pub is_payment: bool,
    pub weights: Option<Vec<Decimal>>,
}

/// Partial update; a new `split_among` without `weights` drops the old weights.
#[derive(Debug, Clone, Default)]
pub struct ExpensePatch {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub paid_by: Option<String>,
    pub split_among: Option<Vec<String>>,
    pub is_payment: Option<bool>,
    pub weights: Option<Vec<Decimal>>,
}

pub struct SmartSplitService<L: ChangeLogSink, S: Storage, C: Cache> {
    storage: S,
    logging: L,
    cache: C,
    jwt_service: JwtService,
    password_cost: u32,
    // writes to one trip are serialized; reads never take these
    trip_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<L: ChangeLogSink, S: Storage, C: Cache> SmartSplitService<L, S, C> {
    pub fn new(storage: S, logging: L, cache: C, jwt_secret: String, token_expire_minutes: u64) -> Self {
        SmartSplitService {
            storage,
            logging,
            cache,
            jwt_service: JwtService::new(jwt_secret, token_expire_minutes),
            password_cost: bcrypt::DEFAULT_COST,
            trip_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the bcrypt work factor.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn resolve_identity(&self, token: &str) -> Result<Identity, SmartSplitError> {
        self.jwt_service.resolve(token)
    }

    /// Write lock for one existing trip.
    async fn trip_lock(&self, trip_id: &str) -> Result<Arc<Mutex<()>>, SmartSplitError> {
        if self.storage.get_trip(trip_id).await?.is_none() {
            return Err(SmartSplitError::TripNotFound(trip_id.to_string()));
        }
        let mut locks = self.trip_locks.lock().await;
        // an entry only the map references has no holder and no waiter
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Ok(locks.entry(trip_id.to_string()).or_default().clone())
    }

    #[cfg(test)]
    pub(crate) async fn tracked_trip_locks(&self) -> usize {
        self.trip_locks.lock().await.len()
    }

    async fn owned_trip(&self, trip_id: &str, caller: &Identity) -> Result<Trip, SmartSplitError> {
        let trip = self
            .storage
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| SmartSplitError::TripNotFound(trip_id.to_string()))?;
        if trip.owner_id != caller.user_id {
            return Err(SmartSplitError::NotTripOwner(caller.user_id.clone()));
        }
        Ok(trip)
    }

    async fn owned_snapshot(&self, trip_id: &str, caller: &Identity) -> Result<TripSnapshot, SmartSplitError> {
        self.owned_trip(trip_id, caller).await?;
        self.storage
            .load_snapshot(trip_id)
            .await?
            .ok_or_else(|| SmartSplitError::TripNotFound(trip_id.to_string()))
    }

    async fn actor_name(&self, caller: &Identity, actor: Option<&str>) -> Result<String, SmartSplitError> {
        if let Some(name) = actor.map(str::trim).filter(|name| !name.is_empty()) {
            self.validate_string_input("actor", name, NAME_MAX_LENGTH)?;
            return Ok(name.to_string());
        }
        let user = self.get_user(&caller.user_id).await?;
        if user.name.trim().is_empty() {
            Ok(UNKNOWN_ACTOR.to_string())
        } else {
            Ok(user.name)
        }
    }

    async fn record_change(&self, entry: ChangeLogEntry) -> Result<(), SmartSplitError> {
        debug!(
            trip_id = %entry.trip_id,
            action = ?entry.action,
            item_type = %entry.item_type,
            "Recording change"
        );
        self.logging.record(entry).await
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), SmartSplitError> {
        if value.trim().is_empty() {
            return Err(SmartSplitError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.chars().count() > max_length {
            return Err(SmartSplitError::invalid_input(
                field,
                &format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(SmartSplitError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_email(&self, email: &str) -> Result<(), SmartSplitError> {
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
            }
            None => false,
        };
        if !valid || email.len() < 5 || email.chars().any(char::is_whitespace) {
            return Err(SmartSplitError::InvalidEmail(email.to_string()));
        }
        Ok(())
    }

    /// Checks a user-supplied amount. Payments may be zero, expenses may not.
    pub fn parse_amount(&self, field: &str, amount: Decimal, is_payment: bool) -> Result<Decimal, SmartSplitError> {
        if amount < Decimal::ZERO {
            return Err(SmartSplitError::invalid_input(
                field,
                "Invalid Amount",
                "Amount cannot be negative",
            ));
        }
        if !is_payment && amount.is_zero() {
            return Err(SmartSplitError::invalid_input(
                field,
                "Invalid Amount",
                "Amount must be greater than 0",
            ));
        }
        if amount > Decimal::from(MAX_ENTRY_AMOUNT) {
            return Err(SmartSplitError::invalid_input(
                field,
                "Amount Too Large",
                format!("Amount cannot exceed {}", MAX_ENTRY_AMOUNT),
            ));
        }
        if rounding::has_sub_minor_precision(amount) {
            return Err(SmartSplitError::invalid_input(
                field,
                "Invalid Amount",
                "Amount cannot have more than 2 decimal places",
            ));
        }
        Ok(amount)
    }

    fn validate_entry_text(&self, entry: &ExpenseEntry) -> Result<(), SmartSplitError> {
        self.validate_string_input("description", &entry.description, DESCRIPTION_MAX_LENGTH)?;
        self.validate_string_input("category", &entry.category, CATEGORY_MAX_LENGTH)?;
        Ok(())
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, SmartSplitError> {
        let name = name.trim();
        let email = email.trim().to_lowercase();
        self.validate_string_input("name", name, NAME_MAX_LENGTH)?;
        self.validate_email(&email)?;
        if password.is_empty() {
            return Err(SmartSplitError::invalid_input(
                "password",
                "Invalid password",
                "Password cannot be empty",
            ));
        }

        let hashed = bcrypt::hash(password, self.password_cost)
            .map_err(|e| SmartSplitError::InternalServerError(format!("Password hashing error: {}", e)))?;
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.clone(),
            password: hashed,
        };

        let created = self
            .storage
            .create_user_if_not_exists(user)
            .await?
            .ok_or_else(|| SmartSplitError::EmailAlreadyRegistered(email))?;
        info!(user_id = %created.id, "User registered");
        Ok(created)
    }

    pub fn issue_token(&self, user_id: &str) -> Result<String, SmartSplitError> {
        self.jwt_service.generate_token(user_id)
    }

    /// Verifies credentials and returns the user with a fresh bearer token.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<(User, String), SmartSplitError> {
        let email = email.trim().to_lowercase();
        let user = self
            .storage
            .get_user_by_email(&email)
            .await?
            .ok_or(SmartSplitError::InvalidCredentials)?;

        if bcrypt::verify(password, &user.password)
            .map_err(|e| SmartSplitError::InternalServerError(format!("Password verification error: {}", e)))?
        {
            let token = self.issue_token(&user.id)?;
            Ok((user, token))
        } else {
            warn!(user_id = %user.id, "Rejected login");
            Err(SmartSplitError::InvalidCredentials)
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, SmartSplitError> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| SmartSplitError::UserNotFound(user_id.to_string()))
    }

    pub async fn user_stats(&self, caller: &Identity) -> Result<UserStats, SmartSplitError> {
        let trips = self.storage.get_user_trips(&caller.user_id).await?;
        let mut total_tracked = Decimal::ZERO;
        for trip in &trips {
            total_tracked += self
                .storage
                .get_trip_expenses(&trip.id)
                .await?
                .iter()
                .filter(|e| !e.is_payment)
                .map(|e| e.amount)
                .sum::<Decimal>();
        }
        Ok(UserStats {
            trip_count: trips.len(),
            total_tracked,
        })
    }

    pub async fn create_trip(&self, caller: &Identity, draft: TripDraft) -> Result<Trip, SmartSplitError> {
        let owner = self.get_user(&caller.user_id).await?;
        let name = draft.name.trim().to_string();
        self.validate_string_input("name", &name, NAME_MAX_LENGTH)?;
        let currency = draft.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        self.validate_string_input("currency", &currency, CATEGORY_MAX_LENGTH)?;

        let trip = Trip {
            id: Uuid::new_v4().to_string(),
            name,
            owner_id: owner.id.clone(),
            created_at: Utc::now(),
            icon: Some(draft.icon.unwrap_or_else(|| DEFAULT_TRIP_ICON.to_string())),
            custom_image: draft.custom_image,
            trip_type: draft.trip_type,
            currency,
        };
        self.storage.save_trip(trip.clone()).await?;

        let owner_participant = Participant {
            id: Uuid::new_v4().to_string(),
            trip_id: trip.id.clone(),
            name: owner.name,
        };
        self.storage.save_participant(owner_participant).await?;

        info!(trip_id = %trip.id, owner_id = %trip.owner_id, "Trip created");
        Ok(trip)
    }

    /// Caller's trips, newest first.
    pub async fn list_trips(&self, caller: &Identity) -> Result<Vec<Trip>, SmartSplitError> {
        self.storage.get_user_trips(&caller.user_id).await
    }

    pub async fn update_trip(&self, caller: &Identity, trip_id: &str, patch: TripPatch) -> Result<Trip, SmartSplitError> {
        let lock = self.trip_lock(trip_id).await?;
        let _guard = lock.lock().await;

        let mut trip = self.owned_trip(trip_id, caller).await?;
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            self.validate_string_input("name", &name, NAME_MAX_LENGTH)?;
            trip.name = name;
        }
        if let Some(currency) = patch.currency {
            self.validate_string_input("currency", &currency, CATEGORY_MAX_LENGTH)?;
            trip.currency = currency;
        }
        if let Some(trip_type) = patch.trip_type {
            trip.trip_type = trip_type;
        }
        if patch.icon.is_some() {
            trip.icon = patch.icon;
        }
        if patch.custom_image.is_some() {
            trip.custom_image = patch.custom_image;
        }

        self.storage.save_trip(trip.clone()).await?;
        self.cache.invalidate_trip(trip_id).await?;
        info!(trip_id = %trip_id, "Trip updated");
        Ok(trip)
    }

    pub async fn delete_trip(&self, caller: &Identity, trip_id: &str) -> Result<(), SmartSplitError> {
        let lock = self.trip_lock(trip_id).await?;
        let _guard = lock.lock().await;

        self.owned_trip(trip_id, caller).await?;
        self.storage.delete_trip(trip_id).await?;
        self.logging.clear_trip(trip_id).await?;
        self.cache.invalidate_trip(trip_id).await?;
        info!(trip_id = %trip_id, "Trip deleted");
        Ok(())
    }

    pub async fn add_participant(
        &self,
        caller: &Identity,
        trip_id: &str,
        name: &str,
        actor: Option<&str>,
    ) -> Result<Participant, SmartSplitError> {
        let lock = self.trip_lock(trip_id).await?;
        let _guard = lock.lock().await;

        self.owned_trip(trip_id, caller).await?;
        let name = name.trim();
        self.validate_string_input("name", name, NAME_MAX_LENGTH)?;
        let actor_name = self.actor_name(caller, actor).await?;

        let participant = Participant {
            id: Uuid::new_v4().to_string(),
            trip_id: trip_id.to_string(),
            name: name.to_string(),
        };
        self.storage.save_participant(participant.clone()).await?;
        self.cache.invalidate_trip(trip_id).await?;

        self.record_change(ChangeLogEntry::new(
            trip_id,
            &actor_name,
            ChangeAction::Create,
            ItemType::Participant,
            &participant.id,
            format!("Added participant \"{}\"", participant.name),
            None,
            Some(to_log_value(&participant)?),
        ))
        .await?;

        info!(trip_id = %trip_id, participant_id = %participant.id, "Participant added");
        Ok(participant)
    }

    /// Renames a participant. Entries reference participants by id, so
    /// balances are unaffected.
    pub async fn update_participant(
        &self,
        caller: &Identity,
        trip_id: &str,
        participant_id: &str,
        name: &str,
        actor: Option<&str>,
    ) -> Result<Participant, SmartSplitError> {
        let lock = self.trip_lock(trip_id).await?;
        let _guard = lock.lock().await;

        self.owned_trip(trip_id, caller).await?;
        let name = name.trim();
        self.validate_string_input("name", name, NAME_MAX_LENGTH)?;
        let previous = self
            .storage
            .get_participant(trip_id, participant_id)
            .await?
            .ok_or_else(|| SmartSplitError::ParticipantNotFound(participant_id.to_string()))?;
        let actor_name = self.actor_name(caller, actor).await?;

        let participant = Participant {
            name: name.to_string(),
            ..previous.clone()
        };
        self.storage.save_participant(participant.clone()).await?;
        self.cache.invalidate_trip(trip_id).await?;

        self.record_change(ChangeLogEntry::new(
            trip_id,
            &actor_name,
            ChangeAction::Update,
            ItemType::Participant,
            participant_id,
            format!("Renamed participant \"{}\" to \"{}\"", previous.name, participant.name),
            Some(to_log_value(&previous)?),
            Some(to_log_value(&participant)?),
        ))
        .await?;

        info!(trip_id = %trip_id, participant_id = %participant_id, "Participant renamed");
        Ok(participant)
    }

    pub async fn remove_participant(
        &self,
        caller: &Identity,
        trip_id: &str,
        participant_id: &str,
        actor: Option<&str>,
    ) -> Result<(), SmartSplitError> {
        let lock = self.trip_lock(trip_id).await?;
        let _guard = lock.lock().await;

        self.owned_trip(trip_id, caller).await?;
        let actor_name = self.actor_name(caller, actor).await?;
        let participant = self.delete_participant_unlocked(trip_id, participant_id).await?;

        self.record_change(ChangeLogEntry::new(
            trip_id,
            &actor_name,
            ChangeAction::Delete,
            ItemType::Participant,
            participant_id,
            format!("Removed participant \"{}\"", participant.name),
            Some(to_log_value(&participant)?),
            None,
        ))
        .await?;

        info!(trip_id = %trip_id, participant_id = %participant_id, "Participant removed");
        Ok(())
    }

    async fn delete_participant_unlocked(
        &self,
        trip_id: &str,
        participant_id: &str,
    ) -> Result<Participant, SmartSplitError> {
        let participant = self
            .storage
            .get_participant(trip_id, participant_id)
            .await?
            .ok_or_else(|| SmartSplitError::ParticipantNotFound(participant_id.to_string()))?;
        let in_use = self
            .storage
            .get_trip_expenses(trip_id)
            .await?
            .iter()
            .any(|entry| entry.involves(participant_id));
        if in_use {
            return Err(SmartSplitError::ParticipantInUse(participant_id.to_string()));
        }
        self.storage.delete_participant(trip_id, participant_id).await?;
        self.cache.invalidate_trip(trip_id).await?;
        Ok(participant)
    }

    pub async fn add_expense(
        &self,
        caller: &Identity,
        trip_id: &str,
        draft: ExpenseDraft,
        actor: Option<&str>,
    ) -> Result<ExpenseEntry, SmartSplitError> {
        let lock = self.trip_lock(trip_id).await?;
        let _guard = lock.lock().await;

        let snapshot = self.owned_snapshot(trip_id, caller).await?;
        let actor_name = self.actor_name(caller, actor).await?;
        let amount = self.parse_amount("amount", draft.amount, draft.is_payment)?;
        let category = if draft.is_payment {
            PAYMENT_CATEGORY.to_string()
        } else {
            draft.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
        };

        let entry = ExpenseEntry {
            id: Uuid::new_v4().to_string(),
            trip_id: trip_id.to_string(),
            description: draft.description.trim().to_string(),
            amount,
            date: draft.date.unwrap_or_else(Utc::now),
            category,
            paid_by: draft.paid_by,
            split_among: draft.split_among,
            is_payment: draft.is_payment,
            weights: draft.weights,
        };
        let entry = pin_split_members(entry, &snapshot.participants);
        self.validate_entry_text(&entry)?;
        Ledger::new(with_expense(snapshot, entry.clone()))?;

        self.storage.save_expense(entry.clone()).await?;
        self.cache.invalidate_trip(trip_id).await?;
        self.record_change(ChangeLogEntry::new(
            trip_id,
            &actor_name,
            ChangeAction::Create,
            ItemType::Expense,
            &entry.id,
            format!("Added \"{}\"", entry.description),
            None,
            Some(to_log_value(&entry)?),
        ))
        .await?;

        info!(trip_id = %trip_id, expense_id = %entry.id, is_payment = entry.is_payment, "Expense added");
        Ok(entry)
    }

    pub async fn update_expense(
        &self,
        caller: &Identity,
        trip_id: &str,
        expense_id: &str,
        patch: ExpensePatch,
        actor: Option<&str>,
    ) -> Result<ExpenseEntry, SmartSplitError> {
        let lock = self.trip_lock(trip_id).await?;
        let _guard = lock.lock().await;

        let snapshot = self.owned_snapshot(trip_id, caller).await?;
        let previous = snapshot
            .expenses
            .iter()
            .find(|e| e.id == expense_id)
            .cloned()
            .ok_or_else(|| SmartSplitError::ExpenseNotFound(expense_id.to_string()))?;
        let actor_name = self.actor_name(caller, actor).await?;

        let mut entry = previous.clone();
        if let Some(description) = patch.description {
            entry.description = description.trim().to_string();
        }
        if let Some(is_payment) = patch.is_payment {
            entry.is_payment = is_payment;
        }
        if let Some(amount) = patch.amount {
            entry.amount = amount;
        }
        entry.amount = self.parse_amount("amount", entry.amount, entry.is_payment)?;
        if let Some(date) = patch.date {
            entry.date = date;
        }
        if let Some(category) = patch.category {
            entry.category = category;
        }
        if entry.is_payment {
            entry.category = PAYMENT_CATEGORY.to_string();
        }
        if let Some(paid_by) = patch.paid_by {
            entry.paid_by = paid_by;
        }
        if let Some(split_among) = patch.split_among {
            entry.split_among = split_among;
            entry.weights = None;
        }
        if patch.weights.is_some() {
            entry.weights = patch.weights;
        }
        let entry = pin_split_members(entry, &snapshot.participants);
        self.validate_entry_text(&entry)?;
        Ledger::new(with_expense(snapshot, entry.clone()))?;

        self.storage.save_expense(entry.clone()).await?;
        self.cache.invalidate_trip(trip_id).await?;
        self.record_change(ChangeLogEntry::new(
            trip_id,
            &actor_name,
            ChangeAction::Update,
            ItemType::Expense,
            &entry.id,
            format!("Updated \"{}\"", previous.description),
            Some(to_log_value(&previous)?),
            Some(to_log_value(&entry)?),
        ))
        .await?;

        info!(trip_id = %trip_id, expense_id = %entry.id, "Expense updated");
        Ok(entry)
    }

    pub async fn delete_expense(
        &self,
        caller: &Identity,
        trip_id: &str,
        expense_id: &str,
        actor: Option<&str>,
    ) -> Result<(), SmartSplitError> {
        let lock = self.trip_lock(trip_id).await?;
        let _guard = lock.lock().await;

        let snapshot = self.owned_snapshot(trip_id, caller).await?;
        let previous = snapshot
            .expenses
            .iter()
            .find(|e| e.id == expense_id)
            .cloned()
            .ok_or_else(|| SmartSplitError::ExpenseNotFound(expense_id.to_string()))?;
        let actor_name = self.actor_name(caller, actor).await?;
        Ledger::new(without_expense(snapshot, expense_id))?;

        self.storage.delete_expense(trip_id, expense_id).await?;
        self.cache.invalidate_trip(trip_id).await?;
        self.record_change(ChangeLogEntry::new(
            trip_id,
            &actor_name,
            ChangeAction::Delete,
            ItemType::Expense,
            expense_id,
            format!("Deleted \"{}\"", previous.description),
            Some(to_log_value(&previous)?),
            None,
        ))
        .await?;

        info!(trip_id = %trip_id, expense_id = %expense_id, "Expense deleted");
        Ok(())
    }

    pub async fn trip_snapshot(&self, caller: &Identity, trip_id: &str) -> Result<TripSnapshot, SmartSplitError> {
        self.owned_snapshot(trip_id, caller).await
    }

    pub async fn balances(&self, caller: &Identity, trip_id: &str) -> Result<Balances, SmartSplitError> {
        let snapshot = self.owned_snapshot(trip_id, caller).await?;
        engine::compute_balances(&snapshot)
    }

    pub async fn settlements(&self, caller: &Identity, trip_id: &str) -> Result<SettlementSummary, SmartSplitError> {
        let snapshot = self.owned_snapshot(trip_id, caller).await?;
        engine::summarize(&snapshot)
    }

    pub async fn analytics(&self, caller: &Identity, trip_id: &str) -> Result<AnalyticsData, SmartSplitError> {
        let snapshot = self.owned_snapshot(trip_id, caller).await?;
        engine::compute_analytics(&snapshot)
    }

    /// Cached per viewer. A miss is computed and stored under the trip's write lock.
    pub async fn trip_view(&self, caller: &Identity, trip_id: &str) -> Result<TripDetailsView, SmartSplitError> {
        self.owned_trip(trip_id, caller).await?;
        if let Some(view) = self.cache.get_trip_view(trip_id, &caller.user_id).await? {
            debug!(trip_id = %trip_id, "Trip view served from cache");
            return Ok(view);
        }

        let lock = self.trip_lock(trip_id).await?;
        let _guard = lock.lock().await;
        if let Some(view) = self.cache.get_trip_view(trip_id, &caller.user_id).await? {
            return Ok(view);
        }
        let snapshot = self.owned_snapshot(trip_id, caller).await?;

        let viewer = self.get_user(&caller.user_id).await?;
        let logs = self.logging.list_for_trip(trip_id).await?;
        let ledger = Ledger::new(snapshot)?;
        let (settlement_data, sheet) = engine::summarize_ledger(&ledger)?;
        let analytics_data = analytics::aggregate(&ledger, &sheet);

        let user_share = ledger
            .participants()
            .iter()
            .find(|p| p.name == viewer.name)
            .and_then(|p| settlement_data.stats.get(&p.id))
            .map(|stats| stats.share)
            .unwrap_or(Decimal::ZERO);

        let view = TripDetailsView {
            trip: ledger.trip().clone(),
            participants: ledger.participants().to_vec(),
            expenses: ledger.entries().to_vec(),
            logs,
            daily_balances: timeline::daily_balances(&ledger),
            grouped_expenses: timeline::group_by_day(&ledger),
            settlement_data,
            analytics_data,
            user_share,
        };

        self.cache
            .save_trip_view(trip_id, &caller.user_id, &view, TRIP_VIEW_TTL)
            .await?;
        Ok(view)
    }

    /// Newest first.
    pub async fn list_logs(&self, caller: &Identity, trip_id: &str) -> Result<Vec<ChangeLogEntry>, SmartSplitError> {
        self.owned_trip(trip_id, caller).await?;
        self.logging.list_for_trip(trip_id).await
    }

    /// Undoes one logged change and returns the `revert` entry recorded for it.
    pub async fn revert_log(&self, caller: &Identity, log_id: &str) -> Result<ChangeLogEntry, SmartSplitError> {
        let entry = self
            .logging
            .get(log_id)
            .await?
            .ok_or_else(|| SmartSplitError::ChangeLogNotFound(log_id.to_string()))?;
        let trip_id = entry.trip_id.clone();

        let lock = self.trip_lock(&trip_id).await?;
        let _guard = lock.lock().await;

        self.owned_trip(&trip_id, caller).await?;
        // re-read under the lock; a concurrent revert may have consumed it
        let entry = self
            .logging
            .get(log_id)
            .await?
            .ok_or_else(|| SmartSplitError::ChangeLogNotFound(log_id.to_string()))?;
        let actor_name = self.actor_name(caller, None).await?;
        self.revert_unlocked(entry, &actor_name).await
    }

    /// Reverts every non-revert entry of the trip, newest first. Returns how many were undone.
    ///
    /// All or nothing: the whole sequence is replayed on a snapshot first, and
    /// nothing is touched if any step would fail.
    pub async fn revert_all(&self, caller: &Identity, trip_id: &str) -> Result<usize, SmartSplitError> {
        let lock = self.trip_lock(trip_id).await?;
        let _guard = lock.lock().await;

        self.owned_trip(trip_id, caller).await?;
        let actor_name = self.actor_name(caller, None).await?;
        let pending: Vec<ChangeLogEntry> = self
            .logging
            .list_for_trip(trip_id)
            .await?
            .into_iter()
            .filter(|entry| entry.action != ChangeAction::Revert)
            .collect();

        let mut plan = self
            .storage
            .load_snapshot(trip_id)
            .await?
            .ok_or_else(|| SmartSplitError::TripNotFound(trip_id.to_string()))?;
        for entry in &pending {
            plan = apply_inverse(plan, entry).inspect_err(|e| {
                warn!(trip_id = %trip_id, log_id = %entry.id, error = %e, "Revert all rejected");
            })?;
        }

        let mut reverted = 0;
        for entry in pending {
            self.revert_unlocked(entry, &actor_name).await?;
            reverted += 1;
        }
        info!(trip_id = %trip_id, reverted, "Reverted all changes");
        Ok(reverted)
    }

    async fn revert_unlocked(&self, entry: ChangeLogEntry, actor_name: &str) -> Result<ChangeLogEntry, SmartSplitError> {
        let trip_id = entry.trip_id.as_str();
        let snapshot = self
            .storage
            .load_snapshot(trip_id)
            .await?
            .ok_or_else(|| SmartSplitError::TripNotFound(trip_id.to_string()))?;
        let before = snapshot.clone();
        let after = apply_inverse(snapshot, &entry)?;

        match entry.item_type {
            ItemType::Expense => {
                let restored = after.expenses.iter().find(|e| e.id == entry.item_id);
                let existed = before.expenses.iter().any(|e| e.id == entry.item_id);
                match restored {
                    Some(expense) => self.storage.save_expense(expense.clone()).await?,
                    None if existed => self.storage.delete_expense(trip_id, &entry.item_id).await?,
                    None => {}
                }
            }
            ItemType::Participant => {
                let restored = after.participants.iter().find(|p| p.id == entry.item_id);
                let existed = before.participants.iter().any(|p| p.id == entry.item_id);
                match restored {
                    Some(participant) => self.storage.save_participant(participant.clone()).await?,
                    None if existed => self.storage.delete_participant(trip_id, &entry.item_id).await?,
                    None => {}
                }
            }
        }
        self.cache.invalidate_trip(trip_id).await?;
        self.logging.remove(&entry.id).await?;

        let revert = ChangeLogEntry::new(
            trip_id,
            actor_name,
            ChangeAction::Revert,
            entry.item_type,
            &entry.item_id,
            format!("Reverted: {}", entry.description),
            entry.current_data.clone(),
            entry.previous_data.clone(),
        );
        self.record_change(revert.clone()).await?;
        info!(trip_id = %trip_id, log_id = %entry.id, "Change reverted");
        Ok(revert)
    }
}

/// Undoes one logged change on a snapshot and checks the result still forms
/// a valid ledger.
fn apply_inverse(mut snapshot: TripSnapshot, entry: &ChangeLogEntry) -> Result<TripSnapshot, SmartSplitError> {
    match (entry.item_type, entry.action) {
        (_, ChangeAction::Revert) => {
            return Err(SmartSplitError::invalid_input(
                "logId",
                "Invalid log entry",
                "A revert cannot itself be reverted",
            ));
        }
        (ItemType::Expense, ChangeAction::Create) => {
            snapshot = without_expense(snapshot, &entry.item_id);
        }
        (ItemType::Expense, _) => {
            let previous: ExpenseEntry = from_log_value(entry, entry.previous_data.as_ref())?;
            snapshot = with_expense(snapshot, previous);
        }
        (ItemType::Participant, ChangeAction::Create) => {
            if snapshot.expenses.iter().any(|e| e.involves(&entry.item_id)) {
                return Err(SmartSplitError::ParticipantInUse(entry.item_id.clone()));
            }
            snapshot.participants.retain(|p| p.id != entry.item_id);
        }
        (ItemType::Participant, _) => {
            let previous: Participant = from_log_value(entry, entry.previous_data.as_ref())?;
            match snapshot.participants.iter_mut().find(|p| p.id == previous.id) {
                Some(existing) => *existing = previous,
                None => snapshot.participants.push(previous),
            }
        }
    }
    Ledger::new(snapshot.clone())?;
    Ok(snapshot)
}

/// An expense split among "everyone" is stored with the members present now,
/// so later participant changes leave it alone.
fn pin_split_members(mut entry: ExpenseEntry, participants: &[Participant]) -> ExpenseEntry {
    if entry.split_among.is_empty() && !entry.is_payment {
        entry.split_among = participants.iter().map(|p| p.id.clone()).collect();
    }
    entry
}

fn with_expense(mut snapshot: TripSnapshot, entry: ExpenseEntry) -> TripSnapshot {
    match snapshot.expenses.iter_mut().find(|e| e.id == entry.id) {
        Some(existing) => *existing = entry,
        None => snapshot.expenses.push(entry),
    }
    snapshot
}

fn without_expense(mut snapshot: TripSnapshot, expense_id: &str) -> TripSnapshot {
    snapshot.expenses.retain(|e| e.id != expense_id);
    snapshot
}

fn to_log_value<T: Serialize>(item: &T) -> Result<Value, SmartSplitError> {
    serde_json::to_value(item).map_err(|e| SmartSplitError::LoggingError(format!("Failed to snapshot item: {}", e)))
}

fn from_log_value<T: serde::de::DeserializeOwned>(
    entry: &ChangeLogEntry,
    data: Option<&Value>,
) -> Result<T, SmartSplitError> {
    let data = data.ok_or_else(|| {
        SmartSplitError::LoggingError(format!("Change log {} has no previous snapshot", entry.id))
    })?;
    serde_json::from_value(data.clone())
        .map_err(|e| SmartSplitError::LoggingError(format!("Change log {} is unreadable: {}", entry.id, e)))
}
