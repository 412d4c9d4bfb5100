use crate::core::errors::SmartSplitError;
use crate::core::models::{
    expense::ExpenseEntry,
    trip::{Participant, Trip, TripSnapshot},
    user::User,
};
use async_trait::async_trait;

/// Authoritative record of users, trips, participants and entries.
///
/// Writers are serialized per trip by the service; implementations only need
/// to make individual calls atomic.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns `None` when the email is already taken.
    async fn create_user_if_not_exists(&self, user: User) -> Result<Option<User>, SmartSplitError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, SmartSplitError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, SmartSplitError>;

    async fn save_trip(&self, trip: Trip) -> Result<(), SmartSplitError>;
    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, SmartSplitError>;
    /// Removes the trip together with its participants and entries.
    async fn delete_trip(&self, trip_id: &str) -> Result<(), SmartSplitError>;
    async fn get_user_trips(&self, owner_id: &str) -> Result<Vec<Trip>, SmartSplitError>;

    async fn save_participant(&self, participant: Participant) -> Result<(), SmartSplitError>;
    async fn get_participant(&self, trip_id: &str, participant_id: &str)
    -> Result<Option<Participant>, SmartSplitError>;
    async fn delete_participant(&self, trip_id: &str, participant_id: &str) -> Result<(), SmartSplitError>;
    async fn get_trip_participants(&self, trip_id: &str) -> Result<Vec<Participant>, SmartSplitError>;

    async fn save_expense(&self, expense: ExpenseEntry) -> Result<(), SmartSplitError>;
    async fn get_expense(&self, trip_id: &str, expense_id: &str) -> Result<Option<ExpenseEntry>, SmartSplitError>;
    async fn delete_expense(&self, trip_id: &str, expense_id: &str) -> Result<(), SmartSplitError>;
    async fn get_trip_expenses(&self, trip_id: &str) -> Result<Vec<ExpenseEntry>, SmartSplitError>;

    async fn load_snapshot(&self, trip_id: &str) -> Result<Option<TripSnapshot>, SmartSplitError> {
        let Some(trip) = self.get_trip(trip_id).await? else {
            return Ok(None);
        };
        let participants = self.get_trip_participants(trip_id).await?;
        let expenses = self.get_trip_expenses(trip_id).await?;
        Ok(Some(TripSnapshot::new(trip, participants, expenses)))
    }
}

pub mod in_memory;
