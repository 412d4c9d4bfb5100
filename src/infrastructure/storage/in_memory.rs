use crate::core::errors::SmartSplitError;
use crate::core::models::{
    expense::ExpenseEntry,
    trip::{Participant, Trip},
    user::User,
};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    users: Arc<RwLock<HashMap<String, User>>>,
    users_by_email: Arc<RwLock<HashMap<String, String>>>,
    trips: Arc<RwLock<HashMap<String, Trip>>>,
    // per trip, in insertion order
    participants: Arc<RwLock<HashMap<String, Vec<Participant>>>>,
    expenses: Arc<RwLock<HashMap<String, Vec<ExpenseEntry>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user_if_not_exists(&self, user: User) -> Result<Option<User>, SmartSplitError> {
        let mut users_by_email = self.users_by_email.write().await;
        if users_by_email.contains_key(&user.email) {
            return Ok(None);
        }
        users_by_email.insert(user.email.clone(), user.id.clone());
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user.clone());
        Ok(Some(user))
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, SmartSplitError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, SmartSplitError> {
        let users_by_email = self.users_by_email.read().await;
        let users = self.users.read().await;
        Ok(users_by_email.get(email).and_then(|user_id| users.get(user_id).cloned()))
    }

    async fn save_trip(&self, trip: Trip) -> Result<(), SmartSplitError> {
        let mut trips = self.trips.write().await;
        trips.insert(trip.id.clone(), trip);
        Ok(())
    }

    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, SmartSplitError> {
        let trips = self.trips.read().await;
        Ok(trips.get(trip_id).cloned())
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<(), SmartSplitError> {
        let mut trips = self.trips.write().await;
        let mut participants = self.participants.write().await;
        let mut expenses = self.expenses.write().await;
        trips.remove(trip_id);
        participants.remove(trip_id);
        expenses.remove(trip_id);
        Ok(())
    }

    async fn get_user_trips(&self, owner_id: &str) -> Result<Vec<Trip>, SmartSplitError> {
        let trips = self.trips.read().await;
        let mut owned: Vec<Trip> = trips.values().filter(|t| t.owner_id == owner_id).cloned().collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn save_participant(&self, participant: Participant) -> Result<(), SmartSplitError> {
        let mut participants = self.participants.write().await;
        let trip_participants = participants.entry(participant.trip_id.clone()).or_default();
        match trip_participants.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => *existing = participant,
            None => trip_participants.push(participant),
        }
        Ok(())
    }

    async fn get_participant(
        &self,
        trip_id: &str,
        participant_id: &str,
    ) -> Result<Option<Participant>, SmartSplitError> {
        let participants = self.participants.read().await;
        Ok(participants
            .get(trip_id)
            .and_then(|list| list.iter().find(|p| p.id == participant_id).cloned()))
    }

    async fn delete_participant(&self, trip_id: &str, participant_id: &str) -> Result<(), SmartSplitError> {
        let mut participants = self.participants.write().await;
        if let Some(list) = participants.get_mut(trip_id) {
            list.retain(|p| p.id != participant_id);
        }
        Ok(())
    }

    async fn get_trip_participants(&self, trip_id: &str) -> Result<Vec<Participant>, SmartSplitError> {
        let participants = self.participants.read().await;
        Ok(participants.get(trip_id).cloned().unwrap_or_default())
    }

    async fn save_expense(&self, expense: ExpenseEntry) -> Result<(), SmartSplitError> {
        let mut expenses = self.expenses.write().await;
        let trip_expenses = expenses.entry(expense.trip_id.clone()).or_default();
        match trip_expenses.iter_mut().find(|e| e.id == expense.id) {
            Some(existing) => *existing = expense,
            None => trip_expenses.push(expense),
        }
        Ok(())
    }

    async fn get_expense(&self, trip_id: &str, expense_id: &str) -> Result<Option<ExpenseEntry>, SmartSplitError> {
        let expenses = self.expenses.read().await;
        Ok(expenses
            .get(trip_id)
            .and_then(|list| list.iter().find(|e| e.id == expense_id).cloned()))
    }

    async fn delete_expense(&self, trip_id: &str, expense_id: &str) -> Result<(), SmartSplitError> {
        let mut expenses = self.expenses.write().await;
        if let Some(list) = expenses.get_mut(trip_id) {
            list.retain(|e| e.id != expense_id);
        }
        Ok(())
    }

    async fn get_trip_expenses(&self, trip_id: &str) -> Result<Vec<ExpenseEntry>, SmartSplitError> {
        let expenses = self.expenses.read().await;
        Ok(expenses.get(trip_id).cloned().unwrap_or_default())
    }
}
