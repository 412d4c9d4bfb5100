mod analytics_tests;
mod property_tests;
mod service_tests;
mod settlement_tests;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::core::models::{
    expense::ExpenseEntry,
    trip::{Participant, Trip, TripSnapshot, TripType},
};
use crate::core::services::SmartSplitService;
use crate::infrastructure::cache::in_memory::InMemoryCache;
use crate::infrastructure::logging::in_memory::InMemoryChangeLog;
use crate::infrastructure::storage::in_memory::InMemoryStorage;

pub const TRIP_ID: &str = "trip-1";

pub type TestService = SmartSplitService<InMemoryChangeLog, InMemoryStorage, InMemoryCache>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn create_test_service() -> TestService {
    init_tracing();
    let storage = InMemoryStorage::new();
    let logging = InMemoryChangeLog::new();
    let cache = InMemoryCache::new();
    SmartSplitService::new(storage, logging, cache, "test-secret".to_string(), 60).with_password_cost(4)
}

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, d, 12, 0, 0).unwrap()
}

pub fn trip() -> Trip {
    Trip {
        id: TRIP_ID.to_string(),
        name: "Goa".to_string(),
        owner_id: "user-1".to_string(),
        created_at: day(1),
        icon: Some("plane".to_string()),
        custom_image: None,
        trip_type: TripType::Trip,
        currency: "INR".to_string(),
    }
}

pub fn participant(id: &str, name: &str) -> Participant {
    Participant {
        id: id.to_string(),
        trip_id: TRIP_ID.to_string(),
        name: name.to_string(),
    }
}

pub fn expense(id: &str, amount: Decimal, paid_by: &str, split: &[&str]) -> ExpenseEntry {
    ExpenseEntry {
        id: id.to_string(),
        trip_id: TRIP_ID.to_string(),
        description: format!("Expense {}", id),
        amount,
        date: day(1),
        category: "Food".to_string(),
        paid_by: paid_by.to_string(),
        split_among: split.iter().map(|s| s.to_string()).collect(),
        is_payment: false,
        weights: None,
    }
}

pub fn payment(id: &str, amount: Decimal, from: &str, to: &str) -> ExpenseEntry {
    ExpenseEntry {
        id: id.to_string(),
        trip_id: TRIP_ID.to_string(),
        description: format!("Payment {}", id),
        amount,
        date: day(1),
        category: "Payment".to_string(),
        paid_by: from.to_string(),
        split_among: vec![to.to_string()],
        is_payment: true,
        weights: None,
    }
}

pub fn on(mut entry: ExpenseEntry, d: u32) -> ExpenseEntry {
    entry.date = day(d);
    entry
}

pub fn in_category(mut entry: ExpenseEntry, category: &str) -> ExpenseEntry {
    entry.category = category.to_string();
    entry
}

/// Participants A, B and C plus the given entries.
pub fn abc_snapshot(entries: Vec<ExpenseEntry>) -> TripSnapshot {
    TripSnapshot::new(
        trip(),
        vec![participant("A", "Alice"), participant("B", "Bob"), participant("C", "Carol")],
        entries,
    )
}
