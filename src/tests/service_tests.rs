use rust_decimal_macros::dec;

use super::{TestService, create_test_service, day};
use crate::core::errors::SmartSplitError;
use crate::core::models::{
    change_log::{ChangeAction, ItemType},
    trip::{Participant, Trip},
    user::Identity,
};
use crate::core::services::{ExpenseDraft, ExpensePatch, TripDraft, TripPatch};

async fn register(service: &TestService, name: &str, email: &str) -> Identity {
    let user = service.register(name, email, "password123").await.unwrap();
    Identity { user_id: user.id }
}

/// Trip owned by Alice with participants Alice (owner), Bob and Carol.
async fn setup_trip(service: &TestService) -> (Identity, Trip, Vec<Participant>) {
    let alice = register(service, "Alice", "alice@example.com").await;
    let trip = service
        .create_trip(
            &alice,
            TripDraft {
                name: "Goa".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    service.add_participant(&alice, &trip.id, "Bob", None).await.unwrap();
    service.add_participant(&alice, &trip.id, "Carol", None).await.unwrap();
    let participants = service.trip_snapshot(&alice, &trip.id).await.unwrap().participants;
    (alice, trip, participants)
}

fn draft(amount: rust_decimal::Decimal, paid_by: &str, split: &[&Participant]) -> ExpenseDraft {
    ExpenseDraft {
        description: "Dinner".to_string(),
        amount,
        date: Some(day(1)),
        category: Some("Food".to_string()),
        paid_by: paid_by.to_string(),
        split_among: split.iter().map(|p| p.id.clone()).collect(),
        is_payment: false,
        weights: None,
    }
}

#[tokio::test]
async fn test_register_and_login() {
    let service = create_test_service();
    let user = service.register("Alice", "Alice@Example.com", "secret").await.unwrap();
    assert_eq!(user.email, "alice@example.com");
    assert_ne!(user.password, "secret");

    let (logged_in, token) = service.authenticate("alice@example.com", "secret").await.unwrap();
    assert_eq!(logged_in.id, user.id);
    assert_eq!(service.resolve_identity(&token).unwrap().user_id, user.id);

    assert_eq!(
        service.authenticate("alice@example.com", "wrong").await.unwrap_err(),
        SmartSplitError::InvalidCredentials
    );
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let service = create_test_service();
    service.register("Alice", "alice@example.com", "pw").await.unwrap();

    assert!(matches!(
        service.register("Alice 2", "alice@example.com", "pw").await,
        Err(SmartSplitError::EmailAlreadyRegistered(_))
    ));
    assert!(matches!(
        service.register("Bob", "not-an-email", "pw").await,
        Err(SmartSplitError::InvalidEmail(_))
    ));
    assert!(matches!(
        service.register("<script>", "bob@example.com", "pw").await,
        Err(SmartSplitError::InvalidInput(field, _)) if field == "name"
    ));
    assert!(matches!(
        service.register("Bob", "bob@example.com", "").await,
        Err(SmartSplitError::InvalidInput(field, _)) if field == "password"
    ));
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let service = create_test_service();
    assert!(matches!(
        service.resolve_identity("garbage"),
        Err(SmartSplitError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_create_trip_adds_owner_as_participant() {
    let service = create_test_service();
    let (alice, trip, participants) = setup_trip(&service).await;

    assert_eq!(trip.currency, "INR");
    assert_eq!(trip.icon.as_deref(), Some("plane"));
    assert_eq!(participants[0].name, "Alice");
    assert_eq!(participants.len(), 3);

    let trips = service.list_trips(&alice).await.unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].id, trip.id);
}

#[tokio::test]
async fn test_only_owner_can_touch_trip() {
    let service = create_test_service();
    let (_alice, trip, _) = setup_trip(&service).await;
    let mallory = register(&service, "Mallory", "mallory@example.com").await;

    assert!(matches!(
        service.update_trip(&mallory, &trip.id, TripPatch::default()).await,
        Err(SmartSplitError::NotTripOwner(_))
    ));
    assert!(matches!(
        service.balances(&mallory, &trip.id).await,
        Err(SmartSplitError::NotTripOwner(_))
    ));
    assert!(matches!(
        service.delete_trip(&mallory, "missing").await,
        Err(SmartSplitError::TripNotFound(_))
    ));
}

#[tokio::test]
async fn test_update_and_delete_trip() {
    let service = create_test_service();
    let (alice, trip, _) = setup_trip(&service).await;

    let updated = service
        .update_trip(
            &alice,
            &trip.id,
            TripPatch {
                name: Some("Goa 2024".to_string()),
                currency: Some("USD".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Goa 2024");
    assert_eq!(updated.currency, "USD");

    service.delete_trip(&alice, &trip.id).await.unwrap();
    assert!(service.list_trips(&alice).await.unwrap().is_empty());
    assert!(matches!(
        service.list_logs(&alice, &trip.id).await,
        Err(SmartSplitError::TripNotFound(_))
    ));
}

#[tokio::test]
async fn test_expense_flow_produces_expected_settlements() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    service
        .add_expense(&alice, &trip.id, draft(dec!(100), &p[0].id, &[&p[0], &p[1], &p[2]]), None)
        .await
        .unwrap();

    let balances = service.balances(&alice, &trip.id).await.unwrap();
    assert_eq!(balances.get(&p[0].id), dec!(66.67));
    assert_eq!(balances.get(&p[1].id), dec!(-33.33));
    assert_eq!(balances.get(&p[2].id), dec!(-33.34));

    let summary = service.settlements(&alice, &trip.id).await.unwrap();
    assert_eq!(summary.settlements.len(), 2);
    assert_eq!(summary.settlements[0].from_id, p[2].id);
    assert_eq!(summary.settlements[0].amount, dec!(33.34));

    let analytics = service.analytics(&alice, &trip.id).await.unwrap();
    assert_eq!(analytics.total_trip_cost, dec!(100));
}

#[tokio::test]
async fn test_invalid_expense_is_not_persisted() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    let mut bad = draft(dec!(10), "stranger", &[&p[0]]);
    assert!(matches!(
        service.add_expense(&alice, &trip.id, bad.clone(), None).await,
        Err(SmartSplitError::InvalidLedger(_))
    ));

    bad.paid_by = p[0].id.clone();
    bad.amount = dec!(10.001);
    assert!(matches!(
        service.add_expense(&alice, &trip.id, bad.clone(), None).await,
        Err(SmartSplitError::InvalidInput(field, _)) if field == "amount"
    ));

    bad.amount = dec!(0);
    assert!(matches!(
        service.add_expense(&alice, &trip.id, bad, None).await,
        Err(SmartSplitError::InvalidInput(_, _))
    ));

    let snapshot = service.trip_snapshot(&alice, &trip.id).await.unwrap();
    assert!(snapshot.expenses.is_empty());
    assert_eq!(service.list_logs(&alice, &trip.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_payment_gets_payment_category() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    let mut pay = draft(dec!(50), &p[1].id, &[&p[0]]);
    pay.is_payment = true;
    let entry = service.add_expense(&alice, &trip.id, pay, None).await.unwrap();
    assert_eq!(entry.category, "Payment");

    let summary = service.settlements(&alice, &trip.id).await.unwrap();
    assert_eq!(summary.settlements.len(), 1);
    assert_eq!(summary.settlements[0].from_id, p[1].id);
    assert_eq!(summary.settlements[0].to_id, p[0].id);
}

#[tokio::test]
async fn test_update_and_delete_expense_are_logged() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    let entry = service
        .add_expense(&alice, &trip.id, draft(dec!(30), &p[0].id, &[]), Some("Bob"))
        .await
        .unwrap();
    let updated = service
        .update_expense(
            &alice,
            &trip.id,
            &entry.id,
            ExpensePatch {
                amount: Some(dec!(45)),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, dec!(45));
    service.delete_expense(&alice, &trip.id, &entry.id, None).await.unwrap();

    let logs = service.list_logs(&alice, &trip.id).await.unwrap();
    let actions: Vec<ChangeAction> = logs.iter().map(|l| l.action).collect();
    assert_eq!(
        actions[..3],
        [ChangeAction::Delete, ChangeAction::Update, ChangeAction::Create]
    );
    assert_eq!(logs[2].actor_name, "Bob");
    assert_eq!(logs[1].actor_name, "Alice");
    assert_eq!(logs[1].previous_data.as_ref().unwrap()["amount"], "30");
    assert_eq!(logs[0].item_type, ItemType::Expense);
    assert!(logs[0].current_data.is_none());

    assert!(matches!(
        service.delete_expense(&alice, &trip.id, &entry.id, None).await,
        Err(SmartSplitError::ExpenseNotFound(_))
    ));
}

#[tokio::test]
async fn test_participant_in_use_cannot_be_removed() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    service
        .add_expense(&alice, &trip.id, draft(dec!(20), &p[0].id, &[&p[0], &p[1]]), None)
        .await
        .unwrap();

    assert!(matches!(
        service.remove_participant(&alice, &trip.id, &p[1].id, None).await,
        Err(SmartSplitError::ParticipantInUse(_))
    ));
    service.remove_participant(&alice, &trip.id, &p[2].id, None).await.unwrap();
    let snapshot = service.trip_snapshot(&alice, &trip.id).await.unwrap();
    assert_eq!(snapshot.participants.len(), 2);
}

#[tokio::test]
async fn test_trip_view_is_cached_and_invalidated() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    service
        .add_expense(&alice, &trip.id, draft(dec!(90), &p[1].id, &[]), None)
        .await
        .unwrap();
    let first = service.trip_view(&alice, &trip.id).await.unwrap();
    assert_eq!(first.user_share, dec!(30));
    assert_eq!(first.expenses.len(), 1);
    assert_eq!(first.grouped_expenses.len(), 1);
    assert_eq!(first.daily_balances.len(), 1);
    assert_eq!(first.logs.len(), 3);

    let again = service.trip_view(&alice, &trip.id).await.unwrap();
    assert_eq!(first, again);

    service
        .add_expense(&alice, &trip.id, draft(dec!(30), &p[0].id, &[&p[0]]), None)
        .await
        .unwrap();
    let fresh = service.trip_view(&alice, &trip.id).await.unwrap();
    assert_eq!(fresh.expenses.len(), 2);
    assert_eq!(fresh.user_share, dec!(60));
}

#[tokio::test]
async fn test_revert_log_undoes_each_kind_of_change() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    let entry = service
        .add_expense(&alice, &trip.id, draft(dec!(30), &p[0].id, &[]), None)
        .await
        .unwrap();
    service
        .update_expense(
            &alice,
            &trip.id,
            &entry.id,
            ExpensePatch {
                description: Some("Lunch".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    // undo the update
    let update_log = service.list_logs(&alice, &trip.id).await.unwrap()[0].clone();
    let revert = service.revert_log(&alice, &update_log.id).await.unwrap();
    assert_eq!(revert.action, ChangeAction::Revert);
    let snapshot = service.trip_snapshot(&alice, &trip.id).await.unwrap();
    assert_eq!(snapshot.expenses[0].description, "Dinner");

    // the reverted entry is gone, the revert itself is recorded
    let logs = service.list_logs(&alice, &trip.id).await.unwrap();
    assert!(logs.iter().all(|l| l.id != update_log.id));
    assert_eq!(logs[0].action, ChangeAction::Revert);
    assert!(matches!(
        service.revert_log(&alice, &logs[0].id).await,
        Err(SmartSplitError::InvalidInput(_, _))
    ));

    // undo a delete
    service.delete_expense(&alice, &trip.id, &entry.id, None).await.unwrap();
    let delete_log = service.list_logs(&alice, &trip.id).await.unwrap()[0].clone();
    service.revert_log(&alice, &delete_log.id).await.unwrap();
    let snapshot = service.trip_snapshot(&alice, &trip.id).await.unwrap();
    assert_eq!(snapshot.expenses.len(), 1);

    assert!(matches!(
        service.revert_log(&alice, "missing").await,
        Err(SmartSplitError::ChangeLogNotFound(_))
    ));
}

#[tokio::test]
async fn test_revert_all_restores_initial_state() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    let dave = service.add_participant(&alice, &trip.id, "Dave", None).await.unwrap();
    service
        .add_expense(&alice, &trip.id, draft(dec!(40), &dave.id, &[&dave, &p[0]]), None)
        .await
        .unwrap();
    service
        .add_expense(&alice, &trip.id, draft(dec!(12), &p[1].id, &[]), None)
        .await
        .unwrap();

    // Bob, Carol, Dave, two expenses
    let reverted = service.revert_all(&alice, &trip.id).await.unwrap();
    assert_eq!(reverted, 5);

    let snapshot = service.trip_snapshot(&alice, &trip.id).await.unwrap();
    assert!(snapshot.expenses.is_empty());
    assert_eq!(snapshot.participants.len(), 1);
    assert_eq!(snapshot.participants[0].name, "Alice");

    let logs = service.list_logs(&alice, &trip.id).await.unwrap();
    assert_eq!(logs.len(), 5);
    assert!(logs.iter().all(|l| l.action == ChangeAction::Revert));
    assert_eq!(service.revert_all(&alice, &trip.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_user_stats_count_expenses_only() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    service
        .add_expense(&alice, &trip.id, draft(dec!(25.50), &p[0].id, &[]), None)
        .await
        .unwrap();
    let mut pay = draft(dec!(5), &p[1].id, &[&p[0]]);
    pay.is_payment = true;
    service.add_expense(&alice, &trip.id, pay, None).await.unwrap();

    let stats = service.user_stats(&alice).await.unwrap();
    assert_eq!(stats.trip_count, 1);
    assert_eq!(stats.total_tracked, dec!(25.50));
}

#[tokio::test]
async fn test_concurrent_writes_to_one_trip_all_land() {
    let service = std::sync::Arc::new(create_test_service());
    let (alice, trip, p) = setup_trip(&service).await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let service = service.clone();
        let alice = alice.clone();
        let trip_id = trip.id.clone();
        let payer = p[i % 3].id.clone();
        handles.push(tokio::spawn(async move {
            let mut d = draft(dec!(10), &payer, &[]);
            d.description = format!("Round {}", i);
            service.add_expense(&alice, &trip_id, d, None).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = service.trip_snapshot(&alice, &trip.id).await.unwrap();
    assert_eq!(snapshot.expenses.len(), 10);
    let balances = service.balances(&alice, &trip.id).await.unwrap();
    assert_eq!(balances.sum(), dec!(0));
}

#[tokio::test]
async fn test_everyone_split_is_fixed_at_creation() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    let entry = service
        .add_expense(&alice, &trip.id, draft(dec!(90), &p[0].id, &[]), None)
        .await
        .unwrap();
    let everyone: Vec<String> = p.iter().map(|x| x.id.clone()).collect();
    assert_eq!(entry.split_among, everyone);
    let before = service.balances(&alice, &trip.id).await.unwrap();

    let dave = service.add_participant(&alice, &trip.id, "Dave", None).await.unwrap();
    let after = service.balances(&alice, &trip.id).await.unwrap();
    assert_eq!(after.get(&p[0].id), dec!(60));
    assert_eq!(after.get(&p[1].id), before.get(&p[1].id));
    assert_eq!(after.get(&dave.id), dec!(0));

    assert!(matches!(
        service.remove_participant(&alice, &trip.id, &p[1].id, None).await,
        Err(SmartSplitError::ParticipantInUse(_))
    ));
    service.remove_participant(&alice, &trip.id, &dave.id, None).await.unwrap();
}

#[tokio::test]
async fn test_emptied_split_on_update_means_current_members() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    let entry = service
        .add_expense(&alice, &trip.id, draft(dec!(30), &p[0].id, &[&p[0]]), None)
        .await
        .unwrap();
    let updated = service
        .update_expense(
            &alice,
            &trip.id,
            &entry.id,
            ExpensePatch {
                split_among: Some(Vec::new()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated.split_among.len(), 3);
}

#[tokio::test]
async fn test_rename_participant_is_logged_and_revertible() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    let renamed = service
        .update_participant(&alice, &trip.id, &p[1].id, "  Robert ", Some("Carol"))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Robert");
    assert_eq!(renamed.id, p[1].id);

    let log = service.list_logs(&alice, &trip.id).await.unwrap()[0].clone();
    assert_eq!(log.action, ChangeAction::Update);
    assert_eq!(log.item_type, ItemType::Participant);
    assert_eq!(log.actor_name, "Carol");

    let view = service.trip_view(&alice, &trip.id).await.unwrap();
    assert_eq!(view.participants[1].name, "Robert");

    service.revert_log(&alice, &log.id).await.unwrap();
    let snapshot = service.trip_snapshot(&alice, &trip.id).await.unwrap();
    assert_eq!(snapshot.participants[1].name, "Bob");
    let view = service.trip_view(&alice, &trip.id).await.unwrap();
    assert_eq!(view.participants[1].name, "Bob");

    assert!(matches!(
        service.update_participant(&alice, &trip.id, &p[1].id, "   ", None).await,
        Err(SmartSplitError::InvalidInput(field, _)) if field == "name"
    ));
    assert!(matches!(
        service.update_participant(&alice, &trip.id, "missing", "Zed", None).await,
        Err(SmartSplitError::ParticipantNotFound(_))
    ));
}

#[tokio::test]
async fn test_failed_revert_all_changes_nothing() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    let dave = service.add_participant(&alice, &trip.id, "Dave", None).await.unwrap();
    let add_dave_log = service.list_logs(&alice, &trip.id).await.unwrap()[0].clone();
    let shared = service
        .add_expense(&alice, &trip.id, draft(dec!(40), &p[0].id, &[&p[0], &dave]), None)
        .await
        .unwrap();
    service.delete_expense(&alice, &trip.id, &shared.id, None).await.unwrap();
    // Dave goes away while the deleted expense still names him
    service.revert_log(&alice, &add_dave_log.id).await.unwrap();
    let later = service
        .add_expense(&alice, &trip.id, draft(dec!(10), &p[0].id, &[&p[0]]), None)
        .await
        .unwrap();

    let logs_before = service.list_logs(&alice, &trip.id).await.unwrap();
    assert!(matches!(
        service.revert_all(&alice, &trip.id).await,
        Err(SmartSplitError::InvalidLedger(_))
    ));

    let snapshot = service.trip_snapshot(&alice, &trip.id).await.unwrap();
    assert_eq!(snapshot.expenses.len(), 1);
    assert_eq!(snapshot.expenses[0].id, later.id);
    assert_eq!(snapshot.participants.len(), 3);
    assert_eq!(service.list_logs(&alice, &trip.id).await.unwrap(), logs_before);
}

#[tokio::test]
async fn test_locks_are_not_created_for_unknown_trips() {
    let service = create_test_service();
    let (alice, trip, p) = setup_trip(&service).await;

    for i in 0..20 {
        let trip_id = format!("missing-{}", i);
        assert!(matches!(
            service.add_expense(&alice, &trip_id, draft(dec!(5), &p[0].id, &[]), None).await,
            Err(SmartSplitError::TripNotFound(_))
        ));
        assert!(matches!(
            service.revert_all(&alice, &trip_id).await,
            Err(SmartSplitError::TripNotFound(_))
        ));
    }
    assert!(service.tracked_trip_locks().await <= 1);

    service.delete_trip(&alice, &trip.id).await.unwrap();
    let other = service
        .create_trip(
            &alice,
            TripDraft {
                name: "Other".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    service.add_participant(&alice, &other.id, "Eve", None).await.unwrap();
    // idle entries are dropped on the next acquisition
    assert!(service.tracked_trip_locks().await <= 1);
}

#[tokio::test]
async fn test_trip_view_never_caches_stale_data_under_concurrent_writes() {
    let service = std::sync::Arc::new(create_test_service());
    let (alice, trip, p) = setup_trip(&service).await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let writer = service.clone();
        let reader = service.clone();
        let (alice_w, alice_r) = (alice.clone(), alice.clone());
        let (trip_w, trip_r) = (trip.id.clone(), trip.id.clone());
        let payer = p[i % 3].id.clone();
        handles.push(tokio::spawn(async move {
            writer
                .add_expense(&alice_w, &trip_w, draft(dec!(3), &payer, &[]), None)
                .await
                .map(|_| ())
        }));
        handles.push(tokio::spawn(async move { reader.trip_view(&alice_r, &trip_r).await.map(|_| ()) }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let view = service.trip_view(&alice, &trip.id).await.unwrap();
    assert_eq!(view.expenses.len(), 10);
    assert_eq!(view.analytics_data.total_trip_cost, dec!(30));
}
