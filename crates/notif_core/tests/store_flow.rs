use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use notif_core::{
    center::{ManualClock, NotificationCenter},
    memory::InMemoryNotificationCenter,
    model::{AuthorizationStatus, NotificationDraft},
    projection::{self, TimeFormat},
    trigger::{CalendarTrigger, DateComponents},
    NotificationError, NotificationStore,
};
use tempfile::tempdir;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 11, 7)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

struct Fixture {
    clock: Arc<ManualClock>,
    center: Arc<InMemoryNotificationCenter>,
    store: NotificationStore,
}

fn fixture() -> Fixture {
    let clock = Arc::new(ManualClock::new(start()));
    let center = Arc::new(InMemoryNotificationCenter::new(clock.clone()));
    let store = NotificationStore::builder(center.clone())
        .with_clock(clock.clone())
        .build()
        .expect("build store");
    Fixture {
        clock,
        center,
        store,
    }
}

fn titles(store: &NotificationStore) -> Vec<String> {
    store
        .notifications()
        .into_iter()
        .map(|request| request.title)
        .collect()
}

fn schedule(store: &NotificationStore, title: &str, hours_ahead: i64) -> String {
    store
        .create(NotificationDraft::at(
            title,
            format!("{title} body"),
            start() + Duration::hours(hours_ahead),
        ))
        .expect("create notification")
        .identifier
}

#[test]
fn listing_is_empty_until_authorized() {
    let fx = fixture();
    assert_eq!(fx.store.authorization_status(), AuthorizationStatus::NotDetermined);
    assert!(fx.store.list_pending().is_empty());

    assert!(matches!(
        fx.store.create(NotificationDraft::at("Gym", "", start() + Duration::hours(1))),
        Err(NotificationError::NotAuthorized)
    ));

    assert_eq!(
        fx.store.request_authorization().expect("prompt"),
        AuthorizationStatus::Authorized
    );
    schedule(&fx.store, "Gym", 1);
    assert_eq!(fx.store.list_pending().len(), 1);

    fx.center.set_authorization(AuthorizationStatus::Denied);
    assert!(fx.store.list_pending().is_empty());
    assert_eq!(fx.store.authorization_status(), AuthorizationStatus::Denied);
}

#[test]
fn create_registers_and_reloads() {
    let fx = fixture();
    fx.store.request_authorization().expect("prompt");

    let id = schedule(&fx.store, "Gym", 2);
    let cached = fx.store.notifications();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].identifier, id);
    assert_eq!(cached[0].body, "Gym body");
    assert_eq!(
        cached[0].next_trigger_date(start()),
        Some(start() + Duration::hours(2))
    );
    assert_eq!(fx.center.pending_requests().len(), 1);
}

#[test]
fn create_with_past_date_is_rejected() {
    let fx = fixture();
    fx.store.request_authorization().expect("prompt");
    let result = fx
        .store
        .create(NotificationDraft::at("Yesterday", "", start() - Duration::days(1)));
    assert!(matches!(result, Err(NotificationError::PastTrigger { .. })));
    assert!(fx.center.pending_requests().is_empty());

    // the authority refuses it too, even when handed over directly
    let stale = notif_core::model::NotificationRequest::new(
        "stale",
        "Yesterday",
        "",
        CalendarTrigger::once(DateComponents::from_datetime(start() - Duration::days(1))),
    );
    assert!(matches!(
        fx.center.add(stale),
        Err(NotificationError::PastTrigger { .. })
    ));
}

#[test]
fn limit_exceeded_is_surfaced() {
    let clock = Arc::new(ManualClock::new(start()));
    let center = Arc::new(InMemoryNotificationCenter::new(clock.clone()).with_pending_limit(1));
    let store = NotificationStore::builder(center)
        .with_clock(clock)
        .build()
        .expect("build store");
    store.request_authorization().expect("prompt");

    schedule(&store, "First", 1);
    assert!(matches!(
        store.create(NotificationDraft::at("Second", "", start() + Duration::hours(2))),
        Err(NotificationError::LimitExceeded { limit: 1 })
    ));
    assert_eq!(store.notifications().len(), 1);
}

#[test]
fn delete_removes_exactly_the_present_identifiers() {
    let fx = fixture();
    fx.store.request_authorization().expect("prompt");
    let gym = schedule(&fx.store, "Gym", 1);
    schedule(&fx.store, "Dentist", 2);
    let rent = schedule(&fx.store, "Rent", 3);

    let removed = fx
        .store
        .delete([gym.clone(), rent.clone(), "missing".to_string()]);
    assert_eq!(removed, 2);
    assert_eq!(titles(&fx.store), vec!["Dentist"]);
    assert_eq!(fx.store.list_pending().len(), 1);

    assert_eq!(fx.store.delete(["missing"]), 0);
    assert_eq!(fx.store.delete(Vec::<String>::new()), 0);
    assert_eq!(titles(&fx.store), vec!["Dentist"]);
}

#[test]
fn reorder_survives_reload() {
    let fx = fixture();
    fx.store.request_authorization().expect("prompt");
    schedule(&fx.store, "A", 1);
    schedule(&fx.store, "B", 2);
    schedule(&fx.store, "C", 3);

    fx.store.reorder(&BTreeSet::from([2]), 0);
    assert_eq!(titles(&fx.store), vec!["C", "A", "B"]);

    fx.store.list_pending();
    assert_eq!(titles(&fx.store), vec!["C", "A", "B"]);

    // new requests land at the end of the user's order
    schedule(&fx.store, "D", 4);
    assert_eq!(titles(&fx.store), vec!["C", "A", "B", "D"]);
}

#[test]
fn journal_restores_order_after_rebuild() {
    let temp = tempdir().expect("tempdir");
    let journal_path = temp.path().join("order.json");
    let clock = Arc::new(ManualClock::new(start()));
    let center = Arc::new(InMemoryNotificationCenter::new(clock.clone()));

    {
        let store = NotificationStore::builder(center.clone())
            .with_clock(clock.clone())
            .with_order_journal(&journal_path)
            .build()
            .expect("build store");
        store.request_authorization().expect("prompt");
        schedule(&store, "A", 1);
        schedule(&store, "B", 2);
        store.reorder(&BTreeSet::from([0]), 2);
        assert_eq!(titles(&store), vec!["B", "A"]);
    }

    let rebuilt = NotificationStore::builder(center)
        .with_clock(clock)
        .with_order_journal(&journal_path)
        .build()
        .expect("rebuild store");
    rebuilt.list_pending();
    assert_eq!(titles(&rebuilt), vec!["B", "A"]);
}

#[test]
fn delivered_one_shot_shows_fallback_then_disappears() {
    let fx = fixture();
    fx.store.request_authorization().expect("prompt");
    schedule(&fx.store, "Gym", 1);

    fx.clock.advance(Duration::hours(2));
    let cached = fx.store.notifications();
    assert_eq!(
        projection::display_time(&cached[0], fx.store.now(), &TimeFormat::default()),
        projection::DEFAULT_FALLBACK_LABEL
    );

    assert_eq!(fx.center.deliver_due().len(), 1);
    assert!(fx.store.list_pending().is_empty());
}

#[test]
fn subscribers_observe_every_mutation() {
    let fx = fixture();
    let mut subscription = fx.store.subscribe();
    assert!(subscription.next_change().is_none());

    fx.store.request_authorization().expect("prompt");
    let change = subscription.next_change().expect("authorization change");
    assert_eq!(change.authorization, AuthorizationStatus::Authorized);

    schedule(&fx.store, "Gym", 1);
    let change = subscription.next_change().expect("reload after create");
    assert_eq!(change.notifications.len(), 1);
    assert!(subscription.next_change().is_none());

    // refreshing an unchanged status publishes nothing
    fx.store.refresh_authorization_status();
    assert!(subscription.next_change().is_none());

    let revision = subscription.current().revision;
    fx.store.delete(["missing"]);
    assert!(subscription.next_change().expect("delete publishes").revision > revision);
}

#[test]
fn malformed_journal_does_not_block_startup() {
    let temp = tempdir().expect("tempdir");
    let journal_path = temp.path().join("order.json");
    std::fs::write(&journal_path, "not json").expect("write fixture");

    let clock = Arc::new(ManualClock::new(start()));
    let center = Arc::new(InMemoryNotificationCenter::new(clock.clone()));
    let store = NotificationStore::builder(center)
        .with_clock(clock)
        .with_order_journal(&journal_path)
        .build()
        .expect("malformed journal is discarded");
    store.request_authorization().expect("prompt");

    schedule(&store, "A", 1);
    schedule(&store, "B", 2);
    assert_eq!(titles(&store), vec!["A", "B"]);

    // the next write replaces the broken file
    store.reorder(&BTreeSet::from([1]), 0);
    let raw = std::fs::read_to_string(&journal_path).expect("journal rewritten");
    assert!(raw.contains("\"order\""));
}

#[test]
fn unwritable_journal_never_fails_reorder_or_delete() {
    let temp = tempdir().expect("tempdir");
    let blocker = temp.path().join("state");
    let journal_path = blocker.join("order.json");

    let clock = Arc::new(ManualClock::new(start()));
    let center = Arc::new(InMemoryNotificationCenter::new(clock.clone()));
    let store = NotificationStore::builder(center)
        .with_clock(clock)
        .with_order_journal(&journal_path)
        .build()
        .expect("build store");
    store.request_authorization().expect("prompt");
    let a = schedule(&store, "A", 1);
    schedule(&store, "B", 2);
    schedule(&store, "C", 3);

    // the journal's parent directory is now a regular file
    std::fs::write(&blocker, "in the way").expect("write blocker");

    store.reorder(&BTreeSet::from([2]), 0);
    assert_eq!(titles(&store), vec!["C", "A", "B"]);

    assert_eq!(store.delete([a]), 1);
    assert_eq!(titles(&store), vec!["C", "B"]);
    assert!(!journal_path.exists());

    store.list_pending();
    assert_eq!(titles(&store), vec!["C", "B"]);
}
