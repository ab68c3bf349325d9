//! Tests for the guest-to-authenticated migration

use std::sync::Arc;

use quitbet_core::error::StoreError;
use quitbet_core::migration::migrate_to_remote;
use quitbet_core::models::{CreateProfileInput, NotificationKind, StoreOrigin};
use quitbet_core::store::{LocalStore, PersistenceAdapter, RemoteStore};
use quitbet_core::{AuthSession, ProfileStore};

fn session() -> AuthSession {
    AuthSession {
        user_id: "user-1".into(),
        email: Some("user@example.com".into()),
    }
}

async fn populated_local() -> LocalStore {
    let local = LocalStore::in_memory();
    local
        .create_profile(CreateProfileInput {
            days_clean: Some(5),
            money_saved: Some(250.0),
            time_saved: Some(300),
            daily_bet_average: Some(50.0),
            points: Some(80),
            last_daily_notification_day: Some(5),
            ..Default::default()
        })
        .await
        .unwrap();
    for d in 1..=5 {
        local.upsert_progress(d, true).await.unwrap();
    }
    local
        .insert_notification("older", "first inserted", NotificationKind::Motivation)
        .await
        .unwrap();
    local
        .insert_notification("newer", "second inserted", NotificationKind::Achievement)
        .await
        .unwrap();
    local
}

#[tokio::test]
async fn migrates_full_snapshot_and_clears_local() {
    let local = populated_local().await;
    let remote = RemoteStore::open_in_memory("user-1").unwrap();

    let profile = migrate_to_remote(&local, &remote, &session()).await.unwrap();

    assert_eq!(profile.id.as_deref(), Some("user-1"));
    assert_eq!(profile.email.as_deref(), Some("user@example.com"));
    assert_eq!(profile.days_clean, 5);
    assert_eq!(profile.money_saved, 250.0);
    assert!(profile.last_daily_check_date.is_some());

    // Secondary records copied, notification order preserved
    assert_eq!(remote.list_progress().await.unwrap().len(), 5);
    let notifications = remote.list_notifications().await.unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].title, "newer");
    assert_eq!(notifications[1].title, "older");
    assert_eq!(notifications[0].id.origin(), StoreOrigin::Remote);

    // Local is fully handed off
    assert!(local.is_empty());
    assert!(local.list_progress().await.unwrap().is_empty());
}

/// If the remote profile cannot be created, nothing local is touched.
#[tokio::test]
async fn failed_migration_leaves_local_untouched() {
    let local = populated_local().await;
    let remote = RemoteStore::open_in_memory("user-1").unwrap();
    remote.set_offline(true);

    let result = migrate_to_remote(&local, &remote, &session()).await;
    assert!(matches!(result, Err(StoreError::Unavailable(_))));

    let profile = local.load_profile().await.unwrap().unwrap();
    assert_eq!(profile.days_clean, 5);
    assert_eq!(local.list_progress().await.unwrap().len(), 5);
    assert_eq!(local.list_notifications().await.unwrap().len(), 2);
}

/// A second migration for the same identity is a conflict.
#[tokio::test]
async fn migration_runs_exactly_once() {
    let local = populated_local().await;
    let remote = RemoteStore::open_in_memory("user-1").unwrap();

    migrate_to_remote(&local, &remote, &session()).await.unwrap();
    let again = migrate_to_remote(&local, &remote, &session()).await;
    assert!(matches!(again, Err(StoreError::Conflict(_))));
}

/// No local snapshot: the remote profile is synthesized from defaults with
/// the check date set to today.
#[tokio::test]
async fn migrates_defaults_when_local_empty() {
    let local = LocalStore::in_memory();
    let remote = RemoteStore::open_in_memory("user-1").unwrap();

    let profile = migrate_to_remote(&local, &remote, &session()).await.unwrap();
    assert_eq!(profile.days_clean, 0);
    assert_eq!(profile.daily_bet_average, 0.0);
    assert_eq!(
        profile.last_daily_check_date,
        Some(chrono::Local::now().date_naive())
    );
}

/// Scenario D end to end: initialize for an authenticated session with no
/// remote profile and a populated local snapshot.
#[tokio::test]
async fn initialize_triggers_migration() {
    let local = Arc::new(populated_local().await);
    let remote = Arc::new(RemoteStore::open_in_memory("user-1").unwrap());

    let store = ProfileStore::initialize_authenticated(local.clone(), remote.clone(), session())
        .await
        .unwrap();

    assert_eq!(store.origin(), StoreOrigin::Remote);
    assert_eq!(store.profile().days_clean, 5);
    assert!(local.is_empty());
    assert_eq!(remote.load_profile().await.unwrap().unwrap().days_clean, 5);
}

/// An existing remote profile means no migration and no local wipe.
#[tokio::test]
async fn initialize_skips_migration_when_remote_exists() {
    let local = Arc::new(populated_local().await);
    let remote = Arc::new(RemoteStore::open_in_memory("user-1").unwrap());
    remote
        .create_profile(CreateProfileInput {
            days_clean: Some(12),
            ..Default::default()
        })
        .await
        .unwrap();

    let store = ProfileStore::initialize_authenticated(local.clone(), remote, session())
        .await
        .unwrap();

    assert_eq!(store.profile().days_clean, 12);
    assert!(!local.is_empty());
}
