//! Guest-to-authenticated migration
//!
//! One-shot copy of the local snapshot (profile, progress, notifications)
//! into the remote store, run the first time a session is authenticated with
//! no remote profile. The profile itself must succeed; secondary records are
//! best effort. Local data is cleared only after the remote profile exists,
//! so a failed migration never loses anything: the local store remains the
//! sole source of truth until the hand-off completes.

use crate::error::StoreResult;
use crate::models::{CreateProfileInput, UserProfile};
use crate::profile_store::AuthSession;
use crate::store::{LocalStore, PersistenceAdapter, RemoteStore};

pub async fn migrate_to_remote(
    local: &LocalStore,
    remote: &RemoteStore,
    session: &AuthSession,
) -> StoreResult<UserProfile> {
    let snapshot = local.load_profile().await?;
    let progress = local.list_progress().await?;
    let notifications = local.list_notifications().await?;

    tracing::info!(
        user_id = %session.user_id,
        has_profile = snapshot.is_some(),
        progress = progress.len(),
        notifications = notifications.len(),
        "Migrating guest data to remote store"
    );

    let seed = match &snapshot {
        Some(profile) => CreateProfileInput {
            id: Some(session.user_id.clone()),
            email: session.email.clone().or_else(|| profile.email.clone()),
            plan_type: Some(profile.plan_type),
            days_clean: Some(profile.days_clean),
            money_saved: Some(profile.money_saved),
            time_saved: Some(profile.time_saved),
            daily_bet_average: Some(profile.daily_bet_average),
            points: Some(profile.points),
            last_daily_notification_day: Some(profile.last_daily_notification_day),
            last_daily_check_date: Some(
                profile
                    .last_daily_check_date
                    .unwrap_or_else(|| chrono::Local::now().date_naive()),
            ),
        },
        None => CreateProfileInput {
            id: Some(session.user_id.clone()),
            email: session.email.clone(),
            last_daily_check_date: Some(chrono::Local::now().date_naive()),
            ..Default::default()
        },
    };

    // Must succeed; on failure the local store is left untouched and the
    // caller keeps serving it.
    let profile = remote.create_profile(seed).await?;

    for entry in &progress {
        if let Err(e) = remote
            .upsert_progress(entry.lesson_day, entry.challenge_completed)
            .await
        {
            tracing::warn!(lesson_day = entry.lesson_day, error = %e, "Skipping progress entry");
        }
    }
    // Local lists are newest-first; replay oldest-first so remote ids keep
    // the same ordering.
    for n in notifications.iter().rev() {
        if let Err(e) = remote.insert_notification(&n.title, &n.message, n.kind).await {
            tracing::warn!(id = %n.id, error = %e, "Skipping notification");
        }
    }

    if let Err(e) = local.clear() {
        tracing::warn!(error = %e, "Failed to clear local store after migration");
    }

    tracing::info!(user_id = %session.user_id, "Migration complete");
    Ok(profile)
}
