//! Daily progression engine
//!
//! Runs once per app activation as a stateless function of the current
//! profile and "today". `last_daily_check_date` makes it idempotent under
//! repeated runs within a day, and `last_daily_notification_day` keeps
//! notifications from firing twice for the same streak value. The whole
//! sequence executes under the profile store's write gate so it cannot
//! interleave with lesson or challenge writes.

use chrono::NaiveDate;

use crate::error::StoreResult;
use crate::models::{Notification, ProfilePatch};
use crate::notify;
use crate::profile_store::ProfileStore;

/// What one daily run did.
#[derive(Debug, Clone)]
pub struct DailyOutcome {
    /// Whether the streak advanced.
    pub advanced: bool,
    pub days_clean: u32,
    /// Notifications emitted by this run, in insertion order.
    pub notifications: Vec<Notification>,
}

impl DailyOutcome {
    fn unchanged(days_clean: u32) -> Self {
        Self {
            advanced: false,
            days_clean,
            notifications: Vec::new(),
        }
    }
}

/// Run the daily check against `today` (device-local calendar date).
pub async fn run_daily_check(store: &ProfileStore, today: NaiveDate) -> StoreResult<DailyOutcome> {
    let _gate = store.begin_write().await;

    let profile = store.profile();

    // Guard: at most one completed run per calendar day.
    if let Some(last) = profile.last_daily_check_date {
        if today <= last {
            tracing::debug!(%today, %last, "Daily check already ran");
            return Ok(DailyOutcome::unchanged(profile.days_clean));
        }
    }

    // Evaluate: the next streak day unlocks only when its lesson exists and
    // its challenge is done.
    let next_day = profile.days_clean + 1;
    let day_complete = store
        .progress_entry(next_day)
        .await?
        .map(|e| e.challenge_completed)
        .unwrap_or(false);

    let mut emitted = Vec::new();
    let advanced;

    let profile = if day_complete {
        advanced = true;
        let money_saved = profile.money_saved + profile.daily_bet_average;
        let updated = store
            .update_profile_locked(ProfilePatch {
                days_clean: Some(next_day),
                money_saved: Some(money_saved),
                time_saved: Some(profile.time_saved + 60),
                last_daily_check_date: Some(today),
                ..Default::default()
            })
            .await?;
        tracing::info!(days_clean = next_day, "Streak advanced");

        if let Some(payload) = notify::milestone_for_savings(money_saved, profile.daily_bet_average)
        {
            emitted.push(store.insert_notification_locked(&payload).await?);
        }
        updated
    } else {
        advanced = false;
        store
            .update_profile_locked(ProfilePatch {
                last_daily_check_date: Some(today),
                ..Default::default()
            })
            .await?
    };

    // Notify: fires for the (possibly new) streak value exactly once,
    // whether or not this particular run advanced it.
    if profile.days_clean > profile.last_daily_notification_day {
        if let Some(payload) = notify::achievement_for_day(profile.days_clean) {
            emitted.push(store.insert_notification_locked(&payload).await?);
        }
        emitted.push(
            store
                .insert_notification_locked(&notify::daily_reminder(profile.days_clean))
                .await?,
        );
        store
            .update_profile_locked(ProfilePatch {
                last_daily_notification_day: Some(profile.days_clean),
                ..Default::default()
            })
            .await?;
    }

    Ok(DailyOutcome {
        advanced,
        days_clean: profile.days_clean,
        notifications: emitted,
    })
}
