//! Profile store
//!
//! Single entry point consumers use. Selects the persistence adapter once at
//! initialization (local for guests, remote for authenticated sessions) and
//! hides it behind one read/write surface. Reads survive a dead remote by
//! falling back to the last-known local snapshot; writes surface failures to
//! the caller and are never retried here.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{StoreError, StoreResult};
use crate::migration;
use crate::models::{
    CreateProfileInput, Notification, NotificationId, ProfilePatch, ProgressEntry, StoreOrigin,
    UserData, UserProfile,
};
use crate::notify::NotificationPayload;
use crate::store::{LocalStore, PersistenceAdapter, RemoteStore};

/// Bound on every remote adapter call; expiry is treated as `Unavailable`.
const REMOTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Points awarded the first time a lesson is completed.
const LESSON_POINTS: u32 = 10;
/// Points awarded the first time a challenge is completed.
const CHALLENGE_POINTS: u32 = 20;

/// Identity of a signed-in session. Guests have none.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub email: Option<String>,
}

pub struct ProfileStore {
    local: Arc<LocalStore>,
    active: Arc<dyn PersistenceAdapter>,
    origin: StoreOrigin,
    /// In-memory authoritative copy, replaced atomically after each write.
    cache: RwLock<UserProfile>,
    notification_cache: RwLock<Vec<Notification>>,
    /// Single in-flight mutation at a time per identity.
    write_gate: Mutex<()>,
}

impl ProfileStore {
    /// Build the store for a guest session over the local adapter. If no
    /// profile exists yet (first-ever launch) a default one is created and
    /// persisted immediately.
    pub async fn initialize_guest(local: Arc<LocalStore>) -> StoreResult<Self> {
        let profile = match local.load_profile().await? {
            Some(profile) => profile,
            None => {
                tracing::info!("No guest profile found, creating default");
                local.create_profile(CreateProfileInput::default()).await?
            }
        };
        let notifications = local.list_notifications().await.unwrap_or_default();
        Ok(Self {
            active: local.clone(),
            local,
            origin: StoreOrigin::Local,
            cache: RwLock::new(profile),
            notification_cache: RwLock::new(notifications),
            write_gate: Mutex::new(()),
        })
    }

    /// Build the store for an authenticated session over the remote adapter.
    /// The first time this observes "authenticated but no remote profile" it
    /// runs the one-shot guest migration. An unreachable remote does not
    /// trigger migration; the store comes up degraded over the local
    /// snapshot instead.
    pub async fn initialize_authenticated(
        local: Arc<LocalStore>,
        remote: Arc<RemoteStore>,
        session: AuthSession,
    ) -> StoreResult<Self> {
        let loaded = tokio::time::timeout(REMOTE_TIMEOUT, remote.load_profile())
            .await
            .map_err(|_| StoreError::Unavailable("remote load timed out".into()))
            .and_then(|r| r);

        let profile = match loaded {
            Ok(Some(profile)) => profile,
            Ok(None) => match migration::migrate_to_remote(&local, &remote, &session).await {
                Ok(profile) => profile,
                Err(StoreError::Unavailable(reason)) => {
                    tracing::error!(%reason, "Migration failed, local data kept as fallback");
                    local
                        .load_profile()
                        .await?
                        .unwrap_or_else(UserProfile::default_guest)
                }
                Err(e) => return Err(e),
            },
            Err(StoreError::Unavailable(reason)) => {
                tracing::warn!(%reason, "Remote unavailable at initialize, serving local snapshot");
                local
                    .load_profile()
                    .await?
                    .unwrap_or_else(UserProfile::default_guest)
            }
            Err(e) => return Err(e),
        };

        let notifications = match tokio::time::timeout(REMOTE_TIMEOUT, remote.list_notifications())
            .await
        {
            Ok(Ok(list)) => list,
            _ => local.list_notifications().await.unwrap_or_default(),
        };
        Ok(Self {
            active: remote,
            local,
            origin: StoreOrigin::Remote,
            cache: RwLock::new(profile),
            notification_cache: RwLock::new(notifications),
            write_gate: Mutex::new(()),
        })
    }

    /// Which identifier space the active adapter uses.
    pub fn origin(&self) -> StoreOrigin {
        self.origin
    }

    /// The cached profile. Always coherent: replaced only after a write
    /// resolves.
    pub fn profile(&self) -> UserProfile {
        self.cache.read().unwrap().clone()
    }

    /// Profile plus derived counts, the snapshot the UI and the AI coach
    /// consume.
    pub async fn user_data(&self) -> StoreResult<UserData> {
        let progress = self.progress().await?;
        let unread = self
            .notifications()
            .await?
            .iter()
            .filter(|n| !n.read)
            .count();
        Ok(UserData {
            profile: self.profile(),
            completed_lessons: progress.len(),
            completed_challenges: progress.iter().filter(|e| e.challenge_completed).count(),
            unread_notifications: unread,
        })
    }

    /// Authenticated profiles exist only after onboarding data does, so a
    /// positive bet average is the whole signal there. Guest profiles exist
    /// before onboarding and need the explicit flag too.
    pub fn has_completed_onboarding(&self) -> bool {
        let profile = self.cache.read().unwrap();
        match self.origin {
            StoreOrigin::Remote => profile.daily_bet_average > 0.0,
            StoreOrigin::Local => {
                profile.onboarding_completed && profile.daily_bet_average > 0.0
            }
        }
    }

    /// Validated partial update. Counter-lowering patches are rejected;
    /// relapse resets go through [`ProfileStore::reset_progress`].
    pub async fn update_profile(&self, patch: ProfilePatch) -> StoreResult<UserProfile> {
        let _gate = self.write_gate.lock().await;
        self.update_profile_locked(patch).await
    }

    pub async fn upgrade_to_premium(&self) -> StoreResult<UserProfile> {
        self.update_profile(ProfilePatch {
            plan_type: Some(crate::models::PlanType::Premium),
            ..Default::default()
        })
        .await
    }

    /// Record the onboarding baseline and mark onboarding complete.
    pub async fn complete_onboarding(&self, daily_bet_average: f64) -> StoreResult<UserProfile> {
        if daily_bet_average <= 0.0 {
            return Err(StoreError::Validation(
                "daily bet average must be positive".into(),
            ));
        }
        self.update_profile(ProfilePatch {
            daily_bet_average: Some(daily_bet_average),
            onboarding_completed: Some(true),
            ..Default::default()
        })
        .await
    }

    /// Explicit onboarding reset after a relapse: zeroes the streak counters
    /// and sets a new baseline. The only path allowed to lower them.
    pub async fn reset_progress(&self, daily_bet_average: f64) -> StoreResult<UserProfile> {
        if daily_bet_average <= 0.0 {
            return Err(StoreError::Validation(
                "daily bet average must be positive".into(),
            ));
        }
        let _gate = self.write_gate.lock().await;
        self.write_profile(ProfilePatch {
            days_clean: Some(0),
            money_saved: Some(0.0),
            time_saved: Some(0),
            last_daily_notification_day: Some(0),
            daily_bet_average: Some(daily_bet_average),
            onboarding_completed: Some(true),
            ..Default::default()
        })
        .await
    }

    /// Record the lesson for a day as complete. Idempotent; points are
    /// awarded only on the first completion.
    pub async fn complete_lesson(&self, lesson_day: u32) -> StoreResult<ProgressEntry> {
        let _gate = self.write_gate.lock().await;
        let already = self.progress_entry(lesson_day).await?.is_some();
        let entry = self
            .call(self.active.upsert_progress(lesson_day, false))
            .await?;
        if !already {
            self.award_points(LESSON_POINTS).await?;
        }
        Ok(entry)
    }

    /// Record the challenge for a day as complete, creating the progress
    /// entry if the lesson write never happened.
    pub async fn complete_challenge(&self, lesson_day: u32) -> StoreResult<ProgressEntry> {
        let _gate = self.write_gate.lock().await;
        let already = self
            .progress_entry(lesson_day)
            .await?
            .map(|e| e.challenge_completed)
            .unwrap_or(false);
        let entry = self
            .call(self.active.upsert_progress(lesson_day, true))
            .await?;
        if !already {
            self.award_points(CHALLENGE_POINTS).await?;
        }
        Ok(entry)
    }

    pub async fn progress(&self) -> StoreResult<Vec<ProgressEntry>> {
        match self.call(self.active.list_progress()).await {
            Ok(entries) => Ok(entries),
            Err(StoreError::Unavailable(reason)) => {
                tracing::warn!(%reason, "Remote unavailable, listing progress from local");
                self.local.list_progress().await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn completed_lessons(&self) -> StoreResult<usize> {
        Ok(self.progress().await?.len())
    }

    pub async fn completed_challenges(&self) -> StoreResult<usize> {
        Ok(self
            .progress()
            .await?
            .iter()
            .filter(|e| e.challenge_completed)
            .count())
    }

    /// All notifications, newest first. Falls back to the cached list when
    /// the remote is unreachable.
    pub async fn notifications(&self) -> StoreResult<Vec<Notification>> {
        match self.call(self.active.list_notifications()).await {
            Ok(list) => {
                *self.notification_cache.write().unwrap() = list.clone();
                Ok(list)
            }
            Err(StoreError::Unavailable(reason)) => {
                tracing::warn!(%reason, "Remote unavailable, serving cached notifications");
                Ok(self.notification_cache.read().unwrap().clone())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn unread_notifications(&self) -> StoreResult<usize> {
        Ok(self.notifications().await?.iter().filter(|n| !n.read).count())
    }

    /// Mark one notification read. An id from the wrong identifier space
    /// never reaches the adapter; only the cached copy is updated.
    pub async fn mark_notification_read(&self, id: NotificationId) -> StoreResult<()> {
        let _gate = self.write_gate.lock().await;
        if id.origin() == self.origin {
            self.call(self.active.mark_notification_read(id)).await?;
        } else {
            tracing::debug!(%id, "Notification id from inactive store, updating cache only");
        }
        let mut cache = self.notification_cache.write().unwrap();
        if let Some(n) = cache.iter_mut().find(|n| n.id == id) {
            n.read = true;
        }
        Ok(())
    }

    pub async fn mark_all_notifications_read(&self) -> StoreResult<()> {
        let _gate = self.write_gate.lock().await;
        self.call(self.active.mark_all_notifications_read()).await?;
        for n in self.notification_cache.write().unwrap().iter_mut() {
            n.read = true;
        }
        Ok(())
    }

    /// Take the write gate for a multi-step mutation sequence (the daily
    /// progression engine). `*_locked` methods assume this guard is held.
    pub(crate) async fn begin_write(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    pub(crate) async fn update_profile_locked(
        &self,
        patch: ProfilePatch,
    ) -> StoreResult<UserProfile> {
        self.validate(&patch)?;
        self.write_profile(patch).await
    }

    pub(crate) async fn insert_notification_locked(
        &self,
        payload: &NotificationPayload,
    ) -> StoreResult<Notification> {
        let notification = self
            .call(
                self.active
                    .insert_notification(&payload.title, &payload.message, payload.kind),
            )
            .await?;
        self.notification_cache
            .write()
            .unwrap()
            .insert(0, notification.clone());
        Ok(notification)
    }

    pub(crate) async fn progress_entry(
        &self,
        lesson_day: u32,
    ) -> StoreResult<Option<ProgressEntry>> {
        Ok(self
            .progress()
            .await?
            .into_iter()
            .find(|e| e.lesson_day == lesson_day))
    }

    async fn award_points(&self, points: u32) -> StoreResult<()> {
        let current = self.profile().points;
        self.write_profile(ProfilePatch {
            points: Some(current + points),
            ..Default::default()
        })
        .await?;
        Ok(())
    }

    /// Unvalidated adapter write; replaces the cache only once the write
    /// resolves.
    async fn write_profile(&self, patch: ProfilePatch) -> StoreResult<UserProfile> {
        let updated = self.call(self.active.update_profile(patch)).await?;
        *self.cache.write().unwrap() = updated.clone();
        Ok(updated)
    }

    fn validate(&self, patch: &ProfilePatch) -> StoreResult<()> {
        let current = self.cache.read().unwrap();
        if let Some(days) = patch.days_clean {
            if days < current.days_clean {
                return Err(StoreError::Validation(format!(
                    "days_clean cannot decrease ({} -> {})",
                    current.days_clean, days
                )));
            }
        }
        if let Some(money) = patch.money_saved {
            if money < current.money_saved {
                return Err(StoreError::Validation("money_saved cannot decrease".into()));
            }
        }
        if let Some(time) = patch.time_saved {
            if time < current.time_saved {
                return Err(StoreError::Validation("time_saved cannot decrease".into()));
            }
        }
        if let Some(points) = patch.points {
            if points < current.points {
                return Err(StoreError::Validation("points cannot decrease".into()));
            }
        }
        if let Some(bet) = patch.daily_bet_average {
            if bet < 0.0 {
                return Err(StoreError::Validation(
                    "daily_bet_average cannot be negative".into(),
                ));
            }
        }
        if let Some(day) = patch.last_daily_notification_day {
            let resulting_days = patch.days_clean.unwrap_or(current.days_clean);
            if day > resulting_days {
                return Err(StoreError::Validation(
                    "last_daily_notification_day cannot exceed days_clean".into(),
                ));
            }
        }
        Ok(())
    }

    /// Every adapter call funnels through here so the remote timeout is
    /// applied in exactly one place.
    async fn call<T>(
        &self,
        fut: impl std::future::Future<Output = StoreResult<T>> + Send,
    ) -> StoreResult<T> {
        match self.origin {
            StoreOrigin::Local => fut.await,
            StoreOrigin::Remote => tokio::time::timeout(REMOTE_TIMEOUT, fut)
                .await
                .map_err(|_| StoreError::Unavailable("remote call timed out".into()))?,
        }
    }
}

/// Returns the date the daily progression should treat as "today".
pub fn today_local() -> NaiveDate {
    chrono::Local::now().date_naive()
}
