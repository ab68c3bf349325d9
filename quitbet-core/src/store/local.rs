//! Local key-value storage for guest sessions
//!
//! Three flat records (`profile`, `progress`, `notifications`) serialized as
//! one JSON document, held in memory behind an `RwLock` and optionally
//! persisted to a file. Operations are synchronous underneath and always
//! succeed short of the disk itself failing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PersistenceAdapter;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    CreateProfileInput, Notification, NotificationId, NotificationKind, ProfilePatch,
    ProgressEntry, UserProfile,
};

/// In-file layout of one progress record, keyed by lesson day.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalProgressRecord {
    lesson_completed: bool,
    challenge_completed: bool,
    completed_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LocalState {
    profile: Option<UserProfile>,
    /// Lesson day -> record. BTreeMap keeps listing order stable.
    progress: BTreeMap<u32, LocalProgressRecord>,
    /// Newest first.
    notifications: Vec<Notification>,
}

pub struct LocalStore {
    state: RwLock<LocalState>,
    path: Option<PathBuf>,
}

impl LocalStore {
    /// Open the store backed by a JSON file, loading any existing snapshot.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            LocalState::default()
        };
        Ok(Self {
            state: RwLock::new(state),
            path: Some(path),
        })
    }

    /// Memory-only store, used by tests and as the empty degraded fallback.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(LocalState::default()),
            path: None,
        }
    }

    /// Wipe every record. Called by the migration engine after the remote
    /// profile has been created.
    pub fn clear(&self) -> StoreResult<()> {
        let mut state = self.state.write().unwrap();
        *state = LocalState::default();
        self.persist(&state)
    }

    /// True when no profile record exists.
    pub fn is_empty(&self) -> bool {
        self.state.read().unwrap().profile.is_none()
    }

    fn persist(&self, state: &LocalState) -> StoreResult<()> {
        if let Some(path) = &self.path {
            let raw = serde_json::to_string_pretty(state)?;
            std::fs::write(path, raw)?;
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceAdapter for LocalStore {
    async fn load_profile(&self) -> StoreResult<Option<UserProfile>> {
        Ok(self.state.read().unwrap().profile.clone())
    }

    async fn create_profile(&self, seed: CreateProfileInput) -> StoreResult<UserProfile> {
        let mut state = self.state.write().unwrap();
        if state.profile.is_some() {
            return Err(StoreError::Conflict(
                "local profile already exists".into(),
            ));
        }
        let profile = seed.into_profile();
        state.profile = Some(profile.clone());
        self.persist(&state)?;
        Ok(profile)
    }

    async fn update_profile(&self, patch: ProfilePatch) -> StoreResult<UserProfile> {
        let mut state = self.state.write().unwrap();
        let profile = state.profile.as_mut().ok_or(StoreError::NotFound)?;
        profile.apply(&patch);
        let updated = profile.clone();
        self.persist(&state)?;
        Ok(updated)
    }

    async fn upsert_progress(
        &self,
        lesson_day: u32,
        challenge_completed: bool,
    ) -> StoreResult<ProgressEntry> {
        let mut state = self.state.write().unwrap();
        let now = Utc::now();
        let record = state
            .progress
            .entry(lesson_day)
            .and_modify(|r| {
                // Challenge completion never regresses.
                r.challenge_completed |= challenge_completed;
                r.completed_at = now;
            })
            .or_insert(LocalProgressRecord {
                lesson_completed: true,
                challenge_completed,
                completed_at: now,
            });
        let entry = ProgressEntry {
            lesson_day,
            challenge_completed: record.challenge_completed,
            completed_at: record.completed_at,
        };
        self.persist(&state)?;
        Ok(entry)
    }

    async fn list_progress(&self) -> StoreResult<Vec<ProgressEntry>> {
        let state = self.state.read().unwrap();
        Ok(state
            .progress
            .iter()
            .map(|(day, record)| ProgressEntry {
                lesson_day: *day,
                challenge_completed: record.challenge_completed,
                completed_at: record.completed_at,
            })
            .collect())
    }

    async fn insert_notification(
        &self,
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> StoreResult<Notification> {
        let notification = Notification {
            id: NotificationId::new_local(),
            title: title.to_string(),
            message: message.to_string(),
            kind,
            created_at: Utc::now(),
            read: false,
        };
        let mut state = self.state.write().unwrap();
        state.notifications.insert(0, notification.clone());
        self.persist(&state)?;
        Ok(notification)
    }

    async fn list_notifications(&self) -> StoreResult<Vec<Notification>> {
        Ok(self.state.read().unwrap().notifications.clone())
    }

    async fn mark_notification_read(&self, id: NotificationId) -> StoreResult<()> {
        if let NotificationId::Remote(_) = id {
            return Err(StoreError::Validation(
                "remote notification id passed to local store".into(),
            ));
        }
        let mut state = self.state.write().unwrap();
        if let Some(n) = state.notifications.iter_mut().find(|n| n.id == id) {
            n.read = true;
        }
        self.persist(&state)
    }

    async fn mark_all_notifications_read(&self) -> StoreResult<()> {
        let mut state = self.state.write().unwrap();
        for n in state.notifications.iter_mut() {
            n.read = true;
        }
        self.persist(&state)
    }
}
