//! Storage adapters for profile, progress, and notification records

mod local;
mod remote;

pub use local::LocalStore;
pub use remote::RemoteStore;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{
    CreateProfileInput, Notification, NotificationId, NotificationKind, ProfilePatch,
    ProgressEntry, UserProfile,
};

/// Persistence contract shared by the local (guest) and remote
/// (authenticated) adapters. The profile store holds exactly one active
/// adapter; consumers never see which one.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Load the profile, `Ok(None)` if this identity has never had one.
    async fn load_profile(&self) -> StoreResult<Option<UserProfile>>;

    /// Create the profile. Exactly once per identity; a second call is a
    /// `Conflict`.
    async fn create_profile(&self, seed: CreateProfileInput) -> StoreResult<UserProfile>;

    /// Merge a partial update into the existing profile and bump
    /// `updated_at`. `NotFound` if no profile exists.
    async fn update_profile(&self, patch: ProfilePatch) -> StoreResult<UserProfile>;

    /// Create or update the progress entry for a lesson day. Idempotent:
    /// repeated calls for the same day only refresh `challenge_completed`
    /// and `completed_at`, and a completed challenge never regresses.
    async fn upsert_progress(
        &self,
        lesson_day: u32,
        challenge_completed: bool,
    ) -> StoreResult<ProgressEntry>;

    async fn list_progress(&self) -> StoreResult<Vec<ProgressEntry>>;

    async fn insert_notification(
        &self,
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> StoreResult<Notification>;

    /// All notifications, newest first.
    async fn list_notifications(&self) -> StoreResult<Vec<Notification>>;

    async fn mark_notification_read(&self, id: NotificationId) -> StoreResult<()>;

    async fn mark_all_notifications_read(&self) -> StoreResult<()>;
}
