//! Relational storage for authenticated sessions
//!
//! SQLite stands in for the hosted store: three tables scoped by `user_id`,
//! with notification ids assigned by the table rather than the client. All
//! operations check an offline flag first so an unreachable backend
//! surfaces as `Unavailable` instead of hanging callers.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::PersistenceAdapter;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    CreateProfileInput, Notification, NotificationId, NotificationKind, PlanType, ProfilePatch,
    ProgressEntry, UserProfile,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS user_profiles (
    id TEXT PRIMARY KEY,
    email TEXT,
    plan_type TEXT NOT NULL DEFAULT 'free' CHECK (plan_type IN ('free', 'premium')),
    days_clean INTEGER NOT NULL DEFAULT 0,
    money_saved REAL NOT NULL DEFAULT 0,
    time_saved INTEGER NOT NULL DEFAULT 0,
    daily_bet_average REAL NOT NULL DEFAULT 0,
    points INTEGER NOT NULL DEFAULT 0,
    last_daily_notification_day INTEGER NOT NULL DEFAULT 0,
    last_daily_check_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_progress (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES user_profiles(id) ON DELETE CASCADE,
    lesson_day INTEGER NOT NULL,
    challenge_completed INTEGER NOT NULL DEFAULT 0,
    completed_at TEXT NOT NULL,
    UNIQUE (user_id, lesson_day)
);

CREATE TABLE IF NOT EXISTS user_notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES user_profiles(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    type TEXT NOT NULL CHECK (type IN ('motivation', 'achievement', 'milestone', 'warning')),
    created_at TEXT NOT NULL,
    read INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_progress_user ON user_progress(user_id);
CREATE INDEX IF NOT EXISTS idx_notifications_user ON user_notifications(user_id);
"#;

pub struct RemoteStore {
    conn: Mutex<Connection>,
    user_id: String,
    offline: AtomicBool,
}

impl RemoteStore {
    /// Open or create the database at the given path, scoped to one user.
    pub fn open(path: impl AsRef<Path>, user_id: &str) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn, user_id)
    }

    /// Memory-backed database, used by tests.
    pub fn open_in_memory(user_id: &str) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, user_id)
    }

    fn with_connection(conn: Connection, user_id: &str) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            user_id: user_id.to_string(),
            offline: AtomicBool::new(false),
        })
    }

    /// Simulate an unreachable backend. Used by tests.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("remote store offline".into()))
        } else {
            Ok(())
        }
    }

    fn read_profile(conn: &Connection, user_id: &str) -> StoreResult<Option<UserProfile>> {
        conn.query_row(
            "SELECT id, email, plan_type, days_clean, money_saved, time_saved,
                    daily_bet_average, points, last_daily_notification_day,
                    last_daily_check_date, created_at, updated_at
             FROM user_profiles WHERE id = ?1",
            params![user_id],
            profile_from_row,
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn write_profile(conn: &Connection, profile: &UserProfile) -> StoreResult<()> {
        conn.execute(
            "UPDATE user_profiles SET
                email = ?2, plan_type = ?3, days_clean = ?4, money_saved = ?5,
                time_saved = ?6, daily_bet_average = ?7, points = ?8,
                last_daily_notification_day = ?9, last_daily_check_date = ?10,
                updated_at = ?11
             WHERE id = ?1",
            params![
                profile.id,
                profile.email,
                profile.plan_type.as_str(),
                profile.days_clean,
                profile.money_saved,
                profile.time_saved,
                profile.daily_bet_average,
                profile.points,
                profile.last_daily_notification_day,
                profile.last_daily_check_date.map(|d| d.to_string()),
                profile.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    let plan: String = row.get(2)?;
    let check_date: Option<String> = row.get(9)?;
    let created_at: String = row.get(10)?;
    let updated_at: String = row.get(11)?;
    Ok(UserProfile {
        id: Some(row.get(0)?),
        email: row.get(1)?,
        plan_type: PlanType::from_str(&plan).unwrap_or(PlanType::Free),
        days_clean: row.get(3)?,
        money_saved: row.get(4)?,
        time_saved: row.get(5)?,
        daily_bet_average: row.get(6)?,
        points: row.get(7)?,
        last_daily_notification_day: row.get(8)?,
        last_daily_check_date: check_date.and_then(|s| s.parse::<NaiveDate>().ok()),
        onboarding_completed: false,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl PersistenceAdapter for RemoteStore {
    async fn load_profile(&self) -> StoreResult<Option<UserProfile>> {
        self.check_online()?;
        let conn = self.conn.lock().unwrap();
        Self::read_profile(&conn, &self.user_id)
    }

    async fn create_profile(&self, seed: CreateProfileInput) -> StoreResult<UserProfile> {
        self.check_online()?;
        let conn = self.conn.lock().unwrap();
        if Self::read_profile(&conn, &self.user_id)?.is_some() {
            return Err(StoreError::Conflict(format!(
                "profile already exists for user {}",
                self.user_id
            )));
        }
        let mut profile = seed.into_profile();
        profile.id = Some(self.user_id.clone());
        conn.execute(
            "INSERT INTO user_profiles
                (id, email, plan_type, days_clean, money_saved, time_saved,
                 daily_bet_average, points, last_daily_notification_day,
                 last_daily_check_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                profile.id,
                profile.email,
                profile.plan_type.as_str(),
                profile.days_clean,
                profile.money_saved,
                profile.time_saved,
                profile.daily_bet_average,
                profile.points,
                profile.last_daily_notification_day,
                profile.last_daily_check_date.map(|d| d.to_string()),
                profile.created_at.to_rfc3339(),
                profile.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(profile)
    }

    async fn update_profile(&self, patch: ProfilePatch) -> StoreResult<UserProfile> {
        self.check_online()?;
        let conn = self.conn.lock().unwrap();
        let mut profile =
            Self::read_profile(&conn, &self.user_id)?.ok_or(StoreError::NotFound)?;
        profile.apply(&patch);
        Self::write_profile(&conn, &profile)?;
        Ok(profile)
    }

    async fn upsert_progress(
        &self,
        lesson_day: u32,
        challenge_completed: bool,
    ) -> StoreResult<ProgressEntry> {
        self.check_online()?;
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO user_progress (id, user_id, lesson_day, challenge_completed, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (user_id, lesson_day) DO UPDATE SET
                challenge_completed = MAX(challenge_completed, excluded.challenge_completed),
                completed_at = excluded.completed_at",
            params![
                Uuid::new_v4().to_string(),
                self.user_id,
                lesson_day,
                challenge_completed,
                now.to_rfc3339(),
            ],
        )?;
        let completed: bool = conn.query_row(
            "SELECT challenge_completed FROM user_progress
             WHERE user_id = ?1 AND lesson_day = ?2",
            params![self.user_id, lesson_day],
            |row| row.get(0),
        )?;
        Ok(ProgressEntry {
            lesson_day,
            challenge_completed: completed,
            completed_at: now,
        })
    }

    async fn list_progress(&self) -> StoreResult<Vec<ProgressEntry>> {
        self.check_online()?;
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT lesson_day, challenge_completed, completed_at
             FROM user_progress WHERE user_id = ?1 ORDER BY lesson_day",
        )?;
        let entries = stmt
            .query_map(params![self.user_id], |row| {
                let completed_at: String = row.get(2)?;
                Ok(ProgressEntry {
                    lesson_day: row.get(0)?,
                    challenge_completed: row.get(1)?,
                    completed_at: parse_ts(&completed_at),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    async fn insert_notification(
        &self,
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> StoreResult<Notification> {
        self.check_online()?;
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO user_notifications (user_id, title, message, type, created_at, read)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![self.user_id, title, message, kind.as_str(), now.to_rfc3339()],
        )?;
        Ok(Notification {
            id: NotificationId::Remote(conn.last_insert_rowid()),
            title: title.to_string(),
            message: message.to_string(),
            kind,
            created_at: now,
            read: false,
        })
    }

    async fn list_notifications(&self) -> StoreResult<Vec<Notification>> {
        self.check_online()?;
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, message, type, created_at, read
             FROM user_notifications WHERE user_id = ?1
             ORDER BY id DESC",
        )?;
        let notifications = stmt
            .query_map(params![self.user_id], |row| {
                let kind: String = row.get(3)?;
                let created_at: String = row.get(4)?;
                Ok(Notification {
                    id: NotificationId::Remote(row.get(0)?),
                    title: row.get(1)?,
                    message: row.get(2)?,
                    kind: NotificationKind::from_str(&kind)
                        .unwrap_or(NotificationKind::Motivation),
                    created_at: parse_ts(&created_at),
                    read: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notifications)
    }

    async fn mark_notification_read(&self, id: NotificationId) -> StoreResult<()> {
        self.check_online()?;
        let NotificationId::Remote(row_id) = id else {
            return Err(StoreError::Validation(
                "local notification id passed to remote store".into(),
            ));
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE user_notifications SET read = 1 WHERE id = ?1 AND user_id = ?2",
            params![row_id, self.user_id],
        )?;
        Ok(())
    }

    async fn mark_all_notifications_read(&self) -> StoreResult<()> {
        self.check_online()?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE user_notifications SET read = 1 WHERE user_id = ?1",
            params![self.user_id],
        )?;
        Ok(())
    }
}
