use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event record, immutable except for its read state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// Notification identifier, tagged with the store that assigned it. Local
/// ids are client-generated UUIDs; remote ids are assigned by the backing
/// table. The two spaces are not interchangeable, so the variant carries the
/// origin explicitly instead of callers sniffing the id format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationId {
    Local(Uuid),
    Remote(i64),
}

impl NotificationId {
    pub fn new_local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    pub fn origin(&self) -> StoreOrigin {
        match self {
            Self::Local(_) => StoreOrigin::Local,
            Self::Remote(_) => StoreOrigin::Remote,
        }
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(uuid) => write!(f, "{}", uuid),
            Self::Remote(id) => write!(f, "{}", id),
        }
    }
}

/// Which store a record (or the active adapter) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOrigin {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Motivation,
    Achievement,
    Milestone,
    Warning,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Motivation => "motivation",
            Self::Achievement => "achievement",
            Self::Milestone => "milestone",
            Self::Warning => "warning",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "motivation" => Some(Self::Motivation),
            "achievement" => Some(Self::Achievement),
            "milestone" => Some(Self::Milestone),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }
}
