use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry per lesson day the user has engaged with. Presence of an entry
/// means the lesson for that day is complete; the challenge is tracked
/// independently and may complete later. Entries are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// 1-based index into the daily curriculum, unique per user.
    pub lesson_day: u32,
    pub challenge_completed: bool,
    pub completed_at: DateTime<Utc>,
}
