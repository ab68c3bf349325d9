//! Notification generator
//!
//! Pure lookups against three static tables. Callers insert the returned
//! payloads through the active adapter; nothing here touches storage.

use crate::models::NotificationKind;

/// Payload for a notification the caller has yet to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPayload {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
}

struct DayAchievement {
    day: u32,
    title: &'static str,
    message: &'static str,
}

/// Sparse milestone days. At most one achievement per day value.
const DAY_ACHIEVEMENTS: &[DayAchievement] = &[
    DayAchievement {
        day: 1,
        title: "First day clean",
        message: "One full day without a bet. The hardest step is behind you.",
    },
    DayAchievement {
        day: 3,
        title: "Three days strong",
        message: "72 hours clean. Cravings peak around now and you held the line.",
    },
    DayAchievement {
        day: 7,
        title: "One week clean",
        message: "A full week without gambling. Your streak is becoming a habit.",
    },
    DayAchievement {
        day: 14,
        title: "Two weeks clean",
        message: "Fourteen days in a row. Notice how the urges come less often.",
    },
    DayAchievement {
        day: 21,
        title: "Three weeks clean",
        message: "21 days. Research says new routines start to stick right here.",
    },
    DayAchievement {
        day: 30,
        title: "One month clean",
        message: "A whole month bet-free. This is a major recovery milestone.",
    },
    DayAchievement {
        day: 60,
        title: "Two months clean",
        message: "60 days of showing up for yourself. Keep the ledger growing.",
    },
    DayAchievement {
        day: 90,
        title: "Ninety days clean",
        message: "90 days. Clinicians call this the turning point of recovery.",
    },
    DayAchievement {
        day: 180,
        title: "Half a year clean",
        message: "Six months without a single bet. Extraordinary discipline.",
    },
    DayAchievement {
        day: 365,
        title: "One year clean",
        message: "365 days. A full year of your life and money back in your hands.",
    },
];

/// Ascending monetary thresholds for milestone notifications.
const MONEY_MILESTONES: &[u32] = &[500, 1000, 5000, 10000];

/// Rotating daily reminder pool, indexed by streak day.
const DAILY_REMINDERS: &[&str] = &[
    "Urges pass in minutes. Streaks last for years.",
    "Check your savings counter before you check the odds.",
    "Every clean day is money that stays yours.",
    "You quit for a reason. Write it down if it feels far away.",
    "One day at a time is the whole strategy.",
    "The house never misses you. Your future self will.",
    "A craving is a wave. Surf it, don't feed it.",
    "Today's lesson takes five minutes. A relapse takes months back.",
];

/// Achievement for an exact streak day, if one is defined.
pub fn achievement_for_day(days_clean: u32) -> Option<NotificationPayload> {
    DAY_ACHIEVEMENTS
        .iter()
        .find(|a| a.day == days_clean)
        .map(|a| NotificationPayload {
            title: a.title.to_string(),
            message: a.message.to_string(),
            kind: NotificationKind::Achievement,
        })
}

/// Fires the highest threshold crossed by this increment, exactly once, on
/// the transition: `new_saved >= t && new_saved - increment < t`. Never
/// retroactive.
pub fn milestone_for_savings(new_saved: f64, increment: f64) -> Option<NotificationPayload> {
    let previous = new_saved - increment;
    MONEY_MILESTONES
        .iter()
        .rev()
        .find(|&&t| new_saved >= t as f64 && previous < t as f64)
        .map(|&t| NotificationPayload {
            title: format!("${} saved", t),
            message: format!(
                "You've kept ${} out of the bookmaker's pocket since you quit.",
                t
            ),
            kind: NotificationKind::Milestone,
        })
}

/// Deterministic rotating reminder: one per streak day, wrapping over the
/// pool without repetition bias.
pub fn daily_reminder(days_clean: u32) -> NotificationPayload {
    let index = days_clean.saturating_sub(1) as usize % DAILY_REMINDERS.len();
    NotificationPayload {
        title: "Daily reminder".to_string(),
        message: DAILY_REMINDERS[index].to_string(),
        kind: NotificationKind::Motivation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn achievements_only_on_table_days() {
        assert!(achievement_for_day(1).is_some());
        assert!(achievement_for_day(7).is_some());
        assert!(achievement_for_day(2).is_none());
        assert!(achievement_for_day(0).is_none());
        assert!(achievement_for_day(100).is_none());
    }

    #[test]
    fn milestone_fires_on_transition_only() {
        // 480 -> 530 crosses 500
        let hit = milestone_for_savings(530.0, 50.0).expect("should fire");
        assert_eq!(hit.kind, NotificationKind::Milestone);
        assert!(hit.title.contains("500"));

        // 530 -> 580 does not re-fire
        assert!(milestone_for_savings(580.0, 50.0).is_none());

        // Landing exactly on the threshold fires
        assert!(milestone_for_savings(500.0, 50.0).is_some());
    }

    #[test]
    fn milestone_picks_highest_crossed() {
        // A huge jump from 400 to 6000 crosses 500, 1000 and 5000; only the
        // highest fires.
        let hit = milestone_for_savings(6000.0, 5600.0).expect("should fire");
        assert!(hit.title.contains("5000"));
    }

    #[test]
    fn reminders_rotate_deterministically() {
        let first = daily_reminder(1);
        let wrapped = daily_reminder(1 + DAILY_REMINDERS.len() as u32);
        assert_eq!(first.message, wrapped.message);
        assert_ne!(daily_reminder(1).message, daily_reminder(2).message);
    }

    #[test]
    fn reminder_handles_zero_streak() {
        // days_clean 0 should not panic or underflow.
        assert_eq!(daily_reminder(0).message, daily_reminder(1).message);
    }
}
