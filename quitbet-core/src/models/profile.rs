use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The single source of truth for a user's quantified progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Present only for authenticated profiles (the session identity).
    pub id: Option<String>,
    pub email: Option<String>,
    pub plan_type: PlanType,
    /// Current streak: consecutive count of fully-completed program days.
    pub days_clean: u32,
    pub money_saved: f64,
    /// Minutes reclaimed, 60 per completed day.
    pub time_saved: u32,
    /// User-declared daily baseline, set at onboarding. Per-day increment
    /// for `money_saved`.
    pub daily_bet_average: f64,
    pub points: u32,
    /// Highest `days_clean` value for which notifications already fired.
    pub last_daily_notification_day: u32,
    /// Last calendar date the daily progression ran to completion.
    pub last_daily_check_date: Option<NaiveDate>,
    /// Guest-only; authenticated profiles infer onboarding completion from
    /// `daily_bet_average > 0`.
    #[serde(default)]
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A fresh guest profile: free plan, all counters zero.
    pub fn default_guest() -> Self {
        let now = Utc::now();
        Self {
            id: None,
            email: None,
            plan_type: PlanType::Free,
            days_clean: 0,
            money_saved: 0.0,
            time_saved: 0,
            daily_bet_average: 0.0,
            points: 0,
            last_daily_notification_day: 0,
            last_daily_check_date: None,
            onboarding_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a partial update into the profile and bump `updated_at`.
    /// Both adapters apply patches through here so merge semantics cannot
    /// drift between backends.
    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(email) = &patch.email {
            self.email = Some(email.clone());
        }
        if let Some(plan_type) = patch.plan_type {
            self.plan_type = plan_type;
        }
        if let Some(days_clean) = patch.days_clean {
            self.days_clean = days_clean;
        }
        if let Some(money_saved) = patch.money_saved {
            self.money_saved = money_saved;
        }
        if let Some(time_saved) = patch.time_saved {
            self.time_saved = time_saved;
        }
        if let Some(daily_bet_average) = patch.daily_bet_average {
            self.daily_bet_average = daily_bet_average;
        }
        if let Some(points) = patch.points {
            self.points = points;
        }
        if let Some(day) = patch.last_daily_notification_day {
            self.last_daily_notification_day = day;
        }
        if let Some(date) = patch.last_daily_check_date {
            self.last_daily_check_date = Some(date);
        }
        if let Some(done) = patch.onboarding_completed {
            self.onboarding_completed = done;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Free,
    Premium,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }
}

/// Seed for `create_profile`. Unset counters default to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProfileInput {
    pub id: Option<String>,
    pub email: Option<String>,
    pub plan_type: Option<PlanType>,
    pub days_clean: Option<u32>,
    pub money_saved: Option<f64>,
    pub time_saved: Option<u32>,
    pub daily_bet_average: Option<f64>,
    pub points: Option<u32>,
    pub last_daily_notification_day: Option<u32>,
    pub last_daily_check_date: Option<NaiveDate>,
}

impl CreateProfileInput {
    /// Materialize the seed into a full profile record.
    pub fn into_profile(self) -> UserProfile {
        let mut profile = UserProfile::default_guest();
        profile.id = self.id;
        profile.email = self.email;
        if let Some(plan_type) = self.plan_type {
            profile.plan_type = plan_type;
        }
        profile.days_clean = self.days_clean.unwrap_or(0);
        profile.money_saved = self.money_saved.unwrap_or(0.0);
        profile.time_saved = self.time_saved.unwrap_or(0);
        profile.daily_bet_average = self.daily_bet_average.unwrap_or(0.0);
        profile.points = self.points.unwrap_or(0);
        profile.last_daily_notification_day = self.last_daily_notification_day.unwrap_or(0);
        profile.last_daily_check_date = self.last_daily_check_date;
        profile
    }
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub plan_type: Option<PlanType>,
    pub days_clean: Option<u32>,
    pub money_saved: Option<f64>,
    pub time_saved: Option<u32>,
    pub daily_bet_average: Option<f64>,
    pub points: Option<u32>,
    pub last_daily_notification_day: Option<u32>,
    pub last_daily_check_date: Option<NaiveDate>,
    pub onboarding_completed: Option<bool>,
}

/// Snapshot handed to UI consumers and to the AI coach: the profile plus
/// derived counts.
#[derive(Debug, Clone, Serialize)]
pub struct UserData {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub completed_lessons: usize,
    pub completed_challenges: usize,
    pub unread_notifications: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_merges_only_set_fields() {
        let mut profile = UserProfile::default_guest();
        profile.days_clean = 3;
        profile.money_saved = 150.0;

        let before = profile.updated_at;
        profile.apply(&ProfilePatch {
            points: Some(40),
            ..Default::default()
        });

        assert_eq!(profile.points, 40);
        assert_eq!(profile.days_clean, 3);
        assert_eq!(profile.money_saved, 150.0);
        assert!(profile.updated_at >= before);
    }

    #[test]
    fn seed_defaults_counters_to_zero() {
        let profile = CreateProfileInput {
            id: Some("user-1".into()),
            daily_bet_average: Some(25.0),
            ..Default::default()
        }
        .into_profile();

        assert_eq!(profile.id.as_deref(), Some("user-1"));
        assert_eq!(profile.days_clean, 0);
        assert_eq!(profile.plan_type, PlanType::Free);
        assert_eq!(profile.daily_bet_average, 25.0);
    }
}
