//! User profile data model: onboarding answers and the goal/level enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accepted body-weight range in kilograms.
pub const WEIGHT_RANGE_KG: (f64, f64) = (30.0, 300.0);
/// Accepted height range in centimetres.
pub const HEIGHT_RANGE_CM: (f64, f64) = (100.0, 250.0);

/// A fitness goal picked during onboarding.
///
/// Unknown values are kept verbatim so they still reach the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FitnessGoal {
    LoseWeight,
    GainMuscle,
    StayFit,
    ImproveEndurance,
    Other(String),
}

impl FitnessGoal {
    pub fn as_str(&self) -> &str {
        match self {
            Self::LoseWeight => "lose_weight",
            Self::GainMuscle => "gain_muscle",
            Self::StayFit => "stay_fit",
            Self::ImproveEndurance => "improve_endurance",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for FitnessGoal {
    fn from(s: String) -> Self {
        match s.trim() {
            "lose_weight" => Self::LoseWeight,
            "gain_muscle" => Self::GainMuscle,
            "stay_fit" => Self::StayFit,
            "improve_endurance" => Self::ImproveEndurance,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for FitnessGoal {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<FitnessGoal> for String {
    fn from(goal: FitnessGoal) -> Self {
        goal.as_str().to_string()
    }
}

impl std::fmt::Display for FitnessGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse training experience derived from the activity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceTier {
    Low,
    Medium,
    High,
}

/// Self-reported activity level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityLevel {
    Sedentary,
    Beginner,
    Moderate,
    Intermediate,
    Active,
    Advanced,
    Other(String),
}

impl ActivityLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sedentary => "sedentary",
            Self::Beginner => "beginner",
            Self::Moderate => "moderate",
            Self::Intermediate => "intermediate",
            Self::Active => "active",
            Self::Advanced => "advanced",
            Self::Other(s) => s,
        }
    }

    pub fn tier(&self) -> ExperienceTier {
        match self {
            Self::Sedentary | Self::Beginner => ExperienceTier::Low,
            Self::Moderate | Self::Intermediate => ExperienceTier::Medium,
            Self::Active | Self::Advanced | Self::Other(_) => ExperienceTier::High,
        }
    }
}

impl From<String> for ActivityLevel {
    fn from(s: String) -> Self {
        match s.trim() {
            "sedentary" => Self::Sedentary,
            "beginner" => Self::Beginner,
            "moderate" => Self::Moderate,
            "intermediate" => Self::Intermediate,
            "active" => Self::Active,
            "advanced" => Self::Advanced,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for ActivityLevel {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ActivityLevel> for String {
    fn from(level: ActivityLevel) -> Self {
        level.as_str().to_string()
    }
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Onboarding answers stored per user in `user_profiles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    /// `None` means the goals step was never answered.
    #[serde(default)]
    pub fitness_goals: Option<Vec<FitnessGoal>>,
    #[serde(default)]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default)]
    pub has_completed_onboarding: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            height: None,
            weight: None,
            age: None,
            gender: None,
            fitness_goals: None,
            activity_level: None,
            has_completed_onboarding: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_goals(mut self, goals: Vec<FitnessGoal>) -> Self {
        self.fitness_goals = Some(goals);
        self
    }

    pub fn with_activity_level(mut self, level: ActivityLevel) -> Self {
        self.activity_level = Some(level);
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    /// Names of the fields routine generation needs but the profile lacks.
    pub fn missing_routine_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.fitness_goals.is_none() {
            missing.push("fitness_goals");
        }
        let level_blank = self
            .activity_level
            .as_ref()
            .is_none_or(|l| l.as_str().trim().is_empty());
        if level_blank {
            missing.push("activity_level");
        }
        missing
    }
}

/// Body of `PUT /api/users/{user_id}/profile`, sent when onboarding finishes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub fitness_goals: Option<Vec<FitnessGoal>>,
    #[serde(default)]
    pub activity_level: Option<ActivityLevel>,
    /// Defaults to true: the wizard only submits on its final step.
    #[serde(default)]
    pub has_completed_onboarding: Option<bool>,
}

impl ProfileUpdate {
    /// Check body metrics against the wizard's accepted ranges.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(w) = self.weight {
            if !(WEIGHT_RANGE_KG.0..=WEIGHT_RANGE_KG.1).contains(&w) {
                return Err(format!(
                    "weight must be between {} and {} kg",
                    WEIGHT_RANGE_KG.0, WEIGHT_RANGE_KG.1
                ));
            }
        }
        if let Some(h) = self.height {
            if !(HEIGHT_RANGE_CM.0..=HEIGHT_RANGE_CM.1).contains(&h) {
                return Err(format!(
                    "height must be between {} and {} cm",
                    HEIGHT_RANGE_CM.0, HEIGHT_RANGE_CM.1
                ));
            }
        }
        if let Some(age) = self.age {
            if !(1..=120).contains(&age) {
                return Err("age must be between 1 and 120".to_string());
            }
        }
        Ok(())
    }

    /// Merge into an existing profile (or a fresh one), keeping `created_at`.
    pub fn apply(self, user_id: &str, existing: Option<UserProfile>) -> UserProfile {
        let mut profile = existing.unwrap_or_else(|| UserProfile::new(user_id));
        profile.height = self.height.or(profile.height);
        profile.weight = self.weight.or(profile.weight);
        profile.age = self.age.or(profile.age);
        profile.gender = self.gender.filter(|g| !g.trim().is_empty()).or(profile.gender);
        profile.fitness_goals = self.fitness_goals.or(profile.fitness_goals);
        profile.activity_level = self.activity_level.or(profile.activity_level);
        profile.has_completed_onboarding = self.has_completed_onboarding.unwrap_or(true);
        profile.updated_at = Utc::now();
        profile
    }
}

/// Where the client should send the user next.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OnboardingStatus {
    pub has_completed_onboarding: bool,
    pub next: &'static str,
}

impl OnboardingStatus {
    pub fn for_profile(profile: Option<&UserProfile>) -> Self {
        let done = profile.is_some_and(|p| p.has_completed_onboarding);
        Self {
            has_completed_onboarding: done,
            next: if done { "/dashboard" } else { "/onboarding" },
        }
    }
}
