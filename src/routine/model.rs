//! Canonical routine schema and the validated generation request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::profile::model::{ActivityLevel, FitnessGoal, UserProfile};

/// Goal substituted when a request carries none.
pub const DEFAULT_GOAL: FitnessGoal = FitnessGoal::GainMuscle;
/// Level substituted when a request carries none.
pub const DEFAULT_ACTIVITY_LEVEL: ActivityLevel = ActivityLevel::Moderate;

/// A generated weekly plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRoutine {
    pub weekly_plan: Vec<WorkoutDay>,
    pub nutrition_tips: Vec<Tip>,
    pub beginner_tips: Vec<Tip>,
}

impl GeneratedRoutine {
    pub fn is_empty(&self) -> bool {
        self.weekly_plan.is_empty() && self.nutrition_tips.is_empty() && self.beginner_tips.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDay {
    pub day: String,
    pub focus: String,
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    /// A range ("8-12") or free text ("Hasta el fallo").
    pub reps: String,
    pub rest: String,
    pub muscle_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    pub title: String,
    pub description: String,
}

impl Tip {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Profile data shaped for generation: goals and level are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineRequest {
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    /// Never empty.
    pub fitness_goals: Vec<FitnessGoal>,
    pub activity_level: ActivityLevel,
}

impl RoutineRequest {
    /// Shape raw parts into a request, substituting defaults for absent goals
    /// or level.
    pub fn new(
        height: Option<f64>,
        weight: Option<f64>,
        age: Option<i64>,
        gender: Option<String>,
        fitness_goals: Option<Vec<FitnessGoal>>,
        activity_level: Option<ActivityLevel>,
    ) -> Self {
        let fitness_goals = match fitness_goals {
            Some(goals) if !goals.is_empty() => goals,
            _ => vec![DEFAULT_GOAL],
        };
        let activity_level = activity_level
            .filter(|l| !l.as_str().trim().is_empty())
            .unwrap_or(DEFAULT_ACTIVITY_LEVEL);
        Self {
            height,
            weight,
            age,
            gender: gender.filter(|g| !g.trim().is_empty()),
            fitness_goals,
            activity_level,
        }
    }

    pub fn from_profile(profile: &UserProfile) -> Self {
        Self::new(
            profile.height,
            profile.weight,
            profile.age,
            profile.gender.clone(),
            profile.fitness_goals.clone(),
            profile.activity_level.clone(),
        )
    }

    /// Shape an untrusted JSON body. Wrong-typed fields count as absent.
    pub fn from_json(body: &Value) -> Self {
        let positive = |key: &str| body.get(key).and_then(Value::as_f64).filter(|v| *v > 0.0);
        let text = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .filter(|s| !s.trim().is_empty())
        };

        let goals = body.get("fitness_goals").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(FitnessGoal::from)
                .collect::<Vec<_>>()
        });

        Self::new(
            positive("height"),
            positive("weight"),
            body.get("age").and_then(Value::as_i64).filter(|a| *a > 0),
            text("gender"),
            goals,
            text("activity_level").map(ActivityLevel::from),
        )
    }

    pub fn primary_goal(&self) -> FitnessGoal {
        self.fitness_goals.first().cloned().unwrap_or(DEFAULT_GOAL)
    }

    pub fn is_female(&self) -> bool {
        self.gender.as_deref() == Some("female")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_goals_default_to_single_goal() {
        let req = RoutineRequest::new(None, None, None, None, None, None);
        assert_eq!(req.fitness_goals, vec![FitnessGoal::GainMuscle]);
        assert_eq!(req.activity_level, ActivityLevel::Moderate);

        let req = RoutineRequest::new(None, None, None, None, Some(vec![]), None);
        assert_eq!(req.fitness_goals, vec![FitnessGoal::GainMuscle]);
    }

    #[test]
    fn from_json_tolerates_wrong_types() {
        let req = RoutineRequest::from_json(&json!({
            "height": "tall",
            "weight": 72.5,
            "age": 31,
            "gender": "",
            "fitness_goals": "lose_weight",
            "activity_level": null
        }));
        assert_eq!(req.height, None);
        assert_eq!(req.weight, Some(72.5));
        assert_eq!(req.age, Some(31));
        assert_eq!(req.gender, None);
        assert_eq!(req.fitness_goals, vec![FitnessGoal::GainMuscle]);
        assert_eq!(req.activity_level, ActivityLevel::Moderate);
    }

    #[test]
    fn from_json_keeps_given_values() {
        let req = RoutineRequest::from_json(&json!({
            "gender": "female",
            "fitness_goals": ["lose_weight", "stay_fit"],
            "activity_level": "active"
        }));
        assert!(req.is_female());
        assert_eq!(req.primary_goal(), FitnessGoal::LoseWeight);
        assert_eq!(req.fitness_goals.len(), 2);
        assert_eq!(req.activity_level, ActivityLevel::Active);
    }

    #[test]
    fn routine_serializes_camel_case() {
        let routine = GeneratedRoutine {
            weekly_plan: vec![WorkoutDay {
                day: "Lunes".into(),
                focus: "Pierna".into(),
                exercises: vec![Exercise {
                    name: "Sentadilla".into(),
                    sets: 4,
                    reps: "8-12".into(),
                    rest: "90 segundos".into(),
                    muscle_group: "Piernas".into(),
                    description: None,
                }],
                notes: None,
            }],
            nutrition_tips: vec![Tip::new("Hidratación", "Bebe agua")],
            beginner_tips: vec![],
        };
        let json = serde_json::to_value(&routine).unwrap();
        assert_eq!(json["weeklyPlan"][0]["exercises"][0]["muscleGroup"], "Piernas");
        assert!(json["weeklyPlan"][0].get("notes").is_none());
        assert!(json["beginnerTips"].as_array().unwrap().is_empty());
    }
}
