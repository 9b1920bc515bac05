//! Rule-based default routine.
//!
//! Served in development mode and whenever model generation fails. Output
//! depends only on the request, so repeated calls are identical.

use crate::profile::model::{ExperienceTier, FitnessGoal};

use super::model::{Exercise, GeneratedRoutine, RoutineRequest, Tip, WorkoutDay};

/// Training emphasis picked from the primary goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emphasis {
    Muscle,
    FatLoss,
    Endurance,
}

impl Emphasis {
    fn from_goal(goal: &FitnessGoal) -> Self {
        match goal {
            FitnessGoal::GainMuscle => Self::Muscle,
            FitnessGoal::LoseWeight => Self::FatLoss,
            _ => Self::Endurance,
        }
    }

    /// Focus labels for Monday, Wednesday and Friday.
    fn focus(self) -> [&'static str; 3] {
        match self {
            Self::Muscle => ["Pecho y Tríceps", "Espalda y Bíceps", "Piernas y Hombros"],
            Self::FatLoss => ["Full Body HIIT", "Cardio y Core", "Circuito Quema Grasa"],
            Self::Endurance => [
                "Resistencia Superior",
                "Resistencia Media",
                "Resistencia Inferior",
            ],
        }
    }
}

/// Sets for the main lift of a day, scaled by experience.
fn main_sets(tier: ExperienceTier) -> u32 {
    match tier {
        ExperienceTier::Low => 3,
        ExperienceTier::Medium => 4,
        ExperienceTier::High => 5,
    }
}

/// Sets for secondary lifts: one less for beginners.
fn accessory_sets(tier: ExperienceTier, base: u32) -> u32 {
    if tier == ExperienceTier::Low {
        base - 1
    } else {
        base
    }
}

fn exercise(
    name: &str,
    sets: u32,
    reps: &str,
    rest: &str,
    muscle_group: &str,
    description: &str,
) -> Exercise {
    Exercise {
        name: name.to_string(),
        sets,
        reps: reps.to_string(),
        rest: rest.to_string(),
        muscle_group: muscle_group.to_string(),
        description: Some(description.to_string()),
    }
}

/// Build the default routine for a request.
pub fn fallback_routine(request: &RoutineRequest) -> GeneratedRoutine {
    let emphasis = Emphasis::from_goal(&request.primary_goal());
    let tier = request.activity_level.tier();
    let [monday, wednesday, friday] = emphasis.focus();
    let muscle = emphasis == Emphasis::Muscle;

    let press = if request.is_female() {
        "Press de banca con mancuernas"
    } else {
        "Press de banca"
    };

    let weekly_plan = vec![
        WorkoutDay {
            day: "Lunes".to_string(),
            focus: monday.to_string(),
            exercises: vec![
                exercise(
                    press,
                    main_sets(tier),
                    if muscle { "8-10" } else { "12-15" },
                    if muscle { "90 segundos" } else { "60 segundos" },
                    "Pecho",
                    "Mantén los codos a 45 grados del cuerpo y baja controladamente.",
                ),
                exercise(
                    "Fondos asistidos",
                    accessory_sets(tier, 3),
                    "8-12",
                    "90 segundos",
                    "Tríceps",
                    "Si eres principiante, usa máquina de asistencia.",
                ),
                exercise(
                    "Flexiones",
                    3,
                    "Hasta el fallo",
                    "60 segundos",
                    "Pecho/Tríceps",
                    "Adapta la variante a tu nivel.",
                ),
            ],
            notes: Some("Enfócate en la técnica correcta y no en el peso.".to_string()),
        },
        WorkoutDay {
            day: "Miércoles".to_string(),
            focus: wednesday.to_string(),
            exercises: vec![
                exercise(
                    "Dominadas asistidas",
                    accessory_sets(tier, 4),
                    "6-8",
                    "90 segundos",
                    "Espalda",
                    "Usa banda elástica si eres principiante.",
                ),
                exercise(
                    "Remo con mancuerna",
                    3,
                    "10-12",
                    "60 segundos",
                    "Espalda",
                    "Mantén la espalda recta durante todo el movimiento.",
                ),
                exercise(
                    "Curl de bíceps",
                    3,
                    "12",
                    "60 segundos",
                    "Bíceps",
                    "Evita balancear el cuerpo.",
                ),
            ],
            notes: None,
        },
        WorkoutDay {
            day: "Viernes".to_string(),
            focus: friday.to_string(),
            exercises: vec![
                exercise(
                    "Sentadillas",
                    accessory_sets(tier, 4),
                    if muscle { "8-10" } else { "15-20" },
                    "90 segundos",
                    "Piernas",
                    "Baja hasta que tus muslos estén paralelos al suelo.",
                ),
                exercise(
                    "Peso muerto rumano",
                    accessory_sets(tier, 4),
                    "10-12",
                    "90 segundos",
                    "Isquiotibiales/Glúteos",
                    "Mantén la espalda recta y baja controladamente.",
                ),
                exercise(
                    "Press de hombro",
                    3,
                    "10-12",
                    "60 segundos",
                    "Hombros",
                    "No arquees la espalda durante el movimiento.",
                ),
            ],
            notes: None,
        },
    ];

    let calories = if muscle {
        Tip::new(
            "Proteína suficiente",
            "Consume 1.6-2g de proteína por kg de peso corporal para facilitar la recuperación muscular.",
        )
    } else {
        Tip::new(
            "Control de calorías",
            "Mantén un déficit calórico moderado de 300-500 calorías para perder grasa gradualmente.",
        )
    };

    let nutrition_tips = vec![
        calories,
        Tip::new(
            "Hidratación",
            "Bebe al menos 2-3 litros de agua diariamente, aumentando la cantidad los días de entrenamiento.",
        ),
        Tip::new(
            "Timing de comidas",
            "Consume proteínas y carbohidratos dentro de los 30-60 minutos posteriores al entrenamiento.",
        ),
        Tip::new(
            "Alimentos integrales",
            "Prioriza alimentos no procesados como carnes magras, pescado, huevos, vegetales, frutas y granos enteros.",
        ),
    ];

    let beginner_tips = vec![
        Tip::new(
            "Técnica primero",
            "Enfócate en dominar la técnica correcta antes de aumentar el peso o la intensidad.",
        ),
        Tip::new(
            "Progresión gradual",
            "Aumenta el peso o las repeticiones gradualmente cada 1-2 semanas.",
        ),
        Tip::new(
            "Consistencia",
            "La regularidad es más importante que la intensidad. Entrenar moderadamente 3 veces por semana rinde más que hacerlo intensamente solo cuando te sientas motivado.",
        ),
    ];

    GeneratedRoutine {
        weekly_plan,
        nutrition_tips,
        beginner_tips,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::model::ActivityLevel;

    fn request(goal: FitnessGoal, level: ActivityLevel, gender: Option<&str>) -> RoutineRequest {
        RoutineRequest::new(
            Some(165.0),
            Some(60.0),
            Some(27),
            gender.map(str::to_string),
            Some(vec![goal]),
            Some(level),
        )
    }

    #[test]
    fn weight_loss_female_active() {
        let routine = fallback_routine(&request(
            FitnessGoal::LoseWeight,
            ActivityLevel::Active,
            Some("female"),
        ));

        let days: Vec<_> = routine.weekly_plan.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(days, ["Lunes", "Miércoles", "Viernes"]);
        assert_eq!(routine.weekly_plan[0].focus, "Full Body HIIT");
        assert_eq!(routine.weekly_plan[1].focus, "Cardio y Core");
        assert_eq!(routine.weekly_plan[2].focus, "Circuito Quema Grasa");

        let press = &routine.weekly_plan[0].exercises[0];
        assert_eq!(press.name, "Press de banca con mancuernas");
        assert_eq!(press.sets, 5);
        assert_eq!(press.reps, "12-15");
        assert_eq!(press.rest, "60 segundos");

        assert_eq!(routine.nutrition_tips.len(), 4);
        assert_eq!(routine.nutrition_tips[0].title, "Control de calorías");
        assert_eq!(routine.beginner_tips.len(), 3);
    }

    #[test]
    fn muscle_gain_uses_heavier_scheme() {
        let routine = fallback_routine(&request(
            FitnessGoal::GainMuscle,
            ActivityLevel::Moderate,
            Some("male"),
        ));
        assert_eq!(routine.weekly_plan[0].focus, "Pecho y Tríceps");
        let press = &routine.weekly_plan[0].exercises[0];
        assert_eq!(press.name, "Press de banca");
        assert_eq!(press.sets, 4);
        assert_eq!(press.reps, "8-10");
        assert_eq!(press.rest, "90 segundos");
        assert_eq!(routine.nutrition_tips[0].title, "Proteína suficiente");
    }

    #[test]
    fn other_goals_get_endurance_focus() {
        let routine = fallback_routine(&request(
            FitnessGoal::StayFit,
            ActivityLevel::Beginner,
            None,
        ));
        assert_eq!(routine.weekly_plan[0].focus, "Resistencia Superior");
        assert_eq!(routine.weekly_plan[0].exercises[0].sets, 3);
        assert_eq!(routine.weekly_plan[0].exercises[1].sets, 2);
        assert_eq!(routine.weekly_plan[1].exercises[0].sets, 3);
    }

    #[test]
    fn output_is_byte_identical() {
        let req = request(FitnessGoal::LoseWeight, ActivityLevel::Active, Some("female"));
        let a = serde_json::to_string(&fallback_routine(&req)).unwrap();
        let b = serde_json::to_string(&fallback_routine(&req)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn renormalizes_unchanged() {
        let routine = fallback_routine(&request(
            FitnessGoal::GainMuscle,
            ActivityLevel::Advanced,
            None,
        ));
        let value = serde_json::to_value(&routine).unwrap();
        let again = crate::routine::normalize::normalize_routine(&value).unwrap();
        assert_eq!(again, routine);
    }
}
