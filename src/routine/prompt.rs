//! Prompt construction for routine generation.
//!
//! Output is Spanish, matching the persona in [`ROUTINE_SYSTEM_PROMPT`].

use crate::profile::model::{ExperienceTier, FitnessGoal};

use super::model::RoutineRequest;

/// Fixed persona for routine generation.
pub const ROUTINE_SYSTEM_PROMPT: &str = "Eres un entrenador personal experto especializado en crear \
planes de fitness personalizados. Responde solo en español y en el formato JSON solicitado.";

const MUSCLE_DIRECTIVE: &str = "Si el objetivo es ganar músculo: incluye ejercicios compuestos, \
series de 8-12 repeticiones, y enfatiza la progresión de peso (sobrecarga progresiva).";
const WEIGHT_LOSS_DIRECTIVE: &str = "Si el objetivo es perder peso: incluye circuitos, cardio HIIT, \
y ejercicios que quemen más calorías.";
const ENDURANCE_DIRECTIVE: &str = "Si el objetivo es mejorar resistencia: incluye series más largas, \
descansos más cortos y ejercicios funcionales.";

const SCHEMA_DIRECTIVE: &str = r#"Formatea la respuesta como un único objeto JSON con exactamente estas secciones:
{
  "weeklyPlan": [
    {
      "day": "Lunes",
      "focus": "string",
      "exercises": [
        {
          "name": "string",
          "sets": 4,
          "reps": "8-12",
          "rest": "90 segundos",
          "muscleGroup": "string",
          "description": "string"
        }
      ],
      "notes": "string"
    }
  ],
  "nutritionTips": [{ "title": "string", "description": "string" }],
  "beginnerTips": [{ "title": "string", "description": "string" }]
}
- weeklyPlan: array de objetos día (3-5 días por semana)
- nutritionTips: array de 5 consejos de nutrición ajustados al objetivo principal
- beginnerTips: array de 3 recomendaciones para el nivel de experiencia indicado"#;

fn goal_directive(goal: &FitnessGoal) -> Option<&'static str> {
    match goal {
        FitnessGoal::GainMuscle => Some(MUSCLE_DIRECTIVE),
        FitnessGoal::LoseWeight => Some(WEIGHT_LOSS_DIRECTIVE),
        FitnessGoal::StayFit | FitnessGoal::ImproveEndurance => Some(ENDURANCE_DIRECTIVE),
        FitnessGoal::Other(_) => None,
    }
}

fn tier_directive(tier: ExperienceTier) -> &'static str {
    match tier {
        ExperienceTier::Low => {
            "Para nivel principiante: menos volumen, más explicaciones técnicas y ejercicios guiados."
        }
        ExperienceTier::Medium => "Para nivel intermedio: volumen moderado, variación de ejercicios.",
        ExperienceTier::High => {
            "Para nivel avanzado: mayor volumen, técnicas avanzadas como supersets o dropsets."
        }
    }
}

fn audience(gender: Option<&str>) -> &'static str {
    match gender {
        Some("male") => "UN HOMBRE",
        Some("female") => "UNA MUJER",
        _ => "UNA PERSONA",
    }
}

fn or_placeholder<T: std::fmt::Display>(value: Option<T>, placeholder: &str) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| placeholder.to_string())
}

/// Build the user prompt for a routine request.
pub fn build_routine_prompt(request: &RoutineRequest) -> String {
    let goals = request
        .fitness_goals
        .iter()
        .map(FitnessGoal::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let level = request.activity_level.as_str();

    let mut goal_lines: Vec<&str> = Vec::new();
    for directive in request.fitness_goals.iter().filter_map(goal_directive) {
        if !goal_lines.contains(&directive) {
            goal_lines.push(directive);
        }
    }
    if goal_lines.is_empty() {
        goal_lines = vec![MUSCLE_DIRECTIVE, WEIGHT_LOSS_DIRECTIVE, ENDURANCE_DIRECTIVE];
    }

    let mut prompt = String::new();
    prompt.push_str("Genera una rutina de ejercicios personalizada basada en los siguientes datos:\n");
    prompt.push_str(&format!(
        "- Altura: {} cm\n",
        or_placeholder(request.height, "No especificada")
    ));
    prompt.push_str(&format!(
        "- Peso: {} kg\n",
        or_placeholder(request.weight, "No especificado")
    ));
    prompt.push_str(&format!(
        "- Edad: {} años\n",
        or_placeholder(request.age, "No especificada")
    ));
    prompt.push_str(&format!(
        "- Género: {}\n",
        or_placeholder(request.gender.as_deref(), "No especificado")
    ));
    prompt.push_str(&format!("- Objetivos: {goals}\n"));
    prompt.push_str(&format!("- Nivel de actividad: {level}\n\n"));

    prompt.push_str("IMPORTANTE:\n");
    prompt.push_str(&format!(
        "- ADAPTA LA RUTINA ESPECÍFICAMENTE PARA {}.\n",
        audience(request.gender.as_deref())
    ));
    prompt.push_str(&format!("- ENFOCA EL PLAN EN LOS OBJETIVOS: {goals}.\n"));
    prompt.push_str(&format!(
        "- AJUSTA LA INTENSIDAD SEGÚN EL NIVEL DE ACTIVIDAD: {level}.\n\n"
    ));

    for line in goal_lines {
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push('\n');
    prompt.push_str(tier_directive(request.activity_level.tier()));
    prompt.push_str("\n\n");

    prompt.push_str(
        "Proporciona un plan de entrenamiento semanal detallado con:\n\
         1. Ejercicios específicos para cada día (3-5 días por semana)\n\
         2. Series y repeticiones para cada ejercicio\n\
         3. Descanso recomendado entre series\n\
         4. Consejos de nutrición básicos (5 consejos) ajustados al objetivo principal\n\
         5. Recomendaciones para el nivel de experiencia indicado (3 consejos)\n\n",
    );
    prompt.push_str(SCHEMA_DIRECTIVE);
    prompt
}
