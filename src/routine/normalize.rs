//! Normalization of model output into [`GeneratedRoutine`].
//!
//! Models answer with Spanish keys, English keys, or a mix. Every canonical
//! field has an ordered list of [`Accessor`]s that are tried first-match-wins.
//! A field that no accessor resolves takes its documented default, so a
//! well-formed object always normalizes.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::NormalizationError;

use super::model::{Exercise, GeneratedRoutine, Tip, WorkoutDay};

/// One way of reading a field from a raw object.
#[derive(Debug, Clone, Copy)]
pub enum Accessor {
    /// Read the value under this key.
    Key(&'static str),
    /// Read a number of seconds under this key and render it as "<n> segundos".
    SecondsLabel(&'static str),
}

// ── Field tables ────────────────────────────────────────────────────────
// Native (Spanish) keys come before English keys.

/// Top level `weeklyPlan`.
pub const WEEKLY_PLAN: &[Accessor] = &[Accessor::Key("planSemanal"), Accessor::Key("weeklyPlan")];
/// Top level `nutritionTips`.
pub const NUTRITION_TIPS: &[Accessor] = &[
    Accessor::Key("consejosNutricion"),
    Accessor::Key("nutritionTips"),
];
/// Top level `beginnerTips`.
pub const BEGINNER_TIPS: &[Accessor] = &[
    Accessor::Key("consejosPrincipiantes"),
    Accessor::Key("beginnerTips"),
];

/// Day label. Default: empty string.
pub const DAY: &[Accessor] = &[Accessor::Key("dia"), Accessor::Key("day")];
/// Day focus. Default: [`DEFAULT_FOCUS`].
pub const FOCUS: &[Accessor] = &[Accessor::Key("enfoque"), Accessor::Key("focus")];
/// Day exercises. Default: empty list.
pub const EXERCISES: &[Accessor] = &[Accessor::Key("ejercicios"), Accessor::Key("exercises")];
/// Day notes. Default: absent.
pub const NOTES: &[Accessor] = &[Accessor::Key("notas"), Accessor::Key("notes")];

/// Exercise name. Default: empty string.
pub const NAME: &[Accessor] = &[Accessor::Key("nombre"), Accessor::Key("name")];
/// Exercise sets, number or numeric string. Default: 0.
pub const SETS: &[Accessor] = &[Accessor::Key("series"), Accessor::Key("sets")];
/// Exercise reps, numbers are stringified. Default: empty string.
pub const REPS: &[Accessor] = &[Accessor::Key("repeticiones"), Accessor::Key("reps")];
/// Exercise rest. A numeric seconds field wins over text. Default: empty string.
pub const REST: &[Accessor] = &[
    Accessor::SecondsLabel("descanso_segundos"),
    Accessor::Key("descanso"),
    Accessor::Key("rest"),
];
/// Exercise muscle group. Default: [`DEFAULT_MUSCLE_GROUP`].
pub const MUSCLE_GROUP: &[Accessor] = &[
    Accessor::Key("grupoMuscular"),
    Accessor::Key("grupo_muscular"),
    Accessor::Key("muscleGroup"),
];
/// Exercise description. Default: absent.
pub const DESCRIPTION: &[Accessor] = &[Accessor::Key("descripcion"), Accessor::Key("description")];

/// Tip title. Default depends on the list.
pub const TIP_TITLE: &[Accessor] = &[Accessor::Key("titulo"), Accessor::Key("title")];
/// Tip body. Default: empty string.
pub const TIP_DESCRIPTION: &[Accessor] = &[
    Accessor::Key("consejo"),
    Accessor::Key("descripcion"),
    Accessor::Key("description"),
];

pub const DEFAULT_FOCUS: &str = "Entrenamiento general";
pub const DEFAULT_MUSCLE_GROUP: &str = "General";
pub const DEFAULT_NUTRITION_TITLE: &str = "Consejo de nutrición";
pub const DEFAULT_BEGINNER_TITLE: &str = "Consejo útil";

/// Keys a model sometimes wraps the whole document in.
const WRAPPER_KEYS: &[&str] = &["routine", "rutina"];

// ── Resolution ──────────────────────────────────────────────────────────

/// Whether a raw value counts as provided.
///
/// Null, blank strings, zero and empty arrays are treated as missing so the
/// next accessor gets a chance.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(items) => !items.is_empty(),
        Value::Bool(_) | Value::Object(_) => true,
    }
}

/// Resolve a field through its accessors, first match wins.
///
/// A present value that `convert` rejects falls through to the next accessor.
pub fn resolve<T>(
    obj: &Map<String, Value>,
    accessors: &[Accessor],
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    accessors.iter().find_map(|accessor| match *accessor {
        Accessor::Key(key) => obj.get(key).filter(|v| is_present(v)).and_then(&convert),
        Accessor::SecondsLabel(key) => obj
            .get(key)
            .filter(|v| is_present(v))
            .and_then(scalar_text)
            .and_then(|secs| convert(&Value::String(format!("{secs} segundos")))),
    })
}

/// Render a scalar as text. Integral floats drop their fraction.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 => format!("{f:.0}"),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_field(obj: &Map<String, Value>, accessors: &[Accessor]) -> Option<String> {
    resolve(obj, accessors, scalar_text)
}

fn text_or(obj: &Map<String, Value>, accessors: &[Accessor], default: &str) -> String {
    text_field(obj, accessors).unwrap_or_else(|| default.to_string())
}

fn count_field(obj: &Map<String, Value>, accessors: &[Accessor]) -> u32 {
    resolve(obj, accessors, count_value).unwrap_or(0)
}

fn count_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f.round() as u64))
            .map(|v| v.min(u64::from(u32::MAX)) as u32),
        Value::String(s) => leading_number(s),
        _ => None,
    }
}

/// Parse the leading integer of strings like "4" or "3-4 series".
fn leading_number(s: &str) -> Option<u32> {
    let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn objects(obj: &Map<String, Value>, accessors: &[Accessor], what: &str) -> Vec<Map<String, Value>> {
    match resolve(obj, accessors, |v| v.as_array().cloned()) {
        Some(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                other => {
                    debug!(list = what, value = %other, "Skipping non-object list entry");
                    None
                }
            })
            .collect(),
        None => Vec::new(),
    }
}

// ── Public API ──────────────────────────────────────────────────────────

/// Normalize a raw routine document.
///
/// Fails only when `raw` is not a JSON object.
pub fn normalize_routine(raw: &Value) -> Result<GeneratedRoutine, NormalizationError> {
    let root = raw.as_object().ok_or(NormalizationError::NotAnObject {
        found: kind(raw),
    })?;
    let root = unwrap_document(root);

    let weekly_plan = objects(root, WEEKLY_PLAN, "weeklyPlan")
        .iter()
        .map(normalize_day)
        .collect();
    let nutrition_tips = objects(root, NUTRITION_TIPS, "nutritionTips")
        .iter()
        .map(|t| normalize_tip(t, DEFAULT_NUTRITION_TITLE))
        .collect();
    let beginner_tips = objects(root, BEGINNER_TIPS, "beginnerTips")
        .iter()
        .map(|t| normalize_tip(t, DEFAULT_BEGINNER_TITLE))
        .collect();

    Ok(GeneratedRoutine {
        weekly_plan,
        nutrition_tips,
        beginner_tips,
    })
}

/// Parse model text and normalize it.
pub fn normalize_text(text: &str) -> Result<GeneratedRoutine, NormalizationError> {
    let value = parse_document(text)?;
    normalize_routine(&value)
}

/// Parse model text into JSON, tolerating markdown fences and chatter around
/// the object.
pub fn parse_document(text: &str) -> Result<Value, NormalizationError> {
    let candidate = extract_json_object(text);
    Ok(serde_json::from_str(candidate)?)
}

/// Body of the first markdown code fence, with or without a `json` tag.
static FENCED_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").ok());

/// Narrow model output down to the outermost JSON object.
fn extract_json_object(text: &str) -> &str {
    let mut trimmed = text.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }
    if let Some(inner) = FENCED_BLOCK
        .as_ref()
        .and_then(|re| re.captures(trimmed))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
    {
        if inner.starts_with('{') {
            return inner;
        }
        trimmed = inner;
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Descend into `{"routine": {...}}` style wrappers when the top level has
/// no plan of its own.
fn unwrap_document(root: &Map<String, Value>) -> &Map<String, Value> {
    if resolve(root, WEEKLY_PLAN, |v| v.as_array().map(|_| ())).is_some() {
        return root;
    }
    WRAPPER_KEYS
        .iter()
        .find_map(|key| root.get(*key).and_then(Value::as_object))
        .unwrap_or(root)
}

fn normalize_day(day: &Map<String, Value>) -> WorkoutDay {
    WorkoutDay {
        day: text_or(day, DAY, ""),
        focus: text_or(day, FOCUS, DEFAULT_FOCUS),
        exercises: objects(day, EXERCISES, "exercises")
            .iter()
            .map(normalize_exercise)
            .collect(),
        notes: text_field(day, NOTES),
    }
}

fn normalize_exercise(exercise: &Map<String, Value>) -> Exercise {
    Exercise {
        name: text_or(exercise, NAME, ""),
        sets: count_field(exercise, SETS),
        reps: text_or(exercise, REPS, ""),
        rest: text_or(exercise, REST, ""),
        muscle_group: text_or(exercise, MUSCLE_GROUP, DEFAULT_MUSCLE_GROUP),
        description: text_field(exercise, DESCRIPTION),
    }
}

fn normalize_tip(tip: &Map<String, Value>, default_title: &str) -> Tip {
    Tip {
        title: text_or(tip, TIP_TITLE, default_title),
        description: text_or(tip, TIP_DESCRIPTION, ""),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn spanish_minimal_document() {
        let raw = json!({"weeklyPlan":[{"dia":"Lunes","ejercicios":[{"nombre":"Sentadilla","series":4}]}]});
        let routine = normalize_routine(&raw).unwrap();

        assert_eq!(routine.weekly_plan.len(), 1);
        let day = &routine.weekly_plan[0];
        assert_eq!(day.day, "Lunes");
        assert_eq!(day.focus, DEFAULT_FOCUS);
        assert_eq!(day.exercises.len(), 1);

        let ex = &day.exercises[0];
        assert_eq!(ex.name, "Sentadilla");
        assert_eq!(ex.sets, 4);
        assert_eq!(ex.reps, "");
        assert_eq!(ex.rest, "");
        assert_eq!(ex.muscle_group, DEFAULT_MUSCLE_GROUP);
        assert!(ex.description.is_none());

        assert!(routine.nutrition_tips.is_empty());
        assert!(routine.beginner_tips.is_empty());
    }

    #[test]
    fn spanish_and_english_keys_are_equivalent() {
        let spanish = json!({
            "planSemanal": [{
                "dia": "Martes",
                "enfoque": "Espalda",
                "notas": "Calienta bien",
                "ejercicios": [{
                    "nombre": "Remo",
                    "series": 3,
                    "repeticiones": "10-12",
                    "descanso": "60 segundos",
                    "grupoMuscular": "Espalda",
                    "descripcion": "Espalda recta"
                }]
            }],
            "consejosNutricion": [{"titulo": "Proteína", "consejo": "Come huevos"}],
            "consejosPrincipiantes": [{"titulo": "Técnica", "descripcion": "Primero la forma"}]
        });
        let english = json!({
            "weeklyPlan": [{
                "day": "Martes",
                "focus": "Espalda",
                "notes": "Calienta bien",
                "exercises": [{
                    "name": "Remo",
                    "sets": 3,
                    "reps": "10-12",
                    "rest": "60 segundos",
                    "muscleGroup": "Espalda",
                    "description": "Espalda recta"
                }]
            }],
            "nutritionTips": [{"title": "Proteína", "description": "Come huevos"}],
            "beginnerTips": [{"title": "Técnica", "description": "Primero la forma"}]
        });

        assert_eq!(
            normalize_routine(&spanish).unwrap(),
            normalize_routine(&english).unwrap()
        );
    }

    #[test]
    fn native_key_wins_over_english() {
        let raw = json!({"weeklyPlan":[{"dia":"Lunes","day":"Monday","enfoque":"Pecho","focus":"Chest"}]});
        let routine = normalize_routine(&raw).unwrap();
        assert_eq!(routine.weekly_plan[0].day, "Lunes");
        assert_eq!(routine.weekly_plan[0].focus, "Pecho");
    }

    #[test]
    fn empty_values_fall_through() {
        let raw = json!({"weeklyPlan":[{"dia":"","day":"Monday","exercises":[{"series":0,"sets":"5","nombre":null,"name":"Press"}]}]});
        let routine = normalize_routine(&raw).unwrap();
        let day = &routine.weekly_plan[0];
        assert_eq!(day.day, "Monday");
        assert_eq!(day.exercises[0].sets, 5);
        assert_eq!(day.exercises[0].name, "Press");
    }

    #[test]
    fn non_scalar_values_fall_through() {
        let raw = json!({"weeklyPlan":[{
            "dia": {},
            "day": "Lunes",
            "ejercicios": {"nombre": "Sentadilla"},
            "exercises": [{"nombre": ["Remo"], "name": "Remo", "series": "muchas", "sets": 3}]
        }]});
        let routine = normalize_routine(&raw).unwrap();
        let day = &routine.weekly_plan[0];
        assert_eq!(day.day, "Lunes");
        assert_eq!(day.exercises.len(), 1);
        assert_eq!(day.exercises[0].name, "Remo");
        assert_eq!(day.exercises[0].sets, 3);
    }

    #[test]
    fn rest_seconds_field_builds_label() {
        let raw = json!({"weeklyPlan":[{"ejercicios":[
            {"nombre":"A","descanso_segundos":90,"descanso":"2 minutos"},
            {"nombre":"B","descanso":"2 minutos"},
            {"nombre":"C","rest":"45s"}
        ]}]});
        let routine = normalize_routine(&raw).unwrap();
        let ex = &routine.weekly_plan[0].exercises;
        assert_eq!(ex[0].rest, "90 segundos");
        assert_eq!(ex[1].rest, "2 minutos");
        assert_eq!(ex[2].rest, "45s");
    }

    #[test]
    fn numeric_reps_are_stringified() {
        let raw = json!({"weeklyPlan":[{"ejercicios":[{"repeticiones":12,"sets":3.0}]}]});
        let routine = normalize_routine(&raw).unwrap();
        let ex = &routine.weekly_plan[0].exercises[0];
        assert_eq!(ex.reps, "12");
        assert_eq!(ex.sets, 3);
    }

    #[test]
    fn tip_defaults_per_list() {
        let raw = json!({"nutritionTips":[{}],"beginnerTips":[{"consejo":"Descansa"}]});
        let routine = normalize_routine(&raw).unwrap();
        assert_eq!(routine.nutrition_tips[0].title, DEFAULT_NUTRITION_TITLE);
        assert_eq!(routine.nutrition_tips[0].description, "");
        assert_eq!(routine.beginner_tips[0].title, DEFAULT_BEGINNER_TITLE);
        assert_eq!(routine.beginner_tips[0].description, "Descansa");
    }

    #[test]
    fn missing_lists_become_empty() {
        let routine = normalize_routine(&json!({})).unwrap();
        assert!(routine.is_empty());

        let routine = normalize_routine(&json!({"weeklyPlan": "nope"})).unwrap();
        assert!(routine.weekly_plan.is_empty());
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let raw = json!({"weeklyPlan":["Lunes", {"day":"Martes"}, 3]});
        let routine = normalize_routine(&raw).unwrap();
        assert_eq!(routine.weekly_plan.len(), 1);
        assert_eq!(routine.weekly_plan[0].day, "Martes");
    }

    #[test]
    fn wrapped_document_is_unwrapped() {
        let raw = json!({"rutina": {"weeklyPlan":[{"day":"Jueves"}]}});
        let routine = normalize_routine(&raw).unwrap();
        assert_eq!(routine.weekly_plan[0].day, "Jueves");
    }

    #[test]
    fn non_object_input_is_an_error() {
        assert!(matches!(
            normalize_routine(&json!([1, 2])),
            Err(NormalizationError::NotAnObject { found: "array" })
        ));
        assert!(matches!(
            normalize_routine(&Value::Null),
            Err(NormalizationError::NotAnObject { found: "null" })
        ));
    }

    #[test]
    fn parse_document_strips_fences_and_chatter() {
        let text = "Aquí tienes tu rutina:\n```json\n{\"weeklyPlan\":[{\"day\":\"Lunes\"}]}\n```";
        let routine = normalize_text(text).unwrap();
        assert_eq!(routine.weekly_plan[0].day, "Lunes");

        assert!(matches!(
            parse_document("no json here"),
            Err(NormalizationError::InvalidJson(_))
        ));
    }

    #[test]
    fn canonical_output_renormalizes_to_itself() {
        let raw = json!({"weeklyPlan":[{"dia":"Lunes","ejercicios":[{"nombre":"Sentadilla","series":4,"repeticiones":"8-10","descanso":"90 segundos","grupoMuscular":"Piernas"}]}],"nutritionTips":[{"titulo":"Agua","consejo":"2 litros"}]});
        let once = normalize_routine(&raw).unwrap();
        let twice = normalize_routine(&serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }
}
