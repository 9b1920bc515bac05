//! Routine generation: prompt, model call, normalization, fallback, storage.

pub mod fallback;
pub mod generator;
pub mod model;
pub mod normalize;
pub mod orchestrator;
pub mod prompt;
pub mod routes;

pub use fallback::fallback_routine;
pub use generator::{GenerationOutcome, RoutineGenerator, RoutineSource};
pub use model::{Exercise, GeneratedRoutine, RoutineRequest, Tip, WorkoutDay};
pub use normalize::normalize_routine;
pub use orchestrator::{RoutineOrchestrator, RoutineResult};
pub use prompt::build_routine_prompt;
pub use routes::{RoutineRouteState, routine_routes};
