//! Per-user routine flow: cache lookup, profile fetch, generation, upsert.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{DatabaseError, RoutineError};
use crate::profile::model::UserProfile;
use crate::store::Database;

use super::generator::{GenerationOutcome, RoutineGenerator, RoutineSource};
use super::model::{GeneratedRoutine, RoutineRequest};
use super::normalize::normalize_routine;

/// A routine handed back to a caller, with where it came from.
#[derive(Debug, Clone)]
pub struct RoutineResult {
    pub routine: GeneratedRoutine,
    /// `None` when served from the store.
    pub source: Option<RoutineSource>,
}

pub struct RoutineOrchestrator {
    db: Arc<dyn Database>,
    generator: Arc<RoutineGenerator>,
}

impl RoutineOrchestrator {
    pub fn new(db: Arc<dyn Database>, generator: Arc<RoutineGenerator>) -> Self {
        Self { db, generator }
    }

    /// Return the stored routine, generating and storing one if there is none.
    pub async fn get_or_generate(&self, user_id: &str) -> Result<RoutineResult, RoutineError> {
        if let Some(routine) = self.cached(user_id).await? {
            info!(user_id, "Serving stored routine");
            return Ok(RoutineResult {
                routine,
                source: None,
            });
        }
        self.generate_and_store(user_id).await
    }

    /// Generate a new routine and overwrite the stored one.
    pub async fn regenerate(&self, user_id: &str) -> Result<RoutineResult, RoutineError> {
        info!(user_id, "Regenerating routine");
        self.generate_and_store(user_id).await
    }

    /// The stored routine, normalized. Never generates.
    pub async fn current_routine(
        &self,
        user_id: &str,
    ) -> Result<Option<GeneratedRoutine>, RoutineError> {
        self.cached(user_id).await
    }

    async fn cached(&self, user_id: &str) -> Result<Option<GeneratedRoutine>, RoutineError> {
        let Some(stored) = self.db.get_routine(user_id).await? else {
            debug!(user_id, "No stored routine");
            return Ok(None);
        };
        if !stored.has_content() {
            debug!(user_id, "Stored routine is empty");
            return Ok(None);
        }
        match normalize_routine(&stored.routine_data) {
            Ok(routine) if routine.is_empty() => {
                debug!(user_id, "Stored routine has no plan and no tips");
                Ok(None)
            }
            Ok(routine) => Ok(Some(routine)),
            Err(e) => {
                warn!(user_id, error = %e, "Stored routine unreadable, treating as absent");
                Ok(None)
            }
        }
    }

    async fn load_profile(&self, user_id: &str) -> Result<UserProfile, RoutineError> {
        let profile = self
            .db
            .get_profile(user_id)
            .await?
            .ok_or_else(|| RoutineError::ProfileNotFound {
                user_id: user_id.to_string(),
            })?;

        let missing = profile.missing_routine_fields();
        if !missing.is_empty() {
            return Err(RoutineError::ProfileIncomplete {
                user_id: user_id.to_string(),
                missing: missing.join(", "),
            });
        }
        Ok(profile)
    }

    async fn generate_and_store(&self, user_id: &str) -> Result<RoutineResult, RoutineError> {
        let profile = self.load_profile(user_id).await?;
        let request = RoutineRequest::from_profile(&profile);
        debug!(
            user_id,
            goals = ?request.fitness_goals,
            level = %request.activity_level,
            "Profile loaded, generating routine"
        );

        let GenerationOutcome { routine, source } =
            self.generator.generate_with_fallback(&request).await;

        let document = serde_json::to_value(&routine)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.db.upsert_routine(user_id, &document).await?;

        info!(
            user_id,
            source = source.as_str(),
            days = routine.weekly_plan.len(),
            "Routine stored"
        );
        Ok(RoutineResult {
            routine,
            source: Some(source),
        })
    }
}
