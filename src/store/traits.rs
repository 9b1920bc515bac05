//! `Database` trait: the async persistence interface for profiles and routines.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::profile::model::UserProfile;

/// A persisted routine row. At most one exists per user.
#[derive(Debug, Clone)]
pub struct StoredRoutine {
    pub id: Uuid,
    pub user_id: String,
    /// The routine document as stored, not yet normalized.
    pub routine_data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredRoutine {
    /// Null and `{}` count as no routine.
    pub fn has_content(&self) -> bool {
        match &self.routine_data {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        }
    }
}

/// Backend-agnostic database trait covering profiles and routines.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Profiles ────────────────────────────────────────────────────

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError>;

    /// Insert or replace the profile for `profile.user_id`. `created_at` of an
    /// existing row is kept.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), DatabaseError>;

    // ── Routines ────────────────────────────────────────────────────

    async fn get_routine(&self, user_id: &str) -> Result<Option<StoredRoutine>, DatabaseError>;

    /// Write the routine for a user in one statement: insert when absent,
    /// otherwise replace `routine_data` and refresh `updated_at`.
    async fn upsert_routine(&self, user_id: &str, routine: &Value) -> Result<(), DatabaseError>;

    /// Number of routine rows for a user (0 or 1).
    async fn count_routines(&self, user_id: &str) -> Result<i64, DatabaseError>;
}
