//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, Value as SqlValue, params};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::profile::model::{ActivityLevel, FitnessGoal, UserProfile};
use crate::store::migrations;
use crate::store::traits::{Database, StoredRoutine};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests and throwaway runs).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn opt_text(s: Option<&str>) -> SqlValue {
    match s {
        Some(s) => SqlValue::Text(s.to_string()),
        None => SqlValue::Null,
    }
}

fn opt_real(v: Option<f64>) -> SqlValue {
    v.map_or(SqlValue::Null, SqlValue::Real)
}

fn opt_integer(v: Option<i64>) -> SqlValue {
    v.map_or(SqlValue::Null, SqlValue::Integer)
}

/// Read a nullable REAL column. Integer storage is widened.
fn real_at(row: &libsql::Row, idx: i32) -> Result<Option<f64>, libsql::Error> {
    Ok(match row.get_value(idx)? {
        SqlValue::Real(f) => Some(f),
        SqlValue::Integer(i) => Some(i as f64),
        _ => None,
    })
}

fn integer_at(row: &libsql::Row, idx: i32) -> Result<Option<i64>, libsql::Error> {
    Ok(match row.get_value(idx)? {
        SqlValue::Integer(i) => Some(i),
        _ => None,
    })
}

fn text_at(row: &libsql::Row, idx: i32) -> Result<Option<String>, libsql::Error> {
    Ok(match row.get_value(idx)? {
        SqlValue::Text(s) => Some(s),
        _ => None,
    })
}

const PROFILE_COLUMNS: &str = "user_id, height, weight, age, gender, fitness_goals, \
     activity_level, has_completed_onboarding, created_at, updated_at";

/// Map a libsql Row to a UserProfile. Column order matches PROFILE_COLUMNS.
fn row_to_profile(row: &libsql::Row) -> Result<UserProfile, DatabaseError> {
    let read = |e: libsql::Error| DatabaseError::Query(format!("row_to_profile: {e}"));

    let goals_json = text_at(row, 5).map_err(read)?;
    let fitness_goals = goals_json
        .as_deref()
        .map(serde_json::from_str::<Vec<FitnessGoal>>)
        .transpose()
        .map_err(|e| DatabaseError::Serialization(format!("fitness_goals: {e}")))?;

    Ok(UserProfile {
        user_id: row.get::<String>(0).map_err(read)?,
        height: real_at(row, 1).map_err(read)?,
        weight: real_at(row, 2).map_err(read)?,
        age: integer_at(row, 3).map_err(read)?,
        gender: text_at(row, 4).map_err(read)?,
        fitness_goals,
        activity_level: text_at(row, 6).map_err(read)?.map(ActivityLevel::from),
        has_completed_onboarding: integer_at(row, 7).map_err(read)?.unwrap_or(0) != 0,
        created_at: parse_datetime(&row.get::<String>(8).map_err(read)?),
        updated_at: parse_datetime(&row.get::<String>(9).map_err(read)?),
    })
}

const ROUTINE_COLUMNS: &str = "id, user_id, routine_data, created_at, updated_at";

fn row_to_routine(row: &libsql::Row) -> Result<StoredRoutine, DatabaseError> {
    let read = |e: libsql::Error| DatabaseError::Query(format!("row_to_routine: {e}"));

    let id_str: String = row.get(0).map_err(read)?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DatabaseError::Serialization(format!("routine id {id_str}: {e}")))?;
    let data: String = row.get(2).map_err(read)?;
    // Unparseable documents read as null, which callers treat as no routine.
    let routine_data = serde_json::from_str(&data).unwrap_or(Value::Null);

    Ok(StoredRoutine {
        id,
        user_id: row.get(1).map_err(read)?,
        routine_data,
        created_at: parse_datetime(&row.get::<String>(3).map_err(read)?),
        updated_at: parse_datetime(&row.get::<String>(4).map_err(read)?),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Profiles ────────────────────────────────────────────────────

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = ?1"),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_profile: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_profile(&row).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_profile: {e}"))),
        }
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), DatabaseError> {
        let goals = profile
            .fitness_goals
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                &format!(
                    "INSERT INTO user_profiles ({PROFILE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                     ON CONFLICT (user_id) DO UPDATE SET
                        height = excluded.height,
                        weight = excluded.weight,
                        age = excluded.age,
                        gender = excluded.gender,
                        fitness_goals = excluded.fitness_goals,
                        activity_level = excluded.activity_level,
                        has_completed_onboarding = excluded.has_completed_onboarding,
                        updated_at = excluded.updated_at"
                ),
                params![
                    profile.user_id.as_str(),
                    opt_real(profile.height),
                    opt_real(profile.weight),
                    opt_integer(profile.age),
                    opt_text(profile.gender.as_deref()),
                    opt_text(goals.as_deref()),
                    opt_text(profile.activity_level.as_ref().map(ActivityLevel::as_str)),
                    i64::from(profile.has_completed_onboarding),
                    profile.created_at.to_rfc3339(),
                    profile.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_profile: {e}")))?;

        debug!(user_id = %profile.user_id, "Profile upserted");
        Ok(())
    }

    // ── Routines ────────────────────────────────────────────────────

    async fn get_routine(&self, user_id: &str) -> Result<Option<StoredRoutine>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {ROUTINE_COLUMNS} FROM user_routines WHERE user_id = ?1"),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_routine: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_routine(&row).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_routine: {e}"))),
        }
    }

    async fn upsert_routine(&self, user_id: &str, routine: &Value) -> Result<(), DatabaseError> {
        let data =
            serde_json::to_string(routine).map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        self.conn()
            .execute(
                "INSERT INTO user_routines (id, user_id, routine_data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT (user_id) DO UPDATE SET
                    routine_data = excluded.routine_data,
                    updated_at = excluded.updated_at",
                params![Uuid::new_v4().to_string(), user_id, data, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_routine: {e}")))?;

        debug!(user_id, "Routine upserted");
        Ok(())
    }

    async fn count_routines(&self, user_id: &str) -> Result<i64, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT COUNT(*) FROM user_routines WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("count_routines: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<i64>(0)
                .map_err(|e| DatabaseError::Query(format!("count_routines: {e}"))),
            Ok(None) => Ok(0),
            Err(e) => Err(DatabaseError::Query(format!("count_routines: {e}"))),
        }
    }
}
