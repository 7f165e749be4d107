use super::mappers::{
    map_exercise_row, map_operation_row, map_scenario_row, map_scenario_summary_row,
};
use super::rows::{ExerciseRow, ScenarioRow, ScenarioSummaryRow, SyncOperationRow};
use crate::application::ports::{LocalStore, StoredExercise, StoredScenario, StoredScenarioSummary};
use crate::domain::entities::SyncOperation;
use crate::domain::value_objects::{ExerciseType, ScenarioId, SyncOperationId};
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::database::queries::*;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

/// `LocalStore` over SQLite: one table per collection.
pub struct SqliteLocalStore {
    pool: ConnectionPool,
}

impl SqliteLocalStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn put_scenario(&self, scenario: &StoredScenario) -> Result<(), AppError> {
        sqlx::query(UPSERT_SCENARIO)
            .bind(scenario.id.as_str())
            .bind(&scenario.name)
            .bind(&scenario.difficulty)
            .bind(&scenario.document)
            .bind(scenario.has_exercises)
            .bind(scenario.saved_at.timestamp_millis())
            .bind(scenario.last_modified.timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    async fn get_scenario(&self, id: &ScenarioId) -> Result<Option<StoredScenario>, AppError> {
        let row = sqlx::query_as::<_, ScenarioRow>(SELECT_SCENARIO_BY_ID)
            .bind(id.as_str())
            .fetch_optional(self.pool.get_pool())
            .await?;
        row.map(map_scenario_row).transpose()
    }

    async fn list_scenarios(&self) -> Result<Vec<StoredScenario>, AppError> {
        let rows = sqlx::query_as::<_, ScenarioRow>(SELECT_SCENARIOS)
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.into_iter().map(map_scenario_row).collect()
    }

    async fn list_scenario_summaries(&self) -> Result<Vec<StoredScenarioSummary>, AppError> {
        let rows = sqlx::query_as::<_, ScenarioSummaryRow>(SELECT_SCENARIO_SUMMARIES)
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.into_iter().map(map_scenario_summary_row).collect()
    }

    async fn delete_scenario_cascade(&self, id: &ScenarioId) -> Result<bool, AppError> {
        let mut tx = self.pool.get_pool().begin().await?;

        sqlx::query(DELETE_EXERCISES_FOR_SCENARIO)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query(DELETE_SCENARIO)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn put_exercise(&self, exercise: &StoredExercise) -> Result<(), AppError> {
        sqlx::query(UPSERT_EXERCISE)
            .bind(exercise.scenario_id.as_str())
            .bind(exercise.exercise_type.as_str())
            .bind(&exercise.payload)
            .bind(exercise.cached_at.timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    async fn get_exercise(
        &self,
        scenario_id: &ScenarioId,
        exercise_type: ExerciseType,
    ) -> Result<Option<StoredExercise>, AppError> {
        let row = sqlx::query_as::<_, ExerciseRow>(SELECT_EXERCISE)
            .bind(scenario_id.as_str())
            .bind(exercise_type.as_str())
            .fetch_optional(self.pool.get_pool())
            .await?;
        row.map(map_exercise_row).transpose()
    }

    async fn list_exercises(&self) -> Result<Vec<StoredExercise>, AppError> {
        let rows = sqlx::query_as::<_, ExerciseRow>(SELECT_EXERCISES)
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.into_iter().map(map_exercise_row).collect()
    }

    async fn count_exercises_for(&self, scenario_id: &ScenarioId) -> Result<u64, AppError> {
        let (count,): (i64,) = sqlx::query_as(COUNT_EXERCISES_FOR_SCENARIO)
            .bind(scenario_id.as_str())
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn put_session(
        &self,
        document: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(UPSERT_SESSION)
            .bind(SESSION_SLOT)
            .bind(document)
            .bind(updated_at.timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> = sqlx::query_as(SELECT_SESSION)
            .bind(SESSION_SLOT)
            .fetch_optional(self.pool.get_pool())
            .await?;
        Ok(row.map(|(document,)| document))
    }

    async fn delete_session(&self) -> Result<(), AppError> {
        sqlx::query(DELETE_SESSION)
            .bind(SESSION_SLOT)
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    async fn clear_cache_collections(&self) -> Result<(), AppError> {
        let mut tx = self.pool.get_pool().begin().await?;
        sqlx::query(CLEAR_EXERCISES).execute(&mut *tx).await?;
        sqlx::query(CLEAR_SCENARIOS).execute(&mut *tx).await?;
        sqlx::query(CLEAR_SESSION).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn push_operation(&self, operation: &SyncOperation) -> Result<(), AppError> {
        let payload = serde_json::to_string(operation.payload.as_json())?;
        sqlx::query(INSERT_OPERATION)
            .bind(operation.id.as_str())
            .bind(operation.operation_type.as_str())
            .bind(payload)
            .bind(operation.enqueued_at.timestamp_millis())
            .bind(operation.retry_count as i64)
            .bind(operation.last_attempt_at.map(|at| at.timestamp_millis()))
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    async fn list_operations(&self) -> Result<Vec<SyncOperation>, AppError> {
        let rows = sqlx::query_as::<_, SyncOperationRow>(SELECT_OPERATIONS)
            .fetch_all(self.pool.get_pool())
            .await?;

        let mut operations = Vec::with_capacity(rows.len());
        for row in rows {
            let raw_id = row.id.clone();
            match map_operation_row(row) {
                Ok(operation) => operations.push(operation),
                Err(err) => {
                    // Unreadable rows would jam every later drain.
                    warn!(
                        target: "offline::sync",
                        operation_id = %raw_id,
                        error = %err,
                        "discarding unreadable queued operation"
                    );
                    sqlx::query(DELETE_OPERATION)
                        .bind(raw_id.as_str())
                        .execute(self.pool.get_pool())
                        .await?;
                }
            }
        }
        Ok(operations)
    }

    async fn update_operation(&self, operation: &SyncOperation) -> Result<(), AppError> {
        sqlx::query(UPDATE_OPERATION_ATTEMPT)
            .bind(operation.retry_count as i64)
            .bind(operation.last_attempt_at.map(|at| at.timestamp_millis()))
            .bind(operation.id.as_str())
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    async fn delete_operation(&self, id: &SyncOperationId) -> Result<(), AppError> {
        sqlx::query(DELETE_OPERATION)
            .bind(id.as_str())
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    async fn count_operations(&self) -> Result<u64, AppError> {
        let (count,): (i64,) = sqlx::query_as(COUNT_OPERATIONS)
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(count.max(0) as u64)
    }
}
