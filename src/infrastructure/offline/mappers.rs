use super::rows::{ExerciseRow, ScenarioRow, ScenarioSummaryRow, SyncOperationRow};
use crate::application::ports::{StoredExercise, StoredScenario, StoredScenarioSummary};
use crate::domain::entities::SyncOperation;
use crate::domain::value_objects::{
    ExerciseType, OperationPayload, ScenarioId, SyncOperationId, SyncOperationType,
};
use crate::shared::error::AppError;
use chrono::{DateTime, TimeZone, Utc};

pub(crate) fn millis_to_datetime(value: i64) -> Result<DateTime<Utc>, AppError> {
    Utc.timestamp_millis_opt(value)
        .single()
        .ok_or_else(|| AppError::DeserializationError(format!("Invalid timestamp: {value}")))
}

fn scenario_id(value: String) -> Result<ScenarioId, AppError> {
    ScenarioId::new(value).map_err(AppError::DeserializationError)
}

pub(crate) fn map_scenario_row(row: ScenarioRow) -> Result<StoredScenario, AppError> {
    Ok(StoredScenario {
        id: scenario_id(row.id)?,
        name: row.name,
        difficulty: row.difficulty,
        document: row.document,
        has_exercises: row.has_exercises,
        saved_at: millis_to_datetime(row.saved_at)?,
        last_modified: millis_to_datetime(row.last_modified)?,
    })
}

pub(crate) fn map_scenario_summary_row(
    row: ScenarioSummaryRow,
) -> Result<StoredScenarioSummary, AppError> {
    Ok(StoredScenarioSummary {
        id: scenario_id(row.id)?,
        name: row.name,
        difficulty: row.difficulty,
        size_bytes: row.size_bytes.max(0) as u64,
        has_exercises: row.has_exercises,
        saved_at: millis_to_datetime(row.saved_at)?,
        last_modified: millis_to_datetime(row.last_modified)?,
    })
}

pub(crate) fn map_exercise_row(row: ExerciseRow) -> Result<StoredExercise, AppError> {
    let exercise_type = row
        .exercise_type
        .parse::<ExerciseType>()
        .map_err(AppError::DeserializationError)?;
    Ok(StoredExercise {
        scenario_id: scenario_id(row.scenario_id)?,
        exercise_type,
        payload: row.payload,
        cached_at: millis_to_datetime(row.cached_at)?,
    })
}

pub(crate) fn map_operation_row(row: SyncOperationRow) -> Result<SyncOperation, AppError> {
    let id = SyncOperationId::new(row.id).map_err(AppError::DeserializationError)?;
    let payload =
        OperationPayload::from_json_str(&row.payload).map_err(AppError::DeserializationError)?;
    let last_attempt_at = row.last_attempt_at.map(millis_to_datetime).transpose()?;

    Ok(SyncOperation {
        id,
        operation_type: SyncOperationType::from(row.operation_type.as_str()),
        payload,
        enqueued_at: millis_to_datetime(row.enqueued_at)?,
        retry_count: row.retry_count.clamp(0, u32::MAX as i64) as u32,
        last_attempt_at,
    })
}
