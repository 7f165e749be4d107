use crate::domain::value_objects::{ExerciseType, ScenarioId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Request/response access to the authoritative content store.
#[async_trait]
pub trait RemoteDataApi: Send + Sync {
    /// Returns the identifier assigned to the new history record.
    async fn create_history(&self, record: &Value) -> Result<String, AppError>;
    async fn update_progress(&self, progress: &Value) -> Result<(), AppError>;
    async fn save_scenario(&self, scenario: &Value) -> Result<String, AppError>;
    async fn fetch_scenario(&self, id: &ScenarioId) -> Result<Option<Value>, AppError>;
    async fn fetch_exercise(
        &self,
        scenario_id: &ScenarioId,
        exercise_type: ExerciseType,
    ) -> Result<Option<Value>, AppError>;
}
