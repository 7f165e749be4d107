use crate::domain::entities::SyncOperation;
use crate::domain::value_objects::{ExerciseType, ScenarioId, SyncOperationId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A scenario document as held by the storage engine, with its index columns.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredScenario {
    pub id: ScenarioId,
    pub name: String,
    pub difficulty: Option<String>,
    pub document: String,
    pub has_exercises: bool,
    pub saved_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl StoredScenario {
    pub fn size_bytes(&self) -> u64 {
        self.document.len() as u64
    }
}

/// Index-only view of a scenario row; never carries the document.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredScenarioSummary {
    pub id: ScenarioId,
    pub name: String,
    pub difficulty: Option<String>,
    pub size_bytes: u64,
    pub has_exercises: bool,
    pub saved_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredExercise {
    pub scenario_id: ScenarioId,
    pub exercise_type: ExerciseType,
    pub payload: String,
    pub cached_at: DateTime<Utc>,
}

/// Transactional local engine with three cache collections and the sync queue.
///
/// Reads of absent keys resolve to `Ok(None)`; `Err` always means the engine
/// itself failed.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn put_scenario(&self, scenario: &StoredScenario) -> Result<(), AppError>;
    async fn get_scenario(&self, id: &ScenarioId) -> Result<Option<StoredScenario>, AppError>;
    async fn list_scenarios(&self) -> Result<Vec<StoredScenario>, AppError>;
    /// Ordered by `last_modified`, oldest first.
    async fn list_scenario_summaries(&self) -> Result<Vec<StoredScenarioSummary>, AppError>;
    /// Deletes the scenario and every exercise keyed by it in one transaction.
    async fn delete_scenario_cascade(&self, id: &ScenarioId) -> Result<bool, AppError>;

    async fn put_exercise(&self, exercise: &StoredExercise) -> Result<(), AppError>;
    async fn get_exercise(
        &self,
        scenario_id: &ScenarioId,
        exercise_type: ExerciseType,
    ) -> Result<Option<StoredExercise>, AppError>;
    async fn list_exercises(&self) -> Result<Vec<StoredExercise>, AppError>;
    async fn count_exercises_for(&self, scenario_id: &ScenarioId) -> Result<u64, AppError>;

    async fn put_session(&self, document: &str, updated_at: DateTime<Utc>)
    -> Result<(), AppError>;
    async fn get_session(&self) -> Result<Option<String>, AppError>;
    async fn delete_session(&self) -> Result<(), AppError>;

    /// Empties scenarios, exercises and the session slot in one transaction.
    async fn clear_cache_collections(&self) -> Result<(), AppError>;

    async fn push_operation(&self, operation: &SyncOperation) -> Result<(), AppError>;
    /// Ordered by enqueue time, then insertion order. Rows that cannot be
    /// decoded are deleted rather than returned.
    async fn list_operations(&self) -> Result<Vec<SyncOperation>, AppError>;
    async fn update_operation(&self, operation: &SyncOperation) -> Result<(), AppError>;
    async fn delete_operation(&self, id: &SyncOperationId) -> Result<(), AppError>;
    async fn count_operations(&self) -> Result<u64, AppError>;
}
