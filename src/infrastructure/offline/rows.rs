use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct ScenarioRow {
    pub id: String,
    pub name: String,
    pub difficulty: Option<String>,
    pub document: String,
    pub has_exercises: bool,
    pub saved_at: i64,
    pub last_modified: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ScenarioSummaryRow {
    pub id: String,
    pub name: String,
    pub difficulty: Option<String>,
    pub size_bytes: i64,
    pub has_exercises: bool,
    pub saved_at: i64,
    pub last_modified: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ExerciseRow {
    pub scenario_id: String,
    pub exercise_type: String,
    pub payload: String,
    pub cached_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct SyncOperationRow {
    pub id: String,
    pub operation_type: String,
    pub payload: String,
    pub enqueued_at: i64,
    pub retry_count: i64,
    pub last_attempt_at: Option<i64>,
}
