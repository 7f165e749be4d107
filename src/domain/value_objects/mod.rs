pub mod exercise_type;
pub mod payload;
pub mod scenario_id;
pub mod sync_operation_id;
pub mod sync_operation_type;

pub use exercise_type::ExerciseType;
pub use payload::OperationPayload;
pub use scenario_id::ScenarioId;
pub use sync_operation_id::SyncOperationId;
pub use sync_operation_type::SyncOperationType;
