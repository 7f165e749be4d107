pub mod exercise;
pub mod scenario;
pub mod session;
pub mod storage_usage;
pub mod sync_operation;

pub use exercise::{
    ExerciseContent, ExercisePayload, FillInBlankItem, MatchingPair, MatchingPairs, ScrambleItem,
    SwipeCard,
};
pub use scenario::{CachedScenario, Scenario, ScenarioMetadata, Sentence};
pub use session::SessionSnapshot;
pub use storage_usage::{
    CacheStatistics, ClearReport, CombinedUsage, ResponseCacheReport, StorageUsage,
};
pub use sync_operation::SyncOperation;
