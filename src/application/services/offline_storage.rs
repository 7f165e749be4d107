use crate::application::ports::{LocalStore, StoredExercise, StoredScenario};
use crate::domain::entities::{CachedScenario, Scenario, ScenarioMetadata, StorageUsage};
use crate::domain::value_objects::{ExerciseType, ScenarioId};
use crate::shared::error::AppError;
use chrono::Utc;
use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

/// Durable cache of scenarios and exercises for offline use.
///
/// Reads never fail: any engine error or corrupt record resolves to `None`.
/// Writes propagate their error so the caller can retry or ask the user to free
/// space (`AppError::QuotaExceeded`).
pub struct OfflineStorage {
    store: Arc<dyn LocalStore>,
    shadow: Mutex<LruCache<ScenarioId, CachedScenario>>,
    capacity_bytes: u64,
    usage: watch::Sender<StorageUsage>,
    scenarios: watch::Sender<Vec<ScenarioMetadata>>,
}

impl OfflineStorage {
    pub fn new(store: Arc<dyn LocalStore>, capacity_bytes: u64, shadow_size: usize) -> Self {
        let shadow_size = NonZeroUsize::new(shadow_size).unwrap_or(NonZeroUsize::MIN);
        let (usage, _) = watch::channel(StorageUsage::compute(0, capacity_bytes));
        let (scenarios, _) = watch::channel(Vec::new());
        Self {
            store,
            shadow: Mutex::new(LruCache::new(shadow_size)),
            capacity_bytes,
            usage,
            scenarios,
        }
    }

    /// Loads the derived state (usage, scenario list) from the store.
    pub async fn initialize(&self) {
        self.refresh_derived_state().await;
    }

    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    /// Upserts by identifier: `saved_at` is kept from the first save and
    /// `last_modified` is always refreshed. Exercises already cached for the
    /// scenario are carried over.
    pub async fn save_scenario(&self, scenario: Scenario) -> Result<CachedScenario, AppError> {
        scenario.validate().map_err(AppError::ValidationError)?;
        let now = Utc::now();

        let existing = self
            .store
            .get_scenario(&scenario.id)
            .await?
            .and_then(|row| CachedScenario::from_document(&row.document).ok());

        let cached = match existing {
            Some(previous) => {
                let mut cached = CachedScenario {
                    scenario,
                    saved_at: previous.saved_at,
                    last_modified: previous.last_modified,
                    exercises: previous.exercises,
                };
                cached.touch(now);
                cached
            }
            None => CachedScenario::new(scenario, now),
        };

        self.write_cached(&cached).await?;
        self.refresh_derived_state().await;
        Ok(cached)
    }

    pub async fn get_scenario(&self, id: &ScenarioId) -> Option<CachedScenario> {
        if let Some(hit) = self.shadow.lock().await.get(id) {
            return Some(hit.clone());
        }

        let row = match self.store.get_scenario(id).await {
            Ok(Some(row)) => row,
            Ok(None) => return None,
            Err(err) => {
                warn!(
                    target: "offline::storage",
                    scenario_id = %id,
                    error = %err,
                    "failed to read cached scenario"
                );
                return None;
            }
        };

        match CachedScenario::from_document(&row.document) {
            Ok(cached) if cached.id() == id => {
                self.shadow.lock().await.put(id.clone(), cached.clone());
                Some(cached)
            }
            Ok(_) => {
                self.discard_corrupt(id, "document identifier does not match its key")
                    .await;
                None
            }
            Err(reason) => {
                self.discard_corrupt(id, &reason).await;
                None
            }
        }
    }

    pub async fn remove_scenario(&self, id: &ScenarioId) -> Result<bool, AppError> {
        let exercises = self.store.count_exercises_for(id).await.unwrap_or_default();
        let removed = self.store.delete_scenario_cascade(id).await?;
        self.shadow.lock().await.pop(id);
        if removed {
            debug!(
                target: "offline::storage",
                scenario_id = %id,
                exercises,
                "cached scenario removed"
            );
        }
        self.refresh_derived_state().await;
        Ok(removed)
    }

    /// Writes the exercise record and mirrors it into the owning scenario's
    /// embedded map.
    ///
    /// Without a cached scenario only the exercise record is written; its
    /// "has exercises" flag stays unset until the scenario is saved.
    pub async fn cache_exercise(
        &self,
        scenario_id: &ScenarioId,
        exercise_type: ExerciseType,
        payload: &Value,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let record = StoredExercise {
            scenario_id: scenario_id.clone(),
            exercise_type,
            payload: serde_json::to_string(payload)?,
            cached_at: now,
        };
        // Resolve the owner first: a corrupt owner is discarded with its
        // exercises, which must not include the one written here.
        let owner = self.get_scenario(scenario_id).await;
        self.store.put_exercise(&record).await?;

        match owner {
            Some(mut cached) => {
                cached.set_exercise(exercise_type, payload.clone(), now);
                self.write_cached(&cached).await?;
            }
            None => {
                debug!(
                    target: "offline::storage",
                    scenario_id = %scenario_id,
                    exercise_type = %exercise_type,
                    "cached exercise has no owning scenario record"
                );
            }
        }

        self.refresh_derived_state().await;
        Ok(())
    }

    pub async fn get_cached_exercise(
        &self,
        scenario_id: &ScenarioId,
        exercise_type: ExerciseType,
    ) -> Option<Value> {
        let record = match self.store.get_exercise(scenario_id, exercise_type).await {
            Ok(record) => record?,
            Err(err) => {
                warn!(
                    target: "offline::storage",
                    scenario_id = %scenario_id,
                    exercise_type = %exercise_type,
                    error = %err,
                    "failed to read cached exercise"
                );
                return None;
            }
        };

        match serde_json::from_str(&record.payload) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    target: "offline::storage",
                    scenario_id = %scenario_id,
                    exercise_type = %exercise_type,
                    error = %err,
                    "cached exercise payload is not valid JSON"
                );
                None
            }
        }
    }

    /// Metadata for every cached scenario, read from index columns only.
    pub async fn list_scenario_metadata(&self) -> Vec<ScenarioMetadata> {
        match self.store.list_scenario_summaries().await {
            Ok(rows) => rows
                .into_iter()
                .map(|row| ScenarioMetadata {
                    id: row.id,
                    name: row.name,
                    difficulty: row.difficulty,
                    saved_at: row.saved_at,
                    last_modified: row.last_modified,
                    size_bytes: row.size_bytes,
                    has_exercises: row.has_exercises,
                })
                .collect(),
            Err(err) => {
                warn!(
                    target: "offline::storage",
                    error = %err,
                    "failed to list cached scenarios"
                );
                Vec::new()
            }
        }
    }

    /// Empties scenarios, exercises and the session slot atomically.
    pub async fn clear_all(&self) -> Result<(), AppError> {
        self.store.clear_cache_collections().await?;
        self.shadow.lock().await.clear();
        self.usage
            .send_replace(StorageUsage::compute(0, self.capacity_bytes));
        self.scenarios.send_replace(Vec::new());
        Ok(())
    }

    /// Measures every scenario and exercise record. Always recomputed from the
    /// store, never patched incrementally.
    pub async fn compute_usage(&self) -> Result<StorageUsage, AppError> {
        let scenarios = self.store.list_scenarios().await?;
        let exercises = self.store.list_exercises().await?;

        let used: u64 = scenarios.iter().map(StoredScenario::size_bytes).sum::<u64>()
            + exercises
                .iter()
                .map(|exercise| exercise.payload.len() as u64)
                .sum::<u64>();

        Ok(StorageUsage::compute(used, self.capacity_bytes))
    }

    pub fn usage(&self) -> StorageUsage {
        *self.usage.borrow()
    }

    pub fn subscribe_usage(&self) -> watch::Receiver<StorageUsage> {
        self.usage.subscribe()
    }

    pub fn scenario_list(&self) -> Vec<ScenarioMetadata> {
        self.scenarios.borrow().clone()
    }

    pub fn subscribe_scenarios(&self) -> watch::Receiver<Vec<ScenarioMetadata>> {
        self.scenarios.subscribe()
    }

    pub(crate) async fn refresh_derived_state(&self) {
        match self.compute_usage().await {
            Ok(usage) => {
                self.usage.send_replace(usage);
            }
            Err(err) => warn!(
                target: "offline::storage",
                error = %err,
                "failed to recompute storage usage"
            ),
        }
        let list = self.list_scenario_metadata().await;
        self.scenarios.send_replace(list);
    }

    async fn write_cached(&self, cached: &CachedScenario) -> Result<(), AppError> {
        let row = StoredScenario {
            id: cached.id().clone(),
            name: cached.scenario.name.clone(),
            difficulty: cached.scenario.difficulty.clone(),
            document: cached.to_document()?,
            has_exercises: cached.has_exercises(),
            saved_at: cached.saved_at,
            last_modified: cached.last_modified,
        };

        let result = self.store.put_scenario(&row).await;
        // The shadow copy is refreshed on the next read.
        self.shadow.lock().await.pop(cached.id());

        if let Err(err) = &result
            && err.is_quota_exceeded()
        {
            warn!(
                target: "offline::storage",
                scenario_id = %cached.id(),
                "storage quota exceeded while caching scenario"
            );
        }
        result
    }

    async fn discard_corrupt(&self, id: &ScenarioId, reason: &str) {
        warn!(
            target: "offline::storage",
            scenario_id = %id,
            reason,
            "discarding corrupt cached scenario"
        );
        if let Err(err) = self.store.delete_scenario_cascade(id).await {
            warn!(
                target: "offline::storage",
                scenario_id = %id,
                error = %err,
                "failed to delete corrupt cached scenario"
            );
        }
        self.shadow.lock().await.pop(id);
        self.refresh_derived_state().await;
    }
}
