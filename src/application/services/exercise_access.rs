use crate::application::ports::RemoteDataApi;
use crate::application::services::{BackgroundSync, ConnectivityMonitor, OfflineStorage};
use crate::domain::entities::{CachedScenario, ExercisePayload, Scenario};
use crate::domain::value_objects::{ExerciseType, ScenarioId, SyncOperationId, SyncOperationType};
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct ProgressState {
    active_scenario: Option<ScenarioId>,
    completed: BTreeSet<ExerciseType>,
}

/// Connectivity-transparent entry point for feature code.
///
/// Reads prefer the local cache, fall back to the remote API only when online,
/// and backfill the cache on success. A read never returns an error; anything
/// that goes wrong resolves to `None`. Writes go through the sync queue.
pub struct ExerciseAccess {
    storage: Arc<OfflineStorage>,
    remote: Arc<dyn RemoteDataApi>,
    monitor: Arc<ConnectivityMonitor>,
    sync: Arc<BackgroundSync>,
    read_attempts: u32,
    retry_delay: Duration,
    progress: Mutex<ProgressState>,
}

impl ExerciseAccess {
    pub fn new(
        storage: Arc<OfflineStorage>,
        remote: Arc<dyn RemoteDataApi>,
        monitor: Arc<ConnectivityMonitor>,
        sync: Arc<BackgroundSync>,
        config: &RemoteConfig,
    ) -> Self {
        Self {
            storage,
            remote,
            monitor,
            sync,
            read_attempts: config.read_retries.max(1),
            retry_delay: config.read_retry_delay(),
            progress: Mutex::new(ProgressState::default()),
        }
    }

    pub async fn get_exercise(
        &self,
        scenario_id: &ScenarioId,
        exercise_type: ExerciseType,
    ) -> Option<ExercisePayload> {
        if let Some(cached) = self
            .storage
            .get_cached_exercise(scenario_id, exercise_type)
            .await
        {
            match ExercisePayload::parse(exercise_type, &cached) {
                Ok(payload) => return Some(payload),
                Err(reason) => warn!(
                    target: "offline::access",
                    scenario_id = %scenario_id,
                    exercise_type = %exercise_type,
                    reason,
                    "cached exercise does not match its shape"
                ),
            }
        }

        if !self.monitor.is_online() {
            debug!(
                target: "offline::access",
                scenario_id = %scenario_id,
                exercise_type = %exercise_type,
                "offline cache miss"
            );
            return None;
        }

        let value = self
            .fetch_with_retry("exercise", || {
                self.remote.fetch_exercise(scenario_id, exercise_type)
            })
            .await?;

        let payload = match ExercisePayload::parse(exercise_type, &value) {
            Ok(payload) => payload,
            Err(reason) => {
                warn!(
                    target: "offline::access",
                    scenario_id = %scenario_id,
                    exercise_type = %exercise_type,
                    reason,
                    "remote exercise rejected"
                );
                return None;
            }
        };

        if let Err(err) = self
            .storage
            .cache_exercise(scenario_id, exercise_type, &payload.to_value())
            .await
        {
            warn!(
                target: "offline::access",
                scenario_id = %scenario_id,
                exercise_type = %exercise_type,
                error = %err,
                "failed to cache fetched exercise"
            );
        }
        Some(payload)
    }

    pub async fn get_scenario(&self, id: &ScenarioId) -> Option<CachedScenario> {
        if let Some(cached) = self.storage.get_scenario(id).await {
            return Some(cached);
        }
        if !self.monitor.is_online() {
            debug!(target: "offline::access", scenario_id = %id, "offline cache miss");
            return None;
        }

        let value = self
            .fetch_with_retry("scenario", || self.remote.fetch_scenario(id))
            .await?;

        let scenario = match Scenario::from_value(value) {
            Ok(scenario) if &scenario.id == id => scenario,
            Ok(scenario) => {
                warn!(
                    target: "offline::access",
                    scenario_id = %id,
                    returned_id = %scenario.id,
                    "remote returned a different scenario"
                );
                return None;
            }
            Err(reason) => {
                warn!(
                    target: "offline::access",
                    scenario_id = %id,
                    reason,
                    "remote scenario rejected"
                );
                return None;
            }
        };

        match self.storage.save_scenario(scenario.clone()).await {
            Ok(cached) => Some(cached),
            Err(err) => {
                warn!(
                    target: "offline::access",
                    scenario_id = %id,
                    error = %err,
                    "failed to cache fetched scenario"
                );
                Some(CachedScenario::new(scenario, Utc::now()))
            }
        }
    }

    /// Up to `read_attempts` calls with a fixed delay between them. `Ok(None)`
    /// from the remote is final and is not retried.
    async fn fetch_with_retry<F, Fut>(&self, what: &'static str, fetch: F) -> Option<Value>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Option<Value>, AppError>>,
    {
        for attempt in 1..=self.read_attempts {
            match fetch().await {
                Ok(value) => return value,
                Err(err) => {
                    warn!(
                        target: "offline::access",
                        what,
                        attempt,
                        max_attempts = self.read_attempts,
                        error = %err,
                        "remote read failed"
                    );
                }
            }
            if attempt < self.read_attempts {
                tokio::time::sleep(self.retry_delay).await;
                if !self.monitor.is_online() {
                    break;
                }
            }
        }
        None
    }

    pub async fn save_scenario_for_offline(
        &self,
        scenario: Scenario,
    ) -> Result<CachedScenario, AppError> {
        self.storage.save_scenario(scenario).await
    }

    pub async fn save_history(&self, record: Value) -> Result<SyncOperationId, AppError> {
        self.sync
            .enqueue(SyncOperationType::SaveHistory, record)
            .await
    }

    pub async fn update_progress(&self, progress: Value) -> Result<SyncOperationId, AppError> {
        self.sync
            .enqueue(SyncOperationType::UpdateProgress, progress)
            .await
    }

    pub async fn save_scenario_remote(
        &self,
        scenario: &Scenario,
    ) -> Result<SyncOperationId, AppError> {
        let payload = serde_json::to_value(scenario)?;
        self.sync
            .enqueue(SyncOperationType::SaveScenario, payload)
            .await
    }

    /// Switching to a different scenario resets the completed set.
    pub fn set_active_scenario(&self, id: Option<ScenarioId>) {
        let mut progress = self.lock_progress();
        if progress.active_scenario != id {
            progress.completed.clear();
            progress.active_scenario = id;
        }
    }

    pub fn active_scenario(&self) -> Option<ScenarioId> {
        self.lock_progress().active_scenario.clone()
    }

    pub fn mark_completed(&self, exercise_type: ExerciseType) {
        self.lock_progress().completed.insert(exercise_type);
    }

    pub fn is_completed(&self, exercise_type: ExerciseType) -> bool {
        self.lock_progress().completed.contains(&exercise_type)
    }

    pub fn completed_exercises(&self) -> Vec<ExerciseType> {
        self.lock_progress().completed.iter().copied().collect()
    }

    fn lock_progress(&self) -> std::sync::MutexGuard<'_, ProgressState> {
        self.progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_helpers::{
        RecordingRemote, matching_json, memory_store, monitor, scenario, scenario_json, sid,
        swipe_json,
    };
    use crate::infrastructure::connectivity::ManualConnectivity;
    use crate::shared::config::SyncConfig;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    struct Harness {
        access: ExerciseAccess,
        storage: Arc<OfflineStorage>,
        remote: Arc<RecordingRemote>,
        _platform: Arc<ManualConnectivity>,
    }

    async fn harness(online: bool) -> Harness {
        let (store, _pool) = memory_store().await;
        let storage = Arc::new(OfflineStorage::new(store.clone(), 50 * 1024 * 1024, 8));
        let remote = RecordingRemote::new();
        let (monitor, platform) = monitor(online);
        let sync = BackgroundSync::new(
            store,
            remote.clone(),
            monitor.clone(),
            &SyncConfig::default(),
        );
        let config = RemoteConfig {
            api_url: "http://localhost".into(),
            read_retries: 3,
            read_retry_delay_ms: 5,
            request_timeout_secs: 1,
        };
        let access = ExerciseAccess::new(storage.clone(), remote.clone(), monitor, sync, &config);
        Harness {
            access,
            storage,
            remote,
            _platform: platform,
        }
    }

    #[tokio::test]
    async fn test_offline_miss_makes_no_network_call() {
        let h = harness(false).await;
        h.remote
            .with_exercise("market", ExerciseType::Swipe, swipe_json());

        assert!(
            h.access
                .get_exercise(&sid("market"), ExerciseType::Swipe)
                .await
                .is_none()
        );
        assert!(h.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_offline_hit_returns_cached_payload() {
        let h = harness(false).await;
        h.storage
            .cache_exercise(&sid("market"), ExerciseType::Matching, &matching_json())
            .await
            .unwrap();

        let payload = h
            .access
            .get_exercise(&sid("market"), ExerciseType::Matching)
            .await
            .unwrap();
        assert_eq!(payload.to_value(), matching_json());
    }

    #[tokio::test]
    async fn test_online_hit_makes_no_network_call() {
        let h = harness(true).await;
        h.storage.save_scenario(scenario("market")).await.unwrap();
        h.storage
            .cache_exercise(&sid("market"), ExerciseType::Swipe, &swipe_json())
            .await
            .unwrap();

        let payload = h
            .access
            .get_exercise(&sid("market"), ExerciseType::Swipe)
            .await
            .unwrap();
        assert_eq!(payload.to_value(), swipe_json());
        assert!(h.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_online_miss_fetches_and_backfills() {
        let h = harness(true).await;
        h.storage.save_scenario(scenario("market")).await.unwrap();
        h.remote
            .with_exercise("market", ExerciseType::Swipe, swipe_json());

        let payload = h
            .access
            .get_exercise(&sid("market"), ExerciseType::Swipe)
            .await
            .unwrap();
        assert_eq!(payload.to_value(), swipe_json());
        assert_eq!(h.remote.calls(), vec!["fetch_exercise:market/swipe"]);

        // Second read is served from cache.
        h.access
            .get_exercise(&sid("market"), ExerciseType::Swipe)
            .await
            .unwrap();
        assert_eq!(h.remote.calls().len(), 1);
        let cached = h.storage.get_scenario(&sid("market")).await.unwrap();
        assert!(cached.has_exercises());
    }

    #[tokio::test]
    async fn test_malformed_remote_payload_is_not_found() {
        let h = harness(true).await;
        h.remote.with_exercise(
            "market",
            ExerciseType::Swipe,
            json!([{"word": "caro"}]),
        );

        assert!(
            h.access
                .get_exercise(&sid("market"), ExerciseType::Swipe)
                .await
                .is_none()
        );
        assert!(
            h.storage
                .get_cached_exercise(&sid("market"), ExerciseType::Swipe)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let h = harness(true).await;
        h.remote
            .with_exercise("market", ExerciseType::Matching, matching_json());
        h.remote.transient_fetch_failures.store(2, Ordering::SeqCst);

        assert!(
            h.access
                .get_exercise(&sid("market"), ExerciseType::Matching)
                .await
                .is_some()
        );
        assert_eq!(h.remote.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_persistent_failure_degrades_to_none() {
        let h = harness(true).await;
        h.remote.fail("fetch_exercise");

        assert!(
            h.access
                .get_exercise(&sid("market"), ExerciseType::Matching)
                .await
                .is_none()
        );
        assert_eq!(h.remote.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_remote_not_found_is_not_retried() {
        let h = harness(true).await;
        assert!(
            h.access
                .get_exercise(&sid("market"), ExerciseType::Matching)
                .await
                .is_none()
        );
        assert_eq!(h.remote.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_scenario_read_through_caches_result() {
        let h = harness(true).await;
        h.remote.with_scenario("market", scenario_json("market"));

        let fetched = h.access.get_scenario(&sid("market")).await.unwrap();
        assert_eq!(fetched.scenario, scenario("market"));
        assert!(h.storage.get_scenario(&sid("market")).await.is_some());

        h.access.get_scenario(&sid("market")).await.unwrap();
        assert_eq!(h.remote.calls(), vec!["fetch_scenario:market"]);
    }

    #[tokio::test]
    async fn test_scenario_missing_sentences_is_rejected() {
        let h = harness(true).await;
        h.remote
            .with_scenario("market", json!({"id": "market", "name": "Market"}));

        assert!(h.access.get_scenario(&sid("market")).await.is_none());
        assert!(h.storage.list_scenario_metadata().await.is_empty());
    }

    #[tokio::test]
    async fn test_offline_scenario_miss_makes_no_call() {
        let h = harness(false).await;
        assert!(h.access.get_scenario(&sid("market")).await.is_none());
        assert!(h.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_completed_set_resets_on_new_scenario() {
        let h = harness(false).await;
        h.access.set_active_scenario(Some(sid("market")));
        h.access.mark_completed(ExerciseType::Swipe);
        h.access.mark_completed(ExerciseType::FillInBlank);

        h.access.set_active_scenario(Some(sid("market")));
        assert_eq!(
            h.access.completed_exercises(),
            vec![ExerciseType::FillInBlank, ExerciseType::Swipe]
        );

        h.access.set_active_scenario(Some(sid("airport")));
        assert!(!h.access.is_completed(ExerciseType::Swipe));
        assert!(h.access.completed_exercises().is_empty());
        assert_eq!(h.access.active_scenario(), Some(sid("airport")));
    }

    #[tokio::test]
    async fn test_writes_are_queued_while_offline() {
        let h = harness(false).await;

        h.access
            .save_history(json!({"scenarioId": "market", "score": 8}))
            .await
            .unwrap();
        h.access
            .update_progress(json!({"scenarioId": "market", "completed": ["swipe"]}))
            .await
            .unwrap();
        h.access
            .save_scenario_remote(&scenario("market"))
            .await
            .unwrap();

        let queued = h.storage.store().list_operations().await.unwrap();
        let kinds: Vec<_> = queued.iter().map(|op| op.operation_type.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                SyncOperationType::SaveHistory,
                SyncOperationType::UpdateProgress,
                SyncOperationType::SaveScenario,
            ]
        );
        assert!(h.remote.calls().is_empty());
    }
}
