use crate::application::ports::ResponseCacheInspector;
use crate::application::services::OfflineStorage;
use crate::domain::entities::{
    CacheStatistics, ClearReport, CombinedUsage, ResponseCacheReport, StorageUsage,
};
use crate::shared::config::StorageConfig;
use crate::shared::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Usage reporting and age-based pruning over [`OfflineStorage`].
pub struct CacheManagement {
    storage: Arc<OfflineStorage>,
    response_caches: Option<Arc<dyn ResponseCacheInspector>>,
    min_retained: usize,
    over_limit_percent: f64,
}

impl CacheManagement {
    pub fn new(
        storage: Arc<OfflineStorage>,
        response_caches: Option<Arc<dyn ResponseCacheInspector>>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            storage,
            response_caches,
            min_retained: config.min_retained_scenarios,
            over_limit_percent: config.over_limit_percent,
        }
    }

    pub async fn compute_usage(&self) -> Result<StorageUsage, AppError> {
        self.storage.compute_usage().await
    }

    /// Removes scenarios not touched for longer than `max_age`, oldest first,
    /// never leaving fewer than the retain floor. Returns how many were removed.
    pub async fn prune_older_than(&self, max_age: Duration) -> Result<usize, AppError> {
        let summaries = self.storage.store().list_scenario_summaries().await?;
        let now = Utc::now();
        let mut remaining = summaries.len();
        let mut removed = 0;

        for summary in summaries {
            let age = (now - summary.last_modified)
                .to_std()
                .unwrap_or(Duration::ZERO);
            if age <= max_age {
                // Oldest first, so nothing after this is a candidate either.
                break;
            }
            if remaining <= self.min_retained {
                debug!(
                    target: "offline::cache",
                    remaining,
                    floor = self.min_retained,
                    "retain floor reached; stopping prune"
                );
                break;
            }
            if self.storage.remove_scenario(&summary.id).await? {
                removed += 1;
            }
            remaining -= 1;
        }

        if removed > 0 {
            info!(
                target: "offline::cache",
                removed,
                max_age_secs = max_age.as_secs(),
                "pruned stale cached scenarios"
            );
        }
        Ok(removed)
    }

    pub async fn get_statistics(&self) -> Result<CacheStatistics, AppError> {
        let summaries = self.storage.store().list_scenario_summaries().await?;
        let usage = self.storage.compute_usage().await?;

        Ok(CacheStatistics {
            scenario_count: summaries.len() as u64,
            exercise_count: summaries.iter().filter(|s| s.has_exercises).count() as u64,
            total_size_bytes: usage.used_bytes,
            oldest_saved_at: summaries.iter().map(|s| s.saved_at).min(),
            newest_saved_at: summaries.iter().map(|s| s.saved_at).max(),
            is_over_limit: usage.percentage > self.over_limit_percent,
        })
    }

    /// Sums every response cache. Without an inspector, or if it fails, the
    /// report is empty.
    pub async fn response_cache_report(&self) -> ResponseCacheReport {
        let Some(inspector) = &self.response_caches else {
            return ResponseCacheReport::default();
        };

        let names = match inspector.cache_names().await {
            Ok(names) => names,
            Err(err) => {
                warn!(
                    target: "offline::cache",
                    error = %err,
                    "response caches unavailable"
                );
                return ResponseCacheReport::default();
            }
        };

        let mut total_bytes = 0u64;
        for name in &names {
            match inspector.entry_sizes(name).await {
                Ok(sizes) => total_bytes += sizes.iter().sum::<u64>(),
                Err(err) => warn!(
                    target: "offline::cache",
                    cache = %name,
                    error = %err,
                    "failed to measure response cache"
                ),
            }
        }

        ResponseCacheReport {
            total_bytes,
            cache_names: names,
        }
    }

    pub async fn combined_usage(&self) -> Result<CombinedUsage, AppError> {
        let structured = self.storage.compute_usage().await?;
        let response_caches = self.response_cache_report().await;
        Ok(CombinedUsage {
            total_bytes: structured.used_bytes + response_caches.total_bytes,
            structured,
            response_caches,
        })
    }

    /// Clears the structured store and every response cache. Fails only when
    /// neither side could be cleared.
    pub async fn clear_all_caches(&self) -> Result<ClearReport, AppError> {
        let mut report = ClearReport::default();

        let structured_error = match self.storage.clear_all().await {
            Ok(()) => {
                report.structured_cleared = true;
                None
            }
            Err(err) => {
                warn!(
                    target: "offline::cache",
                    error = %err,
                    "failed to clear offline store"
                );
                Some(err)
            }
        };

        report.response_caches_cleared = self.clear_response_caches().await;

        match structured_error {
            Some(err) if !report.response_caches_cleared => Err(err),
            _ => {
                info!(
                    target: "offline::cache",
                    structured = report.structured_cleared,
                    response_caches = report.response_caches_cleared,
                    "caches cleared"
                );
                Ok(report)
            }
        }
    }

    async fn clear_response_caches(&self) -> bool {
        let Some(inspector) = &self.response_caches else {
            return true;
        };
        let names = match inspector.cache_names().await {
            Ok(names) => names,
            Err(err) => {
                warn!(
                    target: "offline::cache",
                    error = %err,
                    "response caches unavailable; skipping"
                );
                return false;
            }
        };

        let mut cleared = true;
        for name in names {
            if let Err(err) = inspector.delete_cache(&name).await {
                warn!(
                    target: "offline::cache",
                    cache = %name,
                    error = %err,
                    "failed to delete response cache"
                );
                cleared = false;
            }
        }
        cleared
    }

    /// Runs `prune_older_than(max_age)` every `interval`. Abort the handle to stop.
    pub fn spawn_prune_schedule(
        self: &Arc<Self>,
        interval: Duration,
        max_age: Duration,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(err) = manager.prune_older_than(max_age).await {
                    warn!(
                        target: "offline::cache",
                        error = %err,
                        "scheduled prune failed"
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_helpers::{memory_store, scenario, sid, swipe_json};
    use crate::domain::value_objects::ExerciseType;
    use crate::infrastructure::database::ConnectionPool;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryResponseCaches {
        caches: Mutex<HashMap<String, Vec<u64>>>,
    }

    impl MemoryResponseCaches {
        fn new(entries: &[(&str, &[u64])]) -> Arc<Self> {
            Arc::new(Self {
                caches: Mutex::new(
                    entries
                        .iter()
                        .map(|(name, sizes)| (name.to_string(), sizes.to_vec()))
                        .collect(),
                ),
            })
        }
    }

    #[async_trait]
    impl ResponseCacheInspector for MemoryResponseCaches {
        async fn cache_names(&self) -> Result<Vec<String>, AppError> {
            let mut names: Vec<String> = self.caches.lock().unwrap().keys().cloned().collect();
            names.sort();
            Ok(names)
        }

        async fn entry_sizes(&self, cache_name: &str) -> Result<Vec<u64>, AppError> {
            Ok(self
                .caches
                .lock()
                .unwrap()
                .get(cache_name)
                .cloned()
                .unwrap_or_default())
        }

        async fn delete_cache(&self, cache_name: &str) -> Result<bool, AppError> {
            Ok(self.caches.lock().unwrap().remove(cache_name).is_some())
        }
    }

    struct BrokenResponseCaches;

    #[async_trait]
    impl ResponseCacheInspector for BrokenResponseCaches {
        async fn cache_names(&self) -> Result<Vec<String>, AppError> {
            Err(AppError::Storage("cache API unavailable".into()))
        }

        async fn entry_sizes(&self, _cache_name: &str) -> Result<Vec<u64>, AppError> {
            Err(AppError::Storage("cache API unavailable".into()))
        }

        async fn delete_cache(&self, _cache_name: &str) -> Result<bool, AppError> {
            Err(AppError::Storage("cache API unavailable".into()))
        }
    }

    async fn setup(
        inspector: Option<Arc<dyn ResponseCacheInspector>>,
    ) -> (CacheManagement, Arc<OfflineStorage>, ConnectionPool) {
        let (store, pool) = memory_store().await;
        let storage = Arc::new(OfflineStorage::new(store, 50 * 1024 * 1024, 20));
        let manager = CacheManagement::new(storage.clone(), inspector, &StorageConfig::default());
        (manager, storage, pool)
    }

    async fn age_all(pool: &ConnectionPool, days: i64) {
        let millis = (Utc::now() - chrono::Duration::days(days)).timestamp_millis();
        sqlx::query("UPDATE cached_scenarios SET last_modified = ?1 + rowid")
            .bind(millis)
            .execute(pool.get_pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_prune_on_empty_cache_returns_zero() {
        let (manager, _storage, _pool) = setup(None).await;
        assert_eq!(
            manager
                .prune_older_than(Duration::from_secs(60))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_prune_never_goes_below_floor() {
        let (manager, storage, pool) = setup(None).await;
        for index in 0..10 {
            storage
                .save_scenario(scenario(&format!("s{index}")))
                .await
                .unwrap();
        }
        age_all(&pool, 40).await;

        let removed = manager
            .prune_older_than(Duration::from_secs(30 * 24 * 3600))
            .await
            .unwrap();
        assert_eq!(removed, 0);
        assert_eq!(storage.list_scenario_metadata().await.len(), 10);
    }

    #[tokio::test]
    async fn test_prune_removes_oldest_surplus() {
        let (manager, storage, pool) = setup(None).await;
        for index in 0..12 {
            storage
                .save_scenario(scenario(&format!("s{index:02}")))
                .await
                .unwrap();
        }
        age_all(&pool, 40).await;

        let removed = manager
            .prune_older_than(Duration::from_secs(30 * 24 * 3600))
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let remaining: Vec<String> = storage
            .list_scenario_metadata()
            .await
            .into_iter()
            .map(|m| m.id.to_string())
            .collect();
        assert_eq!(remaining.len(), 10);
        assert!(!remaining.contains(&"s00".to_string()));
        assert!(!remaining.contains(&"s01".to_string()));
    }

    #[tokio::test]
    async fn test_prune_keeps_recent_scenarios() {
        let (manager, storage, _pool) = setup(None).await;
        for index in 0..12 {
            storage
                .save_scenario(scenario(&format!("s{index}")))
                .await
                .unwrap();
        }
        let removed = manager
            .prune_older_than(Duration::from_secs(3_600))
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_statistics_count_scenarios_with_exercises() {
        let (manager, storage, _pool) = setup(None).await;
        storage.save_scenario(scenario("a")).await.unwrap();
        storage.save_scenario(scenario("b")).await.unwrap();
        storage
            .cache_exercise(&sid("a"), ExerciseType::Swipe, &swipe_json())
            .await
            .unwrap();

        let stats = manager.get_statistics().await.unwrap();
        assert_eq!(stats.scenario_count, 2);
        assert_eq!(stats.exercise_count, 1);
        assert!(stats.total_size_bytes > 0);
        assert!(stats.oldest_saved_at <= stats.newest_saved_at);
        assert!(!stats.is_over_limit);
    }

    #[tokio::test]
    async fn test_statistics_flag_over_limit() {
        let (store, _pool) = memory_store().await;
        let storage = Arc::new(OfflineStorage::new(store, 100, 4));
        let manager = CacheManagement::new(storage.clone(), None, &StorageConfig::default());
        storage.save_scenario(scenario("big")).await.unwrap();

        assert!(manager.get_statistics().await.unwrap().is_over_limit);
    }

    #[tokio::test]
    async fn test_combined_usage_without_inspector_reports_zero() {
        let (manager, storage, _pool) = setup(None).await;
        storage.save_scenario(scenario("a")).await.unwrap();

        let combined = manager.combined_usage().await.unwrap();
        assert_eq!(combined.response_caches, ResponseCacheReport::default());
        assert_eq!(combined.total_bytes, combined.structured.used_bytes);
    }

    #[tokio::test]
    async fn test_combined_usage_sums_response_caches() {
        let inspector = MemoryResponseCaches::new(&[("api", &[10, 20]), ("images", &[5])]);
        let (manager, _storage, _pool) = setup(Some(inspector)).await;

        let combined = manager.combined_usage().await.unwrap();
        assert_eq!(combined.response_caches.total_bytes, 35);
        assert_eq!(combined.response_caches.cache_names, vec!["api", "images"]);
        assert_eq!(combined.total_bytes, 35);
    }

    #[tokio::test]
    async fn test_clear_all_caches_clears_both_sides() {
        let inspector = MemoryResponseCaches::new(&[("api", &[10])]);
        let (manager, storage, _pool) = setup(Some(inspector.clone())).await;
        storage.save_scenario(scenario("a")).await.unwrap();

        let report = manager.clear_all_caches().await.unwrap();
        assert!(report.structured_cleared);
        assert!(report.response_caches_cleared);
        assert!(inspector.caches.lock().unwrap().is_empty());
        assert_eq!(manager.compute_usage().await.unwrap().used_bytes, 0);
    }

    #[tokio::test]
    async fn test_clear_all_caches_tolerates_broken_response_caches() {
        let (manager, storage, _pool) = setup(Some(Arc::new(BrokenResponseCaches))).await;
        storage.save_scenario(scenario("a")).await.unwrap();

        let report = manager.clear_all_caches().await.unwrap();
        assert!(report.structured_cleared);
        assert!(!report.response_caches_cleared);
        assert!(storage.list_scenario_metadata().await.is_empty());
    }

    #[tokio::test]
    async fn test_prune_schedule_runs_until_aborted() {
        let (manager, storage, pool) = setup(None).await;
        let manager = Arc::new(manager);
        for index in 0..11 {
            storage
                .save_scenario(scenario(&format!("s{index:02}")))
                .await
                .unwrap();
        }
        age_all(&pool, 40).await;

        let handle =
            manager.spawn_prune_schedule(Duration::from_millis(10), Duration::from_secs(3_600));
        for _ in 0..100 {
            if storage.list_scenario_metadata().await.len() == 10 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();
        assert_eq!(storage.list_scenario_metadata().await.len(), 10);
    }
}
