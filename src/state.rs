use crate::application::ports::{
    ConnectivityProbe, LocalStore, PlatformConnectivity, RemoteDataApi, ResponseCacheInspector,
};
use crate::application::services::{
    BackgroundSync, CacheManagement, ConnectivityMonitor, ExerciseAccess, OfflineStorage,
    SessionStateStore,
};
use crate::infrastructure::connectivity::HttpConnectivityProbe;
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::offline::SqliteLocalStore;
use crate::infrastructure::remote::HttpRemoteDataApi;
use crate::infrastructure::response_cache::DiskResponseCache;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const PRUNE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// External capabilities the services are built on.
pub struct Adapters {
    pub platform: Arc<dyn PlatformConnectivity>,
    pub probe: Arc<dyn ConnectivityProbe>,
    pub remote: Arc<dyn RemoteDataApi>,
    pub response_caches: Option<Arc<dyn ResponseCacheInspector>>,
}

/// Every service of the data layer, wired once at process start.
pub struct AppState {
    pub config: AppConfig,
    pub pool: ConnectionPool,
    pub storage: Arc<OfflineStorage>,
    pub cache: Arc<CacheManagement>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub sync: Arc<BackgroundSync>,
    pub access: Arc<ExerciseAccess>,
    pub sessions: Arc<SessionStateStore>,
    prune_task: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    /// Opens the database from `config` and builds the HTTP adapters.
    pub async fn initialize(
        config: AppConfig,
        platform: Arc<dyn PlatformConnectivity>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let pool =
            ConnectionPool::new(&config.database.url, config.database.max_connections).await?;
        pool.migrate().await?;

        let probe = HttpConnectivityProbe::new(
            &config.connectivity.probe_url,
            Duration::from_secs(config.connectivity.probe_timeout_secs),
        )?;
        let remote = HttpRemoteDataApi::new(
            &config.remote.api_url,
            Duration::from_secs(config.remote.request_timeout_secs),
        )?;
        let response_caches = config
            .storage
            .response_cache_dir
            .as_ref()
            .map(|dir| Arc::new(DiskResponseCache::new(dir)) as Arc<dyn ResponseCacheInspector>);

        let adapters = Adapters {
            platform,
            probe: Arc::new(probe),
            remote: Arc::new(remote),
            response_caches,
        };
        Ok(Self::assemble(config, pool, adapters).await)
    }

    /// Builds the services over an already migrated pool and starts the
    /// connectivity monitor and the reconnect listener.
    pub async fn assemble(config: AppConfig, pool: ConnectionPool, adapters: Adapters) -> Self {
        let store: Arc<dyn LocalStore> = Arc::new(SqliteLocalStore::new(pool.clone()));

        let storage = Arc::new(OfflineStorage::new(
            store.clone(),
            config.storage.estimated_capacity_bytes,
            config.storage.shadow_cache_size,
        ));
        storage.initialize().await;

        let cache = Arc::new(CacheManagement::new(
            storage.clone(),
            adapters.response_caches,
            &config.storage,
        ));

        let monitor = ConnectivityMonitor::new(
            adapters.platform,
            adapters.probe,
            config.connectivity.probe_interval(),
        );
        monitor.start();

        let sync = BackgroundSync::new(
            store.clone(),
            adapters.remote.clone(),
            monitor.clone(),
            &config.sync,
        );
        sync.start();

        let access = Arc::new(ExerciseAccess::new(
            storage.clone(),
            adapters.remote,
            monitor.clone(),
            sync.clone(),
            &config.remote,
        ));
        let sessions = SessionStateStore::new(store, config.session.debounce());

        info!(
            target: "offline::storage",
            online = monitor.is_online(),
            used_bytes = storage.usage().used_bytes,
            "offline data layer ready"
        );

        Self {
            config,
            pool,
            storage,
            cache,
            monitor,
            sync,
            access,
            sessions,
            prune_task: Mutex::new(None),
        }
    }

    /// Prunes by `default_max_age_days` now and then once a day until shutdown.
    pub fn start_prune_schedule(&self) {
        let max_age =
            Duration::from_secs(self.config.storage.default_max_age_days * 24 * 60 * 60);
        let handle = self.cache.spawn_prune_schedule(PRUNE_INTERVAL, max_age);
        let mut slot = self
            .prune_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Stops timers and listeners and writes any pending session snapshot.
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        let prune = self
            .prune_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = prune {
            handle.abort();
        }

        self.sync.shutdown();
        self.monitor.shutdown();

        if let Err(err) = self.sessions.flush().await {
            warn!(
                target: "offline::session",
                error = %err,
                "failed to flush session snapshot on shutdown"
            );
        }
    }
}
