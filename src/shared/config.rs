use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub connectivity: ConnectivityConfig,
    pub remote: RemoteConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Conservative capacity estimate; real platform quota is not introspectable.
    pub estimated_capacity_bytes: u64,
    pub over_limit_percent: f64,
    pub min_retained_scenarios: usize,
    pub shadow_cache_size: usize,
    pub default_max_age_days: u64,
    #[serde(default)]
    pub response_cache_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    pub probe_url: String,
    pub probe_interval_secs: u64,
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub api_url: String,
    pub read_retries: u32,
    pub read_retry_delay_ms: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub debounce_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: default_database_url(),
                max_connections: 1,
            },
            storage: StorageConfig::default(),
            sync: SyncConfig::default(),
            connectivity: ConnectivityConfig {
                probe_url: "http://localhost:3000/favicon.ico".to_string(),
                probe_interval_secs: 30,
                probe_timeout_secs: 5,
            },
            remote: RemoteConfig {
                api_url: "http://localhost:3000/api".to_string(),
                read_retries: 3,
                read_retry_delay_ms: 1_000,
                request_timeout_secs: 15,
            },
            session: SessionConfig { debounce_ms: 500 },
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            estimated_capacity_bytes: 50 * 1024 * 1024, // 50MB
            over_limit_percent: 80.0,
            min_retained_scenarios: 10,
            shadow_cache_size: 20,
            default_max_age_days: 30,
            response_cache_dir: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1_000,
            reconnect_delay_ms: 1_000,
        }
    }
}

impl SyncConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl ConnectivityConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }
}

impl RemoteConfig {
    pub fn read_retry_delay(&self) -> Duration {
        Duration::from_millis(self.read_retry_delay_ms)
    }
}

impl SessionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_database_url() -> String {
    let base = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("./data"));
    let path = base.join("lingua").join("offline.db");
    format!("sqlite://{}?mode=rwc", path.display())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("LINGUA_DATABASE_URL")
            && !v.trim().is_empty()
        {
            cfg.database.url = v.trim().to_string();
        }
        if let Ok(v) = std::env::var("LINGUA_API_URL")
            && !v.trim().is_empty()
        {
            cfg.remote.api_url = v.trim().trim_end_matches('/').to_string();
        }
        if let Ok(v) = std::env::var("LINGUA_PROBE_URL")
            && !v.trim().is_empty()
        {
            cfg.connectivity.probe_url = v.trim().to_string();
        }
        if let Ok(v) = std::env::var("LINGUA_PROBE_INTERVAL_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.connectivity.probe_interval_secs = value.max(1);
        }
        if let Ok(v) = std::env::var("LINGUA_MAX_RETRIES")
            && let Some(value) = parse_u64(&v)
        {
            cfg.sync.max_retries = value.min(u32::MAX as u64) as u32;
        }
        if let Ok(v) = std::env::var("LINGUA_BACKOFF_BASE_MS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.sync.backoff_base_ms = value;
        }
        if let Ok(v) = std::env::var("LINGUA_RECONNECT_DELAY_MS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.sync.reconnect_delay_ms = value;
        }
        if let Ok(v) = std::env::var("LINGUA_MIN_RETAIN")
            && let Some(value) = parse_u64(&v)
        {
            cfg.storage.min_retained_scenarios = value as usize;
        }
        if let Ok(v) = std::env::var("LINGUA_CAPACITY_BYTES")
            && let Some(value) = parse_u64(&v)
        {
            cfg.storage.estimated_capacity_bytes = value;
        }
        if let Ok(v) = std::env::var("LINGUA_OVER_LIMIT_PERCENT")
            && let Some(value) = parse_f64(&v)
        {
            cfg.storage.over_limit_percent = value;
        }
        if let Ok(v) = std::env::var("LINGUA_RESPONSE_CACHE_DIR")
            && !v.trim().is_empty()
        {
            cfg.storage.response_cache_dir = Some(v.trim().to_string());
        }
        if let Ok(v) = std::env::var("LINGUA_READ_RETRIES")
            && let Some(value) = parse_u64(&v)
        {
            cfg.remote.read_retries = value.min(u32::MAX as u64) as u32;
        }
        if let Ok(v) = std::env::var("LINGUA_SESSION_DEBOUNCE_MS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.session.debounce_ms = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.storage.estimated_capacity_bytes == 0 {
            return Err("Storage estimated_capacity_bytes must be greater than 0".to_string());
        }
        if !(0.0..=100.0).contains(&self.storage.over_limit_percent) {
            return Err("Storage over_limit_percent must be between 0 and 100".to_string());
        }
        if self.storage.shadow_cache_size == 0 {
            return Err("Storage shadow_cache_size must be greater than 0".to_string());
        }
        if self.sync.max_retries == 0 {
            return Err("Sync max_retries must be greater than 0".to_string());
        }
        if self.connectivity.probe_interval_secs == 0 {
            return Err("Connectivity probe_interval_secs must be greater than 0".to_string());
        }
        if self.remote.read_retries == 0 {
            return Err("Remote read_retries must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_f64(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}
