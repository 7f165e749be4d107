use crate::shared::error::AppError;
use async_trait::async_trait;

/// Read/delete access to the runtime's named network-response caches.
#[async_trait]
pub trait ResponseCacheInspector: Send + Sync {
    async fn cache_names(&self) -> Result<Vec<String>, AppError>;
    async fn entry_sizes(&self, cache_name: &str) -> Result<Vec<u64>, AppError>;
    async fn delete_cache(&self, cache_name: &str) -> Result<bool, AppError>;
}
