use crate::application::ports::ResponseCacheInspector;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Network-response caches kept on disk: each sub-directory of `root` is a
/// named cache and each regular file inside it is one stored response.
pub struct DiskResponseCache {
    root: PathBuf,
}

impl DiskResponseCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_dir(&self, cache_name: &str) -> Result<PathBuf, AppError> {
        let valid = !cache_name.is_empty()
            && cache_name != "."
            && cache_name != ".."
            && !cache_name.contains(['/', '\\']);
        if !valid {
            return Err(AppError::ValidationError(format!(
                "Invalid response cache name: {cache_name}"
            )));
        }
        Ok(self.root.join(cache_name))
    }
}

#[async_trait]
impl ResponseCacheInspector for DiskResponseCache {
    async fn cache_names(&self) -> Result<Vec<String>, AppError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(AppError::Storage(format!(
                    "Failed to read response cache root: {err}"
                )));
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir()
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn entry_sizes(&self, cache_name: &str) -> Result<Vec<u64>, AppError> {
        let dir = self.cache_dir(cache_name)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut sizes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                sizes.push(metadata.len());
            }
        }
        Ok(sizes)
    }

    async fn delete_cache(&self, cache_name: &str) -> Result<bool, AppError> {
        let dir = self.cache_dir(cache_name)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(AppError::Storage(format!(
                "Failed to delete response cache {cache_name}: {err}"
            ))),
        }
    }
}
