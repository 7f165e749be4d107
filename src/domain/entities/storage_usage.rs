use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Usage of the structured store against the estimated capacity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub percentage: f64,
}

impl StorageUsage {
    pub fn compute(used_bytes: u64, capacity_bytes: u64) -> Self {
        let available_bytes = capacity_bytes.saturating_sub(used_bytes);
        let percentage = if capacity_bytes == 0 {
            100.0
        } else {
            (used_bytes as f64 / capacity_bytes as f64 * 100.0).min(100.0)
        };
        Self {
            used_bytes,
            available_bytes,
            percentage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatistics {
    pub scenario_count: u64,
    /// Scenarios whose embedded exercise map is non-empty.
    pub exercise_count: u64,
    pub total_size_bytes: u64,
    pub oldest_saved_at: Option<DateTime<Utc>>,
    pub newest_saved_at: Option<DateTime<Utc>>,
    pub is_over_limit: bool,
}

/// Aggregate over the network-response caches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCacheReport {
    pub total_bytes: u64,
    pub cache_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CombinedUsage {
    pub structured: StorageUsage,
    pub response_caches: ResponseCacheReport,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClearReport {
    pub structured_cleared: bool,
    pub response_caches_cleared: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_is_capped_and_floored() {
        let over = StorageUsage::compute(150, 100);
        assert_eq!(over.available_bytes, 0);
        assert_eq!(over.percentage, 100.0);

        let half = StorageUsage::compute(50, 100);
        assert_eq!(half.available_bytes, 50);
        assert_eq!(half.percentage, 50.0);

        let empty = StorageUsage::compute(0, 100);
        assert_eq!(empty.percentage, 0.0);
    }
}
