use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Queue identifier: `<enqueue millis>-<process sequence>-<random suffix>`.
///
/// The sequence and the random suffix keep two ids minted in the same
/// millisecond distinct, within one process and across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncOperationId(String);

impl SyncOperationId {
    pub fn generate(timestamp_ms: i64) -> Self {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{timestamp_ms}-{seq}-{}", &suffix[..8]))
    }

    pub fn new(value: String) -> Result<Self, String> {
        if value.trim().is_empty() {
            return Err("Sync operation ID cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncOperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SyncOperationId> for String {
    fn from(id: SyncOperationId) -> Self {
        id.0
    }
}
