use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutation kinds the sync engine knows how to submit.
///
/// `Unknown` carries tags written by a different client version; the engine
/// treats them as delivered so the queue never jams on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncOperationType {
    SaveHistory,
    UpdateProgress,
    SaveScenario,
    Unknown(String),
}

impl SyncOperationType {
    pub fn as_str(&self) -> &str {
        match self {
            SyncOperationType::SaveHistory => "save-history",
            SyncOperationType::UpdateProgress => "update-progress",
            SyncOperationType::SaveScenario => "save-scenario",
            SyncOperationType::Unknown(value) => value.as_str(),
        }
    }
}

impl From<&str> for SyncOperationType {
    fn from(value: &str) -> Self {
        match value {
            "save-history" => SyncOperationType::SaveHistory,
            "update-progress" => SyncOperationType::UpdateProgress,
            "save-scenario" => SyncOperationType::SaveScenario,
            other => SyncOperationType::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for SyncOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SyncOperationType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SyncOperationType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SyncOperationType::from(raw.as_str()))
    }
}
