use crate::domain::value_objects::{ExerciseType, ScenarioId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ephemeral learner position, persisted so a restart can resume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub active_scenario_id: Option<ScenarioId>,
    #[serde(default)]
    pub sentence_index: usize,
    #[serde(default)]
    pub completed_exercises: Vec<ExerciseType>,
    #[serde(default)]
    pub state: Value,
    pub updated_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn new(active_scenario_id: Option<ScenarioId>, now: DateTime<Utc>) -> Self {
        Self {
            active_scenario_id,
            sentence_index: 0,
            completed_exercises: Vec::new(),
            state: Value::Null,
            updated_at: now,
        }
    }
}
