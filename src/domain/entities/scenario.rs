use crate::domain::value_objects::{ExerciseType, ScenarioId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_highlights: Vec<String>,
    #[serde(default)]
    pub target_highlights: Vec<String>,
}

/// A bilingual conversation unit as served by the remote API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    pub sentences: Vec<Sentence>,
}

impl Scenario {
    /// Parses a scenario document and checks the fields every consumer relies on.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let scenario: Scenario =
            serde_json::from_value(value).map_err(|e| format!("Malformed scenario: {e}"))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.as_str().trim().is_empty() {
            return Err("Scenario is missing its identifier".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("Scenario is missing its name".to_string());
        }
        Ok(())
    }
}

/// A scenario persisted for offline use, with its lazily filled exercise map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CachedScenario {
    #[serde(flatten)]
    pub scenario: Scenario,
    pub saved_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    /// Keyed by `ExerciseType::as_str()`.
    #[serde(default)]
    pub exercises: BTreeMap<String, Value>,
}

impl CachedScenario {
    pub fn new(scenario: Scenario, now: DateTime<Utc>) -> Self {
        Self {
            scenario,
            saved_at: now,
            last_modified: now,
            exercises: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &ScenarioId {
        &self.scenario.id
    }

    pub fn from_document(document: &str) -> Result<Self, String> {
        let cached: CachedScenario =
            serde_json::from_str(document).map_err(|e| format!("Corrupt cached scenario: {e}"))?;
        cached.scenario.validate()?;
        Ok(cached)
    }

    pub fn to_document(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn has_exercises(&self) -> bool {
        !self.exercises.is_empty()
    }

    pub fn exercise(&self, kind: ExerciseType) -> Option<&Value> {
        self.exercises.get(kind.as_str())
    }

    pub fn set_exercise(&mut self, kind: ExerciseType, payload: Value, now: DateTime<Utc>) {
        self.exercises.insert(kind.as_str().to_string(), payload);
        self.touch(now);
    }

    /// Refreshes `last_modified` without letting it fall behind `saved_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = now.max(self.saved_at);
    }
}

/// Listing row used by cache UIs; built without reading full documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMetadata {
    pub id: ScenarioId,
    pub name: String,
    pub difficulty: Option<String>,
    pub saved_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub size_bytes: u64,
    pub has_exercises: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample() -> Scenario {
        Scenario::from_value(json!({
            "id": "cafe-order",
            "name": "Ordering coffee",
            "difficulty": "beginner",
            "sentences": [
                {"source": "A coffee, please", "target": "Un café, por favor", "targetHighlights": ["café"]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn document_without_sentences_is_corrupt() {
        let err = CachedScenario::from_document(
            r#"{"id":"s1","name":"Broken","savedAt":"2024-01-01T00:00:00Z","lastModified":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap_err();
        assert!(err.contains("sentences"));
    }

    #[test]
    fn document_with_blank_name_is_corrupt() {
        let doc = r#"{"id":"s1","name":" ","sentences":[],"savedAt":"2024-01-01T00:00:00Z","lastModified":"2024-01-01T00:00:00Z"}"#;
        assert!(CachedScenario::from_document(doc).is_err());
    }

    #[test]
    fn document_round_trips_with_exercises() {
        let now = Utc::now();
        let mut cached = CachedScenario::new(sample(), now);
        cached.set_exercise(ExerciseType::Swipe, json!([{"word": "café"}]), now);

        let restored = CachedScenario::from_document(&cached.to_document().unwrap()).unwrap();
        assert_eq!(restored, cached);
        assert!(restored.exercise(ExerciseType::Swipe).is_some());
        assert!(restored.exercise(ExerciseType::Matching).is_none());
    }

    #[test]
    fn touch_never_moves_last_modified_before_saved_at() {
        let now = Utc::now();
        let mut cached = CachedScenario::new(sample(), now);
        cached.touch(now - Duration::hours(1));
        assert_eq!(cached.last_modified, cached.saved_at);
    }
}
