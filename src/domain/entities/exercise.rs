use crate::domain::value_objects::ExerciseType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FillInBlankItem {
    pub sentence: String,
    pub answer: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub translation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchingPair {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchingPairs {
    pub pairs: Vec<MatchingPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrambleItem {
    pub sentence: String,
    pub words: Vec<String>,
    #[serde(default)]
    pub translation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwipeCard {
    pub word: String,
    pub translation: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExerciseContent {
    FillInBlank(Vec<FillInBlankItem>),
    Matching(MatchingPairs),
    SentenceScramble(Vec<ScrambleItem>),
    Swipe(Vec<SwipeCard>),
}

/// A validated exercise payload for one (scenario, type) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ExercisePayload {
    pub exercise_type: ExerciseType,
    pub content: ExerciseContent,
}

impl ExercisePayload {
    /// Checks `value` against the required-field shape of `kind`.
    ///
    /// Payloads missing required fields, or carrying no items, are rejected as
    /// a whole; there is no partial result.
    pub fn parse(kind: ExerciseType, value: &Value) -> Result<Self, String> {
        let content = match kind {
            ExerciseType::FillInBlank => {
                let items: Vec<FillInBlankItem> = decode(kind, value)?;
                ensure_not_empty(kind, items.len())?;
                ExerciseContent::FillInBlank(items)
            }
            ExerciseType::Matching => {
                let pairs: MatchingPairs = decode(kind, value)?;
                ensure_not_empty(kind, pairs.pairs.len())?;
                ExerciseContent::Matching(pairs)
            }
            ExerciseType::SentenceScramble => {
                let items: Vec<ScrambleItem> = decode(kind, value)?;
                ensure_not_empty(kind, items.len())?;
                if items.iter().any(|item| item.words.is_empty()) {
                    return Err("sentence-scramble item has no words".to_string());
                }
                ExerciseContent::SentenceScramble(items)
            }
            ExerciseType::Swipe => {
                let cards: Vec<SwipeCard> = decode(kind, value)?;
                ensure_not_empty(kind, cards.len())?;
                ExerciseContent::Swipe(cards)
            }
        };

        Ok(Self {
            exercise_type: kind,
            content,
        })
    }

    pub fn to_value(&self) -> Value {
        let encoded = match &self.content {
            ExerciseContent::FillInBlank(items) => serde_json::to_value(items),
            ExerciseContent::Matching(pairs) => serde_json::to_value(pairs),
            ExerciseContent::SentenceScramble(items) => serde_json::to_value(items),
            ExerciseContent::Swipe(cards) => serde_json::to_value(cards),
        };
        // Plain structs of strings and bools always encode.
        encoded.unwrap_or(Value::Null)
    }
}

fn decode<T: serde::de::DeserializeOwned>(kind: ExerciseType, value: &Value) -> Result<T, String> {
    serde_json::from_value(value.clone()).map_err(|e| format!("Invalid {kind} payload: {e}"))
}

fn ensure_not_empty(kind: ExerciseType, len: usize) -> Result<(), String> {
    if len == 0 {
        return Err(format!("{kind} payload has no items"));
    }
    Ok(())
}
