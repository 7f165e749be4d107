use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Closed set of drill formats generated per scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseType {
    FillInBlank,
    Matching,
    SentenceScramble,
    Swipe,
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 4] = [
        ExerciseType::FillInBlank,
        ExerciseType::Matching,
        ExerciseType::SentenceScramble,
        ExerciseType::Swipe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::FillInBlank => "fill-in-blank",
            ExerciseType::Matching => "matching",
            ExerciseType::SentenceScramble => "sentence-scramble",
            ExerciseType::Swipe => "swipe",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "fill-in-blank" => Ok(ExerciseType::FillInBlank),
            "matching" => Ok(ExerciseType::Matching),
            "sentence-scramble" => Ok(ExerciseType::SentenceScramble),
            "swipe" => Ok(ExerciseType::Swipe),
            other => Err(format!("Unknown exercise type: {other}")),
        }
    }
}
