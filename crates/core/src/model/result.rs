use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::document::DocumentName;
use crate::model::ids::ResultId;
use crate::model::quiz::{Difficulty, Mistake, QuizOutcome};

/// Payload persisted after a quiz is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuizResult {
    pub filename: DocumentName,
    pub topic: String,
    pub score: u32,
    pub total_questions: u32,
    pub difficulty: Difficulty,
    pub mistakes: Vec<Mistake>,
}

impl NewQuizResult {
    #[must_use]
    pub fn from_outcome(
        filename: DocumentName,
        topic: impl Into<String>,
        difficulty: Difficulty,
        outcome: &QuizOutcome,
    ) -> Self {
        Self {
            filename,
            topic: topic.into(),
            score: outcome.score,
            total_questions: outcome.total,
            difficulty,
            mistakes: outcome.mistakes.clone(),
        }
    }
}

/// A past attempt as listed by the results endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResultId>,
    pub filename: DocumentName,
    pub topic: String,
    pub score: u32,
    pub total_questions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub mistakes: Vec<Mistake>,
    pub created_at: DateTime<Utc>,
}

impl QuizResult {
    #[must_use]
    pub fn percent(&self) -> u32 {
        percent(self.score, self.total_questions)
    }
}

/// Rounded percentage; 0 when there were no questions.
#[must_use]
pub fn percent(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = u64::from(score) * 100;
    let total = u64::from(total);
    // round half up
    u32::try_from((scaled * 2 + total) / (total * 2)).unwrap_or(u32::MAX)
}

/// Results for one document, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResults {
    pub filename: DocumentName,
    pub attempts: Vec<QuizResult>,
}

/// Group results by document, keeping the first-seen order of documents
/// and the incoming order of attempts.
#[must_use]
pub fn group_by_file(results: Vec<QuizResult>) -> Vec<DocumentResults> {
    let mut groups: Vec<DocumentResults> = Vec::new();
    for result in results {
        match groups.iter_mut().find(|g| g.filename == result.filename) {
            Some(group) => group.attempts.push(result),
            None => groups.push(DocumentResults {
                filename: result.filename.clone(),
                attempts: vec![result],
            }),
        }
    }
    groups
}
