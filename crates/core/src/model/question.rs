use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question needs at least two options, got {count}")]
    TooFewOptions { count: usize },

    #[error("correct answer does not match any option")]
    AnswerNotInOptions,

    #[error("correct answer matches {count} options")]
    AmbiguousAnswer { count: usize },
}

/// One generated multiple-choice question.
///
/// Field names follow the generation endpoint's JSON (`question`,
/// `correctAnswer`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// Check that the correct answer is exactly one of the options.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` describing the first violated rule.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: self.options.len(),
            });
        }
        match self
            .options
            .iter()
            .filter(|option| **option == self.correct_answer)
            .count()
        {
            0 => Err(QuestionError::AnswerNotInOptions),
            1 => Ok(()),
            count => Err(QuestionError::AmbiguousAnswer { count }),
        }
    }

    /// Exact string comparison, the same rule used for scoring.
    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        option == self.correct_answer
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn question(id: u64, correct: &str) -> Question {
        Question {
            id: QuestionId::new(id),
            text: format!("Question {id}?"),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: correct.into(),
            explanation: Some(format!("Because {correct}.")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::question;
    use super::*;

    #[test]
    fn deserializes_backend_shape() {
        let json = r#"{
            "id": 1,
            "question": "What is the powerhouse of the cell?",
            "options": ["Nucleus", "Mitochondria", "Ribosome", "Golgi"],
            "correctAnswer": "Mitochondria",
            "explanation": "Mitochondria produce ATP."
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.id, QuestionId::new(1));
        assert_eq!(q.correct_answer, "Mitochondria");
        assert!(q.validate().is_ok());
    }

    #[test]
    fn explanation_is_optional() {
        let json = r#"{"id":2,"question":"Q","options":["x","y"],"correctAnswer":"y"}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.explanation, None);
    }

    #[test]
    fn rejects_answer_outside_options() {
        let q = question(1, "E");
        assert_eq!(q.validate(), Err(QuestionError::AnswerNotInOptions));
    }

    #[test]
    fn rejects_duplicated_correct_option() {
        let mut q = question(1, "A");
        q.options[1] = "A".into();
        assert_eq!(q.validate(), Err(QuestionError::AmbiguousAnswer { count: 2 }));
    }

    #[test]
    fn correctness_is_exact_match() {
        let q = question(1, "B");
        assert!(q.is_correct("B"));
        assert!(!q.is_correct("b"));
        assert!(!q.is_correct("B "));
    }
}
