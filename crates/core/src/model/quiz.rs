use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::Question;

//
// ─── CONFIGURATION ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizConfigError {
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

/// Requested difficulty of generated questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuizConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(QuizConfigError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Number of questions to generate, always within `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub struct QuestionCount(u8);

impl QuestionCount {
    pub const MIN: u8 = 5;
    pub const MAX: u8 = 12;

    /// Snap any value into range; out-of-range input is never rejected.
    #[must_use]
    pub fn clamp(raw: i64) -> Self {
        let bounded = raw.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        Self(u8::try_from(bounded).unwrap_or(Self::MIN))
    }

    /// Interpret free-form text from the count input when it loses focus.
    ///
    /// Text that is not a number snaps to the minimum.
    #[must_use]
    pub fn from_input(raw: &str) -> Self {
        raw.trim()
            .parse::<i64>()
            .map_or(Self(Self::MIN), Self::clamp)
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for QuestionCount {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl fmt::Display for QuestionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for QuestionCount {
    fn from(value: u8) -> Self {
        Self::clamp(i64::from(value))
    }
}

impl From<QuestionCount> for u8 {
    fn from(value: QuestionCount) -> Self {
        value.0
    }
}

/// Generation settings chosen on the configure step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuizConfig {
    pub question_count: QuestionCount,
    pub difficulty: Difficulty,
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// The option chosen for each answered question.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Answers {
    chosen: HashMap<QuestionId, String>,
}

impl Answers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or overwrite) the chosen option for a question.
    pub fn select(&mut self, question_id: QuestionId, option: impl Into<String>) {
        self.chosen.insert(question_id, option.into());
    }

    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> Option<&str> {
        self.chosen.get(&question_id).map(String::as_str)
    }

    #[must_use]
    pub fn answered(&self) -> usize {
        self.chosen.len()
    }

    pub fn clear(&mut self) {
        self.chosen.clear();
    }
}

//
// ─── GRADING ───────────────────────────────────────────────────────────────────
//

/// Placeholder recorded for questions the user never answered.
pub const SKIPPED: &str = "Skipped";

/// A question the user got wrong or skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mistake {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Result of grading a submitted quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub score: u32,
    pub total: u32,
    pub mistakes: Vec<Mistake>,
}

impl QuizOutcome {
    #[must_use]
    pub fn percent(&self) -> u32 {
        crate::model::result::percent(self.score, self.total)
    }

    /// 70% or better.
    #[must_use]
    pub fn is_passing(&self) -> bool {
        self.total > 0 && u64::from(self.score) * 10 >= u64::from(self.total) * 7
    }
}

/// Score a quiz: one point per question whose stored answer equals the
/// correct answer exactly. Unanswered questions score nothing and are
/// listed as skipped mistakes.
#[must_use]
pub fn grade(questions: &[Question], answers: &Answers) -> QuizOutcome {
    let mut score = 0_u32;
    let mut mistakes = Vec::new();

    for question in questions {
        match answers.get(question.id) {
            Some(chosen) if question.is_correct(chosen) => score = score.saturating_add(1),
            chosen => mistakes.push(Mistake {
                question: question.text.clone(),
                user_answer: chosen.unwrap_or(SKIPPED).to_string(),
                correct_answer: question.correct_answer.clone(),
                explanation: question.explanation.clone(),
            }),
        }
    }

    QuizOutcome {
        score,
        total: u32::try_from(questions.len()).unwrap_or(u32::MAX),
        mistakes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::fixtures::question;

    #[test]
    fn count_snaps_to_bounds() {
        assert_eq!(QuestionCount::clamp(3).get(), 5);
        assert_eq!(QuestionCount::clamp(20).get(), 12);
        assert_eq!(QuestionCount::clamp(7).get(), 7);
        assert_eq!(QuestionCount::clamp(-4).get(), 5);
    }

    #[test]
    fn count_from_input_text() {
        assert_eq!(QuestionCount::from_input("3").get(), 5);
        assert_eq!(QuestionCount::from_input(" 20 ").get(), 12);
        assert_eq!(QuestionCount::from_input("7").get(), 7);
        assert_eq!(QuestionCount::from_input("").get(), 5);
        assert_eq!(QuestionCount::from_input("lots").get(), 5);
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn selecting_twice_is_idempotent() {
        let mut once = Answers::new();
        once.select(QuestionId::new(1), "A");

        let mut twice = Answers::new();
        twice.select(QuestionId::new(1), "A");
        twice.select(QuestionId::new(1), "A");

        assert_eq!(once, twice);
    }

    #[test]
    fn reselecting_overwrites() {
        let mut answers = Answers::new();
        answers.select(QuestionId::new(1), "A");
        answers.select(QuestionId::new(1), "C");
        assert_eq!(answers.get(QuestionId::new(1)), Some("C"));
        assert_eq!(answers.answered(), 1);
    }

    #[test]
    fn grading_counts_exact_matches_and_records_skips() {
        let questions = vec![question(1, "A"), question(2, "B"), question(3, "C")];
        let mut answers = Answers::new();
        answers.select(QuestionId::new(1), "A");
        answers.select(QuestionId::new(2), "D");

        let outcome = grade(&questions, &answers);

        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.mistakes.len(), 2);
        assert_eq!(outcome.mistakes[0].user_answer, "D");
        assert_eq!(outcome.mistakes[0].correct_answer, "B");
        assert_eq!(outcome.mistakes[1].user_answer, SKIPPED);
        assert_eq!(outcome.percent(), 33);
        assert!(!outcome.is_passing());
    }

    #[test]
    fn empty_answers_score_zero() {
        let questions = vec![question(1, "A"), question(2, "B")];
        let outcome = grade(&questions, &Answers::new());
        assert_eq!(outcome.score, 0);
        assert!(outcome.mistakes.iter().all(|m| m.user_answer == SKIPPED));
    }

    #[test]
    fn passing_threshold_is_seventy_percent() {
        let outcome = QuizOutcome {
            score: 7,
            total: 10,
            mistakes: Vec::new(),
        };
        assert!(outcome.is_passing());
        let outcome = QuizOutcome {
            score: 6,
            total: 10,
            mistakes: Vec::new(),
        };
        assert!(!outcome.is_passing());
    }
}
