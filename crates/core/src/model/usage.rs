use serde::{Deserialize, Serialize};

/// Quota counters reported by the backend. Daily counters reset at the
/// backend's day boundary; the file count is a lifetime limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total_files_uploaded: u32,
    pub daily_quiz_questions: u32,
    pub daily_tutor_questions: u32,
    pub daily_coach_msgs: u32,
    pub limit_files: u32,
    pub limit_quiz: u32,
    pub limit_tutor: u32,
    pub limit_coach: u32,
}

impl UsageSummary {
    #[must_use]
    pub fn remaining_files(&self) -> u32 {
        self.limit_files.saturating_sub(self.total_files_uploaded)
    }

    #[must_use]
    pub fn remaining_quiz_questions(&self) -> u32 {
        self.limit_quiz.saturating_sub(self.daily_quiz_questions)
    }

    #[must_use]
    pub fn remaining_tutor_questions(&self) -> u32 {
        self.limit_tutor.saturating_sub(self.daily_tutor_questions)
    }

    #[must_use]
    pub fn remaining_coach_msgs(&self) -> u32 {
        self.limit_coach.saturating_sub(self.daily_coach_msgs)
    }

    /// Whether a quiz of `questions` would exceed today's allowance.
    #[must_use]
    pub fn quiz_would_exceed(&self, questions: u8) -> bool {
        u32::from(questions) > self.remaining_quiz_questions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_never_underflows() {
        let usage = UsageSummary {
            total_files_uploaded: 4,
            daily_quiz_questions: 18,
            daily_tutor_questions: 0,
            daily_coach_msgs: 10,
            limit_files: 3,
            limit_quiz: 20,
            limit_tutor: 15,
            limit_coach: 10,
        };
        assert_eq!(usage.remaining_files(), 0);
        assert_eq!(usage.remaining_quiz_questions(), 2);
        assert_eq!(usage.remaining_tutor_questions(), 15);
        assert_eq!(usage.remaining_coach_msgs(), 0);
        assert!(usage.quiz_would_exceed(5));
        assert!(!usage.quiz_would_exceed(2));
    }
}
