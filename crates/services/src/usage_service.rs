use std::sync::Arc;

use backend::{BackendError, UsageRepository};
use studymate_core::model::{QuestionCount, UsageSummary};
use tracing::debug;

/// Quota counters for the signed-in user.
#[derive(Clone)]
pub struct UsageService {
    usage: Arc<dyn UsageRepository>,
}

impl UsageService {
    #[must_use]
    pub fn new(usage: Arc<dyn UsageRepository>) -> Self {
        Self { usage }
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the backend call fails.
    pub async fn summary(&self) -> Result<UsageSummary, BackendError> {
        let usage = self.usage.usage().await?;
        debug!(
            quiz = usage.daily_quiz_questions,
            tutor = usage.daily_tutor_questions,
            coach = usage.daily_coach_msgs,
            "usage fetched"
        );
        Ok(usage)
    }

    /// Whether a quiz of `count` questions still fits today's allowance.
    /// Returns `true` when usage cannot be fetched.
    pub async fn quiz_fits(&self, count: QuestionCount) -> bool {
        match self.summary().await {
            Ok(usage) => !usage.quiz_would_exceed(count.get()),
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{Failure, InMemoryBackend, Operation};

    fn usage(daily_quiz_questions: u32) -> UsageSummary {
        UsageSummary {
            total_files_uploaded: 1,
            daily_quiz_questions,
            daily_tutor_questions: 0,
            daily_coach_msgs: 0,
            limit_files: 3,
            limit_quiz: 20,
            limit_tutor: 15,
            limit_coach: 10,
        }
    }

    #[tokio::test]
    async fn quiz_fits_compares_against_remaining_allowance() {
        let backend = InMemoryBackend::new();
        backend.set_usage(usage(15));
        let service = UsageService::new(Arc::new(backend.clone()));

        assert!(service.quiz_fits(QuestionCount::from_input("5")).await);
        assert!(!service.quiz_fits(QuestionCount::from_input("6")).await);

        backend.fail(Operation::Usage, Failure::Unavailable);
        assert!(service.quiz_fits(QuestionCount::from_input("12")).await);
    }
}
