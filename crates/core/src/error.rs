use thiserror::Error;

use crate::model::{CalendarEventError, QuestionError, QuizConfigError, UserIdError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    QuizConfig(#[from] QuizConfigError),
    #[error(transparent)]
    CalendarEvent(#[from] CalendarEventError),
    #[error(transparent)]
    UserId(#[from] UserIdError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;

    #[test]
    fn validation_errors_convert() {
        let err: Error = UserId::new(" ").unwrap_err().into();
        assert!(matches!(err, Error::UserId(UserIdError::Empty)));
        assert_eq!(err.to_string(), "user id cannot be empty");
    }
}
