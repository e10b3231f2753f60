//! Shared error types for the services crate.

use thiserror::Error;

use backend::{BackendError, ConfigError};
use studymate_core::model::{CalendarEventError, UserIdError};

use crate::quiz::Notice;

/// Errors emitted by `QuizSessionController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizSessionError {
    #[error("upload failed: {0}")]
    Upload(#[source] BackendError),
    #[error("the AI couldn't find relevant info for this topic")]
    NoRelevantInfo,
    #[error("daily quiz limit reached")]
    RateLimited(#[source] BackendError),
    #[error("quiz generation failed: {0}")]
    Generation(#[source] BackendError),
    #[error("could not load the document library: {0}")]
    Library(#[source] BackendError),
}

impl QuizSessionError {
    /// The blocking notice shown to the user.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            QuizSessionError::Upload(_) => Notice::UploadFailed,
            QuizSessionError::NoRelevantInfo => Notice::NoRelevantInfo,
            QuizSessionError::RateLimited(_) => Notice::DailyLimitReached,
            QuizSessionError::Generation(_) => Notice::GenerationFailed,
            QuizSessionError::Library(_) => Notice::LibraryUnavailable,
        }
    }

    #[must_use]
    pub fn user_message(&self) -> &'static str {
        self.notice().message()
    }

    /// Wrap a generation failure, keeping rate limits distinct.
    #[must_use]
    pub fn from_generation(err: BackendError) -> Self {
        if err.is_rate_limited() {
            QuizSessionError::RateLimited(err)
        } else {
            QuizSessionError::Generation(err)
        }
    }
}

/// Errors emitted by `SpeechIo` and the platform speech adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpeechError {
    #[error("speech recognition is not supported on this device")]
    Unsupported,
    #[error("microphone error: {0}")]
    Recognition(String),
    #[error("audio playback failed: {0}")]
    Playback(String),
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

impl SpeechError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SpeechError::Unsupported => "Speech recognition is not supported here.".into(),
            other => other.to_string(),
        }
    }
}

/// Errors emitted by `VoiceAssistant`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VoiceError {
    #[error("no user id provided")]
    MissingUserId(#[from] UserIdError),
    #[error(transparent)]
    Speech(#[from] SpeechError),
    #[error("coach request failed: {0}")]
    Coach(#[from] BackendError),
}

/// Errors emitted by `TutorService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TutorError {
    #[error("message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl TutorError {
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            TutorError::EmptyMessage => "Type a question first.",
            TutorError::Backend(err) if err.is_rate_limited() => {
                "Daily tutor limit reached. Please try again tomorrow."
            }
            TutorError::Backend(_) => "Error connecting to AI Tutor.",
        }
    }
}

/// Errors emitted by `CalendarService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CalendarServiceError {
    #[error(transparent)]
    Event(#[from] CalendarEventError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors emitted while reading application configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppConfigError {
    #[error(transparent)]
    Backend(#[from] ConfigError),
    #[error(transparent)]
    UserId(#[from] UserIdError),
    #[error("STUDYMATE_USER_ID is not set")]
    MissingUserId,
    #[error("STUDYMATE_TOKEN is not set")]
    MissingToken,
    #[error("invalid value for {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] AppConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_get_their_own_message() {
        let limited = QuizSessionError::from_generation(BackendError::RateLimited { detail: None });
        let generic = QuizSessionError::from_generation(BackendError::Unavailable);

        assert!(matches!(limited, QuizSessionError::RateLimited(_)));
        assert!(matches!(generic, QuizSessionError::Generation(_)));
        assert_ne!(limited.user_message(), generic.user_message());
    }
}
