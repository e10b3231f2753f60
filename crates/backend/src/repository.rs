use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use studymate_core::model::{
    CalendarEvent, ConversationTurn, DocumentName, NewCalendarEvent, NewQuizResult, Question,
    QuizConfig, QuizResult, UsageSummary, UserId,
};
use url::Url;

use crate::error::BackendError;
use crate::http::HttpBackend;
use crate::memory::InMemoryBackend;

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Input to the quiz generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub filename: DocumentName,
    pub topic: String,
    /// `None` lets the backend pick its defaults.
    pub config: Option<QuizConfig>,
}

/// An image attached to a tutor question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// One question to the document-grounded tutor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorMessage {
    pub filename: DocumentName,
    pub message: String,
    pub image: Option<ChatImage>,
}

/// One conversational turn for the voice coach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachRequest {
    pub user_id: UserId,
    pub message: String,
    pub mode: &'static str,
    pub history: Vec<ConversationTurn>,
}

impl CoachRequest {
    pub const COACH_MODE: &'static str = "coach";

    #[must_use]
    pub fn new(user_id: UserId, message: impl Into<String>, history: Vec<ConversationTurn>) -> Self {
        Self {
            user_id,
            message: message.into(),
            mode: Self::COACH_MODE,
            history,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodcastOutcome {
    Ready(Url),
    /// Nothing was recorded yesterday to build a recap from.
    NoData,
}

/// Uploaded documents owned by the current user.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn list_documents(&self) -> Result<Vec<DocumentName>, BackendError>;

    /// Upload and ingest a document, returning its canonical storage name.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn upload_document(&self, file: UploadFile) -> Result<DocumentName, BackendError>;

    /// Remove a document together with its results.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn delete_document(&self, filename: &DocumentName) -> Result<(), BackendError>;
}

#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// Generate questions for a topic. An empty list means the document had
    /// nothing relevant.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::RateLimited` on HTTP 429, other `BackendError`s
    /// for everything else.
    async fn generate_quiz(&self, request: &QuizRequest) -> Result<Vec<Question>, BackendError>;
}

#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn save_result(&self, result: &NewQuizResult) -> Result<(), BackendError>;

    /// Past attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn list_results(&self) -> Result<Vec<QuizResult>, BackendError>;
}

#[async_trait]
pub trait TutorRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn chat(&self, message: &TutorMessage) -> Result<String, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn chat_history(
        &self,
        filename: &DocumentName,
    ) -> Result<Vec<ConversationTurn>, BackendError>;
}

#[async_trait]
pub trait CoachClient: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn coach(&self, request: &CoachRequest) -> Result<String, BackendError>;
}

/// Remote text-to-speech.
#[async_trait]
pub trait SpeechSynthesisApi: Send + Sync {
    /// Encoded audio for `text`; may be empty when the service produced none.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, BackendError>;
}

#[async_trait]
pub trait PodcastRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn daily_podcast(&self) -> Result<PodcastOutcome, BackendError>;
}

#[async_trait]
pub trait CalendarRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn list_events(&self) -> Result<Vec<CalendarEvent>, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn add_event(&self, event: &NewCalendarEvent) -> Result<(), BackendError>;
}

#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` on transport or server failures.
    async fn usage(&self) -> Result<UsageSummary, BackendError>;
}

/// Aggregates backend interfaces behind trait objects for easy adapter swapping.
#[derive(Clone)]
pub struct Backend {
    pub documents: Arc<dyn DocumentRepository>,
    pub quizzes: Arc<dyn QuizGenerator>,
    pub results: Arc<dyn ResultRepository>,
    pub tutor: Arc<dyn TutorRepository>,
    pub coach: Arc<dyn CoachClient>,
    pub speech: Arc<dyn SpeechSynthesisApi>,
    pub podcasts: Arc<dyn PodcastRepository>,
    pub calendar: Arc<dyn CalendarRepository>,
    pub usage: Arc<dyn UsageRepository>,
}

impl Backend {
    /// Every interface served by one HTTP client.
    #[must_use]
    pub fn http(client: HttpBackend) -> Self {
        Self::from_shared(Arc::new(client))
    }

    /// Every interface served by one in-memory fake.
    #[must_use]
    pub fn in_memory(fake: InMemoryBackend) -> Self {
        Self::from_shared(Arc::new(fake))
    }

    fn from_shared<T>(shared: Arc<T>) -> Self
    where
        T: DocumentRepository
            + QuizGenerator
            + ResultRepository
            + TutorRepository
            + CoachClient
            + SpeechSynthesisApi
            + PodcastRepository
            + CalendarRepository
            + UsageRepository
            + 'static,
    {
        Self {
            documents: shared.clone(),
            quizzes: shared.clone(),
            results: shared.clone(),
            tutor: shared.clone(),
            coach: shared.clone(),
            speech: shared.clone(),
            podcasts: shared.clone(),
            calendar: shared.clone(),
            usage: shared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coach_request_uses_camel_case() {
        let request = CoachRequest::new(
            UserId::new("user_1").unwrap(),
            "what topics",
            vec![ConversationTurn::user("hi"), ConversationTurn::assistant("hello")],
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["userId"], "user_1");
        assert_eq!(json["mode"], "coach");
        assert_eq!(json["history"][1]["role"], "assistant");
    }
}
