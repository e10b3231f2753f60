use std::sync::Arc;

use backend::{
    Backend, DocumentRepository, ProgressFeed, QuizGenerator, QuizRequest, ResultRepository,
    UploadFile,
};
use studymate_core::model::{
    Answers, Difficulty, DocumentName, NewQuizResult, PracticeLink, Question, QuestionCount,
    QuestionId, QuizConfig, QuizOutcome, UserId, grade,
};
use tracing::{error, info, warn};

use super::state::{Notice, PendingPractice, PendingSave, WizardStep};
use crate::error::QuizSessionError;

/// Drives one user through upload, configuration, quiz taking and results.
///
/// Every operation that touches the backend takes `&mut self`, so a session
/// can only have one upload or generation outstanding at a time.
pub struct QuizSessionController {
    user_id: UserId,
    documents: Arc<dyn DocumentRepository>,
    quizzes: Arc<dyn QuizGenerator>,
    results: Arc<dyn ResultRepository>,
    progress: ProgressFeed,

    step: WizardStep,
    library: Vec<DocumentName>,
    file: Option<DocumentName>,
    topic: String,
    question_count_input: String,
    config: QuizConfig,
    questions: Vec<Question>,
    answers: Answers,
    outcome: Option<QuizOutcome>,
    notice: Option<Notice>,
}

impl QuizSessionController {
    #[must_use]
    pub fn new(user_id: UserId, backend: &Backend) -> Self {
        let config = QuizConfig::default();
        Self {
            user_id,
            documents: Arc::clone(&backend.documents),
            quizzes: Arc::clone(&backend.quizzes),
            results: Arc::clone(&backend.results),
            progress: ProgressFeed::new(),
            step: WizardStep::Upload,
            library: Vec::new(),
            file: None,
            topic: String::new(),
            question_count_input: config.question_count.to_string(),
            config,
            questions: Vec::new(),
            answers: Answers::new(),
            outcome: None,
            notice: None,
        }
    }

    /// Publish upload progress into `feed` instead of a private one.
    #[must_use]
    pub fn with_progress(mut self, feed: ProgressFeed) -> Self {
        self.progress = feed;
        self
    }

    #[must_use]
    pub fn step(&self) -> WizardStep {
        self.step
    }

    #[must_use]
    pub fn library(&self) -> &[DocumentName] {
        &self.library
    }

    #[must_use]
    pub fn file(&self) -> Option<&DocumentName> {
        self.file.as_ref()
    }

    /// The active document's name without the owner prefix.
    #[must_use]
    pub fn file_display_name(&self) -> Option<&str> {
        self.file.as_ref().map(|file| file.display_name(&self.user_id))
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn config(&self) -> QuizConfig {
        self.config
    }

    #[must_use]
    pub fn question_count_input(&self) -> &str {
        &self.question_count_input
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&QuizOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.outcome.as_ref().map_or(0, |outcome| outcome.score)
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressFeed {
        &self.progress
    }

    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }

    /// Acknowledge the current notice.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    fn raise(&mut self, err: QuizSessionError) -> QuizSessionError {
        self.notice = Some(err.notice());
        err
    }

    /// Load the library and, if navigation asked for it, start the requested
    /// practice quiz straight away. The request is consumed even when the
    /// quiz cannot start.
    ///
    /// # Errors
    ///
    /// Returns the auto-start generation error; the wizard is then left on
    /// `Configure` with the requested document and topic filled in.
    pub async fn mount(&mut self, pending: &PendingPractice) -> Result<(), QuizSessionError> {
        let _ = self.refresh_library().await;
        match pending.take() {
            Some(link) => self.auto_start(link).await,
            None => Ok(()),
        }
    }

    async fn auto_start(&mut self, link: PracticeLink) -> Result<(), QuizSessionError> {
        info!(filename = %link.filename, topic = %link.topic, "auto-starting practice quiz");
        self.file = Some(link.filename);
        self.topic = link.topic;
        let result = self.generate().await;
        if result.is_err() {
            self.step = WizardStep::Configure;
        }
        result
    }

    /// Reload the user's documents.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Library` and raises
    /// `Notice::LibraryUnavailable`; the previous list is kept.
    pub async fn refresh_library(&mut self) -> Result<(), QuizSessionError> {
        match self.documents.list_documents().await {
            Ok(files) => {
                self.library = files;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load library");
                Err(self.raise(QuizSessionError::Library(err)))
            }
        }
    }

    /// Upload a picked file. `None` (an empty pick) does nothing.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Upload` and stays on the current step.
    pub async fn upload(&mut self, file: Option<UploadFile>) -> Result<(), QuizSessionError> {
        let Some(file) = file else {
            return Ok(());
        };
        self.progress.reset();
        let name = match self.documents.upload_document(file).await {
            Ok(name) => name,
            Err(err) => {
                error!(error = %err, "upload failed");
                return Err(self.raise(QuizSessionError::Upload(err)));
            }
        };
        info!(filename = %name, "upload complete");
        self.adopt_document(name);
        let _ = self.refresh_library().await;
        Ok(())
    }

    /// Pick an already uploaded document.
    pub fn select_document(&mut self, filename: DocumentName) {
        self.adopt_document(filename);
    }

    fn adopt_document(&mut self, filename: DocumentName) {
        if self.file.as_ref() != Some(&filename) {
            self.topic.clear();
        }
        self.file = Some(filename);
        self.step = WizardStep::Configure;
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }

    /// Record the raw question-count text as typed.
    pub fn set_question_count_input(&mut self, raw: impl Into<String>) {
        self.question_count_input = raw.into();
    }

    /// Snap the typed question count into range (the input lost focus).
    pub fn commit_question_count(&mut self) -> QuestionCount {
        let count = QuestionCount::from_input(&self.question_count_input);
        self.config.question_count = count;
        self.question_count_input = count.to_string();
        count
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.config.difficulty = difficulty;
    }

    /// Generate a quiz for the active document and topic. Does nothing when
    /// either is missing.
    ///
    /// # Errors
    ///
    /// Returns `NoRelevantInfo` for an empty quiz, `RateLimited` for HTTP 429
    /// and `Generation` otherwise; the step is left unchanged.
    pub async fn generate(&mut self) -> Result<(), QuizSessionError> {
        let topic = self.topic.trim().to_string();
        let Some(filename) = self.file.clone() else {
            return Ok(());
        };
        if topic.is_empty() {
            return Ok(());
        }
        self.commit_question_count();

        let request = QuizRequest {
            filename,
            topic,
            config: Some(self.config),
        };
        let questions = match self.quizzes.generate_quiz(&request).await {
            Ok(questions) => questions,
            Err(err) => {
                error!(error = %err, "quiz generation failed");
                return Err(self.raise(QuizSessionError::from_generation(err)));
            }
        };

        let questions = usable_questions(questions);
        if questions.is_empty() {
            return Err(self.raise(QuizSessionError::NoRelevantInfo));
        }
        self.questions = questions;
        self.answers.clear();
        self.outcome = None;
        self.step = WizardStep::Active;
        Ok(())
    }

    /// Record the chosen option; choosing again overwrites.
    pub fn select_option(&mut self, question_id: QuestionId, option: impl Into<String>) {
        if self.step == WizardStep::Active {
            self.answers.select(question_id, option);
        }
    }

    /// Grade the quiz and show results. The score is final on return; the
    /// result is saved in the background and a failed save is only logged.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&mut self) -> Option<PendingSave> {
        if self.step != WizardStep::Active {
            return None;
        }
        let outcome = grade(&self.questions, &self.answers);
        self.step = WizardStep::Results;
        let payload = self.file.clone().map(|file| {
            NewQuizResult::from_outcome(file, self.topic.trim(), self.config.difficulty, &outcome)
        });
        self.outcome = Some(outcome);
        let payload = payload?;

        let results = Arc::clone(&self.results);
        let handle = tokio::spawn(async move {
            match results.save_result(&payload).await {
                Ok(()) => {
                    info!(score = payload.score, total = payload.total_questions, "quiz result saved");
                    true
                }
                Err(err) => {
                    warn!(error = %err, "failed to save quiz result");
                    false
                }
            }
        });
        Some(PendingSave::new(handle))
    }

    /// Start over with a different document.
    pub async fn new_file(&mut self) {
        self.step = WizardStep::Upload;
        self.file = None;
        self.topic.clear();
        self.clear_quiz();
        let _ = self.refresh_library().await;
    }

    /// Quiz the same document on another topic.
    pub fn new_topic(&mut self) {
        self.step = WizardStep::Configure;
        self.clear_quiz();
    }

    fn clear_quiz(&mut self) {
        self.questions.clear();
        self.answers.clear();
        self.outcome = None;
    }
}

fn usable_questions(questions: Vec<Question>) -> Vec<Question> {
    questions
        .into_iter()
        .filter(|question| match question.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!(id = %question.id, error = %err, "dropping malformed question");
                false
            }
        })
        .collect()
}
