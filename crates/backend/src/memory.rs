use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use studymate_core::Clock;
use studymate_core::model::{
    CalendarEvent, ConversationTurn, DocumentName, EventId, NewCalendarEvent, NewQuizResult,
    Question, QuizResult, ResultId, UsageSummary, UserId,
};

use crate::error::BackendError;
use crate::repository::{
    CalendarRepository, CoachClient, CoachRequest, DocumentRepository, PodcastOutcome,
    PodcastRepository, QuizGenerator, QuizRequest, ResultRepository, SpeechSynthesisApi,
    TutorMessage, TutorRepository, UploadFile, UsageRepository,
};

/// Every call the fake can count or fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListDocuments,
    UploadDocument,
    DeleteDocument,
    GenerateQuiz,
    SaveResult,
    ListResults,
    Chat,
    ChatHistory,
    Coach,
    Synthesize,
    DailyPodcast,
    ListEvents,
    AddEvent,
    Usage,
}

/// A failure injected into one operation until cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    RateLimited,
    Status(StatusCode, Option<String>),
    Unavailable,
}

impl Failure {
    fn to_error(&self) -> BackendError {
        match self {
            Failure::RateLimited => BackendError::RateLimited { detail: None },
            Failure::Status(status, detail) => BackendError::Status {
                status: *status,
                detail: detail.clone(),
            },
            Failure::Unavailable => BackendError::Unavailable,
        }
    }
}

const DEFAULT_COACH_REPLY: &str = "Let's keep going.";

#[derive(Debug)]
struct State {
    clock: Clock,
    user_id: Option<UserId>,
    documents: Vec<DocumentName>,
    questions: Vec<Question>,
    quiz_requests: Vec<QuizRequest>,
    results: Vec<QuizResult>,
    saved_results: Vec<NewQuizResult>,
    next_result_id: i64,
    tutor_replies: VecDeque<String>,
    chat_history: HashMap<DocumentName, Vec<ConversationTurn>>,
    coach_replies: VecDeque<String>,
    coach_requests: Vec<CoachRequest>,
    coach_delay: Option<Duration>,
    audio: Vec<u8>,
    synthesized: Vec<String>,
    podcast: PodcastOutcome,
    events: Vec<CalendarEvent>,
    next_event_id: i64,
    usage: UsageSummary,
    failures: HashMap<Operation, Failure>,
    calls: HashMap<Operation, usize>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            clock: Clock::default(),
            user_id: None,
            documents: Vec::new(),
            questions: Vec::new(),
            quiz_requests: Vec::new(),
            results: Vec::new(),
            saved_results: Vec::new(),
            next_result_id: 1,
            tutor_replies: VecDeque::new(),
            chat_history: HashMap::new(),
            coach_replies: VecDeque::new(),
            coach_requests: Vec::new(),
            coach_delay: None,
            audio: vec![0x49, 0x44, 0x33],
            synthesized: Vec::new(),
            podcast: PodcastOutcome::NoData,
            events: Vec::new(),
            next_event_id: 1,
            usage: UsageSummary {
                total_files_uploaded: 0,
                daily_quiz_questions: 0,
                daily_tutor_questions: 0,
                daily_coach_msgs: 0,
                limit_files: 3,
                limit_quiz: 20,
                limit_tutor: 15,
                limit_coach: 10,
            },
            failures: HashMap::new(),
            calls: HashMap::new(),
        }
    }
}

/// Thread-safe in-memory backend for tests and offline prototyping.
///
/// Clones share state, so a test can keep one handle for scripting and
/// assertions while services own another.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads are stored as `{user_id}_{file_name}`.
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        let backend = Self::new();
        backend.state().user_id = Some(user_id);
        backend
    }

    #[must_use]
    pub fn with_clock(self, clock: Clock) -> Self {
        self.state().clock = clock;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and surface any injected failure.
    fn enter(&self, op: Operation) -> Result<MutexGuard<'_, State>, BackendError> {
        let mut state = self.state();
        *state.calls.entry(op).or_default() += 1;
        if let Some(failure) = state.failures.get(&op) {
            return Err(failure.to_error());
        }
        Ok(state)
    }

    pub fn fail(&self, op: Operation, failure: Failure) {
        self.state().failures.insert(op, failure);
    }

    pub fn clear_failure(&self, op: Operation) {
        self.state().failures.remove(&op);
    }

    #[must_use]
    pub fn calls(&self, op: Operation) -> usize {
        self.state().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn set_documents(&self, documents: Vec<DocumentName>) {
        self.state().documents = documents;
    }

    #[must_use]
    pub fn documents(&self) -> Vec<DocumentName> {
        self.state().documents.clone()
    }

    /// Questions returned by every generation call.
    pub fn set_questions(&self, questions: Vec<Question>) {
        self.state().questions = questions;
    }

    #[must_use]
    pub fn quiz_requests(&self) -> Vec<QuizRequest> {
        self.state().quiz_requests.clone()
    }

    pub fn set_results(&self, results: Vec<QuizResult>) {
        self.state().results = results;
    }

    #[must_use]
    pub fn saved_results(&self) -> Vec<NewQuizResult> {
        self.state().saved_results.clone()
    }

    pub fn push_tutor_reply(&self, reply: impl Into<String>) {
        self.state().tutor_replies.push_back(reply.into());
    }

    /// Replies are handed out in order; once exhausted a stock reply is used.
    pub fn push_coach_reply(&self, reply: impl Into<String>) {
        self.state().coach_replies.push_back(reply.into());
    }

    /// Hold every coach call for `delay` before replying.
    pub fn set_coach_delay(&self, delay: Option<Duration>) {
        self.state().coach_delay = delay;
    }

    #[must_use]
    pub fn coach_requests(&self) -> Vec<CoachRequest> {
        self.state().coach_requests.clone()
    }

    pub fn set_audio(&self, audio: Vec<u8>) {
        self.state().audio = audio;
    }

    #[must_use]
    pub fn synthesized(&self) -> Vec<String> {
        self.state().synthesized.clone()
    }

    pub fn set_podcast(&self, outcome: PodcastOutcome) {
        self.state().podcast = outcome;
    }

    #[must_use]
    pub fn events(&self) -> Vec<CalendarEvent> {
        self.state().events.clone()
    }

    pub fn set_usage(&self, usage: UsageSummary) {
        self.state().usage = usage;
    }
}

#[async_trait]
impl DocumentRepository for InMemoryBackend {
    async fn list_documents(&self) -> Result<Vec<DocumentName>, BackendError> {
        let state = self.enter(Operation::ListDocuments)?;
        Ok(state.documents.clone())
    }

    async fn upload_document(&self, file: UploadFile) -> Result<DocumentName, BackendError> {
        let mut state = self.enter(Operation::UploadDocument)?;
        let stored = match &state.user_id {
            Some(user) => DocumentName::new(format!("{}_{}", user.as_str(), file.file_name)),
            None => DocumentName::new(file.file_name),
        };
        if !state.documents.contains(&stored) {
            state.documents.push(stored.clone());
            state.usage.total_files_uploaded += 1;
        }
        Ok(stored)
    }

    async fn delete_document(&self, filename: &DocumentName) -> Result<(), BackendError> {
        let mut state = self.enter(Operation::DeleteDocument)?;
        state.documents.retain(|doc| doc != filename);
        state.results.retain(|result| &result.filename != filename);
        state.chat_history.remove(filename);
        Ok(())
    }
}

#[async_trait]
impl QuizGenerator for InMemoryBackend {
    async fn generate_quiz(&self, request: &QuizRequest) -> Result<Vec<Question>, BackendError> {
        let mut state = self.enter(Operation::GenerateQuiz)?;
        state.quiz_requests.push(request.clone());
        let questions = state.questions.clone();
        state.usage.daily_quiz_questions += u32::try_from(questions.len()).unwrap_or(u32::MAX);
        Ok(questions)
    }
}

#[async_trait]
impl ResultRepository for InMemoryBackend {
    async fn save_result(&self, result: &NewQuizResult) -> Result<(), BackendError> {
        let mut state = self.enter(Operation::SaveResult)?;
        let id = ResultId::new(state.next_result_id);
        state.next_result_id += 1;
        let stored = QuizResult {
            id: Some(id),
            filename: result.filename.clone(),
            topic: result.topic.clone(),
            score: result.score,
            total_questions: result.total_questions,
            difficulty: Some(result.difficulty),
            mistakes: result.mistakes.clone(),
            created_at: state.clock.now(),
        };
        state.results.insert(0, stored);
        state.saved_results.push(result.clone());
        Ok(())
    }

    async fn list_results(&self) -> Result<Vec<QuizResult>, BackendError> {
        let state = self.enter(Operation::ListResults)?;
        let mut results = state.results.clone();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }
}

#[async_trait]
impl TutorRepository for InMemoryBackend {
    async fn chat(&self, message: &TutorMessage) -> Result<String, BackendError> {
        let mut state = self.enter(Operation::Chat)?;
        let reply = state
            .tutor_replies
            .pop_front()
            .unwrap_or_else(|| format!("Here is what the document says about {}.", message.message));
        let history = state.chat_history.entry(message.filename.clone()).or_default();
        history.push(ConversationTurn::user(message.message.clone()));
        history.push(ConversationTurn::assistant(reply.clone()));
        state.usage.daily_tutor_questions += 1;
        Ok(reply)
    }

    async fn chat_history(
        &self,
        filename: &DocumentName,
    ) -> Result<Vec<ConversationTurn>, BackendError> {
        let state = self.enter(Operation::ChatHistory)?;
        Ok(state.chat_history.get(filename).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl CoachClient for InMemoryBackend {
    async fn coach(&self, request: &CoachRequest) -> Result<String, BackendError> {
        let delay = {
            let mut state = self.enter(Operation::Coach)?;
            state.coach_requests.push(request.clone());
            state.coach_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state();
        state.usage.daily_coach_msgs += 1;
        Ok(state
            .coach_replies
            .pop_front()
            .unwrap_or_else(|| DEFAULT_COACH_REPLY.to_string()))
    }
}

#[async_trait]
impl SpeechSynthesisApi for InMemoryBackend {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, BackendError> {
        let mut state = self.enter(Operation::Synthesize)?;
        state.synthesized.push(text.to_string());
        Ok(state.audio.clone())
    }
}

#[async_trait]
impl PodcastRepository for InMemoryBackend {
    async fn daily_podcast(&self) -> Result<PodcastOutcome, BackendError> {
        let state = self.enter(Operation::DailyPodcast)?;
        Ok(state.podcast.clone())
    }
}

#[async_trait]
impl CalendarRepository for InMemoryBackend {
    async fn list_events(&self) -> Result<Vec<CalendarEvent>, BackendError> {
        let state = self.enter(Operation::ListEvents)?;
        Ok(state.events.clone())
    }

    async fn add_event(&self, event: &NewCalendarEvent) -> Result<(), BackendError> {
        let mut state = self.enter(Operation::AddEvent)?;
        let id = EventId::new(state.next_event_id);
        state.next_event_id += 1;
        state.events.push(CalendarEvent {
            id,
            title: event.title.clone(),
            description: event.description.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            category: event.category.clone(),
            priority: event.priority,
        });
        Ok(())
    }
}

#[async_trait]
impl UsageRepository for InMemoryBackend {
    async fn usage(&self) -> Result<UsageSummary, BackendError> {
        let state = self.enter(Operation::Usage)?;
        Ok(state.usage)
    }
}
