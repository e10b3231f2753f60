use std::sync::Arc;
use std::time::Duration;

use backend::{
    AuthContext, Backend, HttpBackend, InMemoryBackend, ProgressFeed, ProgressSubscription,
    StaticToken,
};
use studymate_core::model::{HighlightWindow, UserId};

use crate::Clock;
use crate::calendar_service::CalendarService;
use crate::config::AppConfig;
use crate::error::AppServicesError;
use crate::library_service::LibraryService;
use crate::podcast_service::PodcastService;
use crate::quiz::QuizSessionController;
use crate::speech::{AudioOutput, NativeSynthesizer, Recognizer, SpeechIo};
use crate::tutor_service::TutorService;
use crate::usage_service::UsageService;
use crate::voice::VoiceAssistant;

/// Assembles app-facing services over one backend for one signed-in user.
#[derive(Clone)]
pub struct AppServices {
    user_id: UserId,
    backend: Backend,
    progress_url: Option<String>,
    silence: Duration,
    highlight_window: HighlightWindow,
    library: Arc<LibraryService>,
    tutor: Arc<TutorService>,
    podcast: Arc<PodcastService>,
    calendar: Arc<CalendarService>,
    usage: Arc<UsageService>,
}

impl AppServices {
    /// Build services backed by the remote API described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let auth = AuthContext::new(
            config.user_id.clone(),
            Arc::new(StaticToken::new(config.token.clone())),
        );
        let client = HttpBackend::new(config.backend.clone(), auth)?;
        let progress_url = config.backend.progress_url(&config.user_id);

        let mut services = Self::assemble(config.user_id.clone(), Backend::http(client), clock);
        services.progress_url = Some(progress_url);
        services.silence = config.silence;
        services.highlight_window = config.highlight_window;
        Ok(services)
    }

    /// Build services over an in-memory backend.
    #[must_use]
    pub fn in_memory(user_id: UserId, fake: InMemoryBackend, clock: Clock) -> Self {
        Self::assemble(user_id, Backend::in_memory(fake), clock)
    }

    fn assemble(user_id: UserId, backend: Backend, clock: Clock) -> Self {
        let library = Arc::new(LibraryService::new(
            clock,
            Arc::clone(&backend.documents),
            Arc::clone(&backend.results),
        ));
        let tutor = Arc::new(TutorService::new(Arc::clone(&backend.tutor)));
        let podcast = Arc::new(PodcastService::new(Arc::clone(&backend.podcasts)));
        let calendar = Arc::new(CalendarService::new(clock, Arc::clone(&backend.calendar)));
        let usage = Arc::new(UsageService::new(Arc::clone(&backend.usage)));

        Self {
            user_id,
            backend,
            progress_url: None,
            silence: AppConfig::DEFAULT_SILENCE,
            highlight_window: HighlightWindow::default(),
            library,
            tutor,
            podcast,
            calendar,
            usage,
        }
    }

    #[must_use]
    pub fn with_silence(mut self, silence: Duration) -> Self {
        self.silence = silence;
        self
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    #[must_use]
    pub fn highlight_window(&self) -> HighlightWindow {
        self.highlight_window
    }

    #[must_use]
    pub fn library(&self) -> Arc<LibraryService> {
        Arc::clone(&self.library)
    }

    #[must_use]
    pub fn tutor(&self) -> Arc<TutorService> {
        Arc::clone(&self.tutor)
    }

    #[must_use]
    pub fn podcast(&self) -> Arc<PodcastService> {
        Arc::clone(&self.podcast)
    }

    #[must_use]
    pub fn calendar(&self) -> Arc<CalendarService> {
        Arc::clone(&self.calendar)
    }

    #[must_use]
    pub fn usage(&self) -> Arc<UsageService> {
        Arc::clone(&self.usage)
    }

    /// A fresh quiz wizard publishing upload progress into `progress`.
    #[must_use]
    pub fn quiz_controller(&self, progress: ProgressFeed) -> QuizSessionController {
        QuizSessionController::new(self.user_id.clone(), &self.backend).with_progress(progress)
    }

    /// Open the upload progress socket. `None` for an in-memory backend.
    /// The socket closes when the subscription is dropped.
    #[must_use]
    pub fn subscribe_progress(&self, feed: ProgressFeed) -> Option<ProgressSubscription> {
        self.progress_url
            .clone()
            .map(|url| ProgressSubscription::connect(url, feed))
    }

    /// A voice assistant wired to the coach, using the given device adapters
    /// for listening and playback.
    #[must_use]
    pub fn voice_assistant(
        &self,
        recognizer: Arc<dyn Recognizer>,
        audio: Arc<dyn AudioOutput>,
        native: Arc<dyn NativeSynthesizer>,
    ) -> VoiceAssistant {
        let speech = Arc::new(SpeechIo::new(
            recognizer,
            Arc::clone(&self.backend.speech),
            audio,
            native,
        ));
        VoiceAssistant::new(speech, Arc::clone(&self.backend.coach), self.silence)
    }
}
