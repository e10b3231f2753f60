#![forbid(unsafe_code)]

pub mod app_services;
pub mod calendar_service;
pub mod config;
pub mod error;
pub mod library_service;
pub mod podcast_service;
pub mod quiz;
pub mod speech;
pub mod testing;
pub mod timer;
pub mod tutor_service;
pub mod usage_service;
pub mod voice;

pub use studymate_core::Clock;

pub use app_services::AppServices;
pub use calendar_service::CalendarService;
pub use config::AppConfig;
pub use error::{
    AppConfigError, AppServicesError, CalendarServiceError, QuizSessionError, SpeechError,
    TutorError, VoiceError,
};
pub use library_service::LibraryService;
pub use podcast_service::{PodcastService, briefing_message};
pub use quiz::{Notice, PendingPractice, PendingSave, QuizSessionController, WizardStep};
pub use speech::{PlaybackSource, SpeechIo};
pub use tutor_service::{TutorService, clean_message};
pub use usage_service::UsageService;
pub use voice::VoiceAssistant;
