#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod progress;
pub mod repository;

pub use auth::{AuthContext, StaticToken, TokenProvider, USER_ID_HEADER};
pub use config::BackendConfig;
pub use error::{BackendError, ConfigError};
pub use http::HttpBackend;
pub use memory::{Failure, InMemoryBackend, Operation};
pub use progress::{ProgressFeed, ProgressSubscription, UploadProgress};
pub use repository::{
    Backend, CalendarRepository, ChatImage, CoachClient, CoachRequest, DocumentRepository,
    PodcastOutcome, PodcastRepository, QuizGenerator, QuizRequest, ResultRepository,
    SpeechSynthesisApi, TutorMessage, TutorRepository, UploadFile, UsageRepository,
};
