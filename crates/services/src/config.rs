use std::env;
use std::time::Duration;

use backend::BackendConfig;
use studymate_core::model::{HighlightWindow, UserId};

use crate::error::AppConfigError;

/// Everything the app needs at start-up, read once and passed down.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub user_id: UserId,
    pub token: String,
    /// Quiet period after the last transcript update before the assistant
    /// submits what it heard.
    pub silence: Duration,
    pub highlight_window: HighlightWindow,
}

impl AppConfig {
    pub const DEFAULT_SILENCE: Duration = Duration::from_millis(1500);

    #[must_use]
    pub fn new(backend: BackendConfig, user_id: UserId, token: impl Into<String>) -> Self {
        Self {
            backend,
            user_id,
            token: token.into(),
            silence: Self::DEFAULT_SILENCE,
            highlight_window: HighlightWindow::default(),
        }
    }

    /// Read the backend location, session credentials and tuning knobs from
    /// `STUDYMATE_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `AppConfigError` if credentials are missing or a value does
    /// not parse.
    pub fn from_env() -> Result<Self, AppConfigError> {
        let backend = BackendConfig::from_env()?;
        let user_id = non_empty_var("STUDYMATE_USER_ID").ok_or(AppConfigError::MissingUserId)?;
        let token = non_empty_var("STUDYMATE_TOKEN").ok_or(AppConfigError::MissingToken)?;

        let mut config = Self::new(backend, UserId::new(user_id)?, token);
        if let Some(ms) = parse_var::<u64>("STUDYMATE_SILENCE_MS")? {
            config.silence = Duration::from_millis(ms);
        }
        if let Some(days) = parse_var::<u32>("STUDYMATE_HIGHLIGHT_DAYS")? {
            config.highlight_window = HighlightWindow::new(days);
        }
        Ok(config)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, AppConfigError> {
    match non_empty_var(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppConfigError::InvalidNumber { name, value }),
    }
}
