use std::env;
use std::time::Duration;

use studymate_core::model::UserId;
use url::Url;

use crate::error::ConfigError;

/// Where the study backend lives.
///
/// Built once at process start and passed down explicitly so tests can point
/// every client at their own endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    api_base_url: Url,
    ws_base_url: Url,
    timeout: Duration,
}

impl BackendConfig {
    pub const DEFAULT_API_URL: &'static str = "http://127.0.0.1:8000";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Build a config for the given API URL; the progress socket URL is
    /// derived by swapping `http`/`https` for `ws`/`wss`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidApiUrl` if the URL does not parse or is
    /// not http(s).
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        let api = parse_http_url(api_base_url)?;
        let ws = derive_ws_url(&api)?;
        Ok(Self {
            api_base_url: api,
            ws_base_url: ws,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Override the progress socket base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidWsUrl` if the URL is not ws(s).
    pub fn with_ws_base_url(mut self, ws_base_url: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(ws_base_url.trim())
            .map_err(|_| ConfigError::InvalidWsUrl(ws_base_url.to_string()))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::InvalidWsUrl(ws_base_url.to_string()));
        }
        self.ws_base_url = url;
        Ok(self)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `STUDYMATE_API_URL`, `STUDYMATE_WS_URL` and
    /// `STUDYMATE_HTTP_TIMEOUT_SECS`, falling back to a local backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api = non_empty_var("STUDYMATE_API_URL");
        let mut config = Self::new(api.as_deref().unwrap_or(Self::DEFAULT_API_URL))?;
        if let Some(ws) = non_empty_var("STUDYMATE_WS_URL") {
            config = config.with_ws_base_url(&ws)?;
        }
        if let Some(raw) = non_empty_var("STUDYMATE_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    #[must_use]
    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    #[must_use]
    pub fn ws_base_url(&self) -> &Url {
        &self.ws_base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL of an API route such as `"generate-quiz"`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Progress socket for one user's upload pipeline.
    #[must_use]
    pub fn progress_url(&self, user_id: &UserId) -> String {
        format!(
            "{}/ws/{}",
            self.ws_base_url.as_str().trim_end_matches('/'),
            user_id.as_str()
        )
    }
}

fn parse_http_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidApiUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidApiUrl(raw.to_string()));
    }
    Ok(url)
}

fn derive_ws_url(api: &Url) -> Result<Url, ConfigError> {
    let mut ws = api.clone();
    let scheme = if api.scheme() == "https" { "wss" } else { "ws" };
    ws.set_scheme(scheme)
        .map_err(|()| ConfigError::InvalidWsUrl(api.to_string()))?;
    Ok(ws)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
