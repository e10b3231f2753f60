use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use studymate_core::model::{
    CalendarEvent, ConversationTurn, DocumentName, NewCalendarEvent, NewQuizResult, Question,
    QuizResult, UsageSummary, UserId,
};
use tracing::{debug, warn};
use url::Url;

use crate::auth::AuthContext;
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::repository::{
    CalendarRepository, ChatImage, CoachClient, CoachRequest, DocumentRepository, PodcastOutcome,
    PodcastRepository, QuizGenerator, QuizRequest, ResultRepository, SpeechSynthesisApi,
    TutorMessage, TutorRepository, UploadFile, UsageRepository,
};

/// Client for the study backend's REST API.
///
/// Every request goes through [`AuthContext::authorize`]; non-2xx responses
/// are turned into `BackendError` by [`check_status`].
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
    auth: AuthContext,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: BackendConfig, auth: AuthContext) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            config,
            auth,
        })
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        self.auth.user_id()
    }

    async fn get(&self, path: &str) -> Result<Response, BackendError> {
        let request = self.client.get(self.config.endpoint(path));
        self.send(path, request).await
    }

    async fn post_json<T: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, BackendError> {
        let request = self.client.post(self.config.endpoint(path)).json(body);
        self.send(path, request).await
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response, BackendError> {
        let request = self.auth.authorize(request).await?;
        debug!(path, "backend request");
        let response = request.send().await?;
        check_status(path, response).await
    }
}

/// Map HTTP 429 to `RateLimited` and any other non-2xx to `Status`, carrying
/// the server's `detail` when the body has one.
async fn check_status(path: &str, response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail);
    warn!(path, %status, detail = detail.as_deref().unwrap_or(""), "backend request failed");
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(BackendError::RateLimited { detail });
    }
    Err(BackendError::Status { status, detail })
}

fn data_url(image: &ChatImage) -> String {
    format!(
        "data:{};base64,{}",
        image.mime_type,
        STANDARD.encode(&image.bytes)
    )
}

#[async_trait]
impl DocumentRepository for HttpBackend {
    async fn list_documents(&self) -> Result<Vec<DocumentName>, BackendError> {
        let body: FilesResponse = self.get("files").await?.json().await?;
        Ok(body.files)
    }

    async fn upload_document(&self, file: UploadFile) -> Result<DocumentName, BackendError> {
        let part = Part::bytes(file.bytes).file_name(file.file_name);
        let form = Form::new().part("file", part);
        let request = self.client.post(self.config.endpoint("upload")).multipart(form);
        let body: UploadResponse = self.send("upload", request).await?.json().await?;
        if let Some(message) = body.message.as_deref() {
            debug!(message, filename = %body.filename, "upload accepted");
        }
        Ok(body.filename)
    }

    async fn delete_document(&self, filename: &DocumentName) -> Result<(), BackendError> {
        self.post_json("delete-book", &FilenameBody { filename })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl QuizGenerator for HttpBackend {
    async fn generate_quiz(&self, request: &QuizRequest) -> Result<Vec<Question>, BackendError> {
        let body = GenerateQuizBody {
            topic: &request.topic,
            filename: &request.filename,
            num_questions: request.config.map(|c| c.question_count.get()),
            difficulty: request.config.map(|c| c.difficulty.as_str()),
        };
        let response: QuizResponse = self.post_json("generate-quiz", &body).await?.json().await?;
        Ok(response.questions)
    }
}

#[async_trait]
impl ResultRepository for HttpBackend {
    async fn save_result(&self, result: &NewQuizResult) -> Result<(), BackendError> {
        self.post_json("save-result", result).await?;
        Ok(())
    }

    async fn list_results(&self) -> Result<Vec<QuizResult>, BackendError> {
        let body: ResultsResponse = self.get("results").await?.json().await?;
        Ok(body.results)
    }
}

#[async_trait]
impl TutorRepository for HttpBackend {
    async fn chat(&self, message: &TutorMessage) -> Result<String, BackendError> {
        let body = ChatBody {
            message: &message.message,
            filename: &message.filename,
            image: message.image.as_ref().map(data_url),
        };
        let response: ChatResponse = self.post_json("chat", &body).await?.json().await?;
        Ok(response.response)
    }

    async fn chat_history(
        &self,
        filename: &DocumentName,
    ) -> Result<Vec<ConversationTurn>, BackendError> {
        let request = self
            .client
            .get(self.config.endpoint("chat_history"))
            .query(&[("filename", filename.as_str())]);
        let body: HistoryResponse = self.send("chat_history", request).await?.json().await?;
        Ok(body.history)
    }
}

#[async_trait]
impl CoachClient for HttpBackend {
    async fn coach(&self, request: &CoachRequest) -> Result<String, BackendError> {
        let body: CoachResponse = self
            .post_json("api/voice/coach", request)
            .await?
            .json()
            .await?;
        Ok(body.reply_text)
    }
}

#[async_trait]
impl SpeechSynthesisApi for HttpBackend {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, BackendError> {
        let bytes = self
            .post_json("api/voice/tts", &TtsBody { text })
            .await?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PodcastRepository for HttpBackend {
    async fn daily_podcast(&self) -> Result<PodcastOutcome, BackendError> {
        let body = PodcastBody {
            user_id: self.auth.user_id(),
        };
        let response: PodcastResponse = self.post_json("daily-podcast", &body).await?.json().await?;
        response.into_outcome()
    }
}

#[async_trait]
impl CalendarRepository for HttpBackend {
    async fn list_events(&self) -> Result<Vec<CalendarEvent>, BackendError> {
        let body: EventsResponse = self.get("get-calendar-events").await?.json().await?;
        Ok(body.events)
    }

    async fn add_event(&self, event: &NewCalendarEvent) -> Result<(), BackendError> {
        self.post_json("add-calendar-event", event).await?;
        Ok(())
    }
}

#[async_trait]
impl UsageRepository for HttpBackend {
    async fn usage(&self) -> Result<UsageSummary, BackendError> {
        Ok(self.get("usage").await?.json().await?)
    }
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    #[serde(default)]
    files: Vec<DocumentName>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    message: Option<String>,
    filename: DocumentName,
}

#[derive(Debug, Serialize)]
struct FilenameBody<'a> {
    filename: &'a DocumentName,
}

#[derive(Debug, Serialize)]
struct GenerateQuizBody<'a> {
    topic: &'a str,
    filename: &'a DocumentName,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_questions: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    difficulty: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct QuizResponse {
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct ResultsResponse {
    #[serde(default)]
    results: Vec<QuizResult>,
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    message: &'a str,
    filename: &'a DocumentName,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<ConversationTurn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoachResponse {
    reply_text: String,
}

#[derive(Debug, Serialize)]
struct TtsBody<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct PodcastBody<'a> {
    user_id: &'a UserId,
}

#[derive(Debug, Deserialize)]
struct PodcastResponse {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl PodcastResponse {
    fn into_outcome(self) -> Result<PodcastOutcome, BackendError> {
        if let Some(raw) = self.url {
            let url = Url::parse(&raw)
                .map_err(|err| BackendError::Decode(format!("podcast url {raw:?}: {err}")))?;
            return Ok(PodcastOutcome::Ready(url));
        }
        match self.status.as_deref() {
            Some("no_data") => Ok(PodcastOutcome::NoData),
            other => Err(BackendError::Decode(format!(
                "podcast response without url (status {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    events: Vec<CalendarEvent>,
}
