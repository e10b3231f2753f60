use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use studymate_core::model::UserId;

use crate::error::BackendError;

/// Header carrying the caller's user id on every protected call.
pub const USER_ID_HEADER: &str = "user-id";

/// Source of short-lived bearer tokens from the identity provider.
///
/// Implementations are asked for a token right before each request; callers
/// must not cache the result.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError::Token` if no token can be issued.
    async fn token(&self) -> Result<String, BackendError>;
}

/// A fixed token, for command-line use and tests.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(..)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, BackendError> {
        if self.0.trim().is_empty() {
            return Err(BackendError::Token("token is empty".into()));
        }
        Ok(self.0.clone())
    }
}

/// The single place where credentials are attached to outgoing requests.
#[derive(Clone)]
pub struct AuthContext {
    user_id: UserId,
    tokens: Arc<dyn TokenProvider>,
}

impl AuthContext {
    #[must_use]
    pub fn new(user_id: UserId, tokens: Arc<dyn TokenProvider>) -> Self {
        Self { user_id, tokens }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Attach a fresh bearer token and the `user-id` header.
    ///
    /// Only headers are added, so this works for JSON and multipart bodies
    /// alike; the body type sets its own content type.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Token` if the provider cannot issue a token.
    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, BackendError> {
        let token = self.tokens.token().await?;
        Ok(request
            .bearer_auth(token)
            .header(USER_ID_HEADER, self.user_id.as_str()))
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

    fn context(token: &str) -> AuthContext {
        AuthContext::new(
            UserId::new("user_7").unwrap(),
            Arc::new(StaticToken::new(token)),
        )
    }

    #[tokio::test]
    async fn attaches_bearer_and_user_id() {
        let request = context("abc")
            .authorize(Client::new().get("http://localhost/files"))
            .await
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.headers()[AUTHORIZATION], "Bearer abc");
        assert_eq!(request.headers()[USER_ID_HEADER], "user_7");
    }

    #[tokio::test]
    async fn multipart_keeps_its_own_content_type() {
        let form = reqwest::multipart::Form::new().text("file", "x");
        let request = context("abc")
            .authorize(Client::new().post("http://localhost/upload").multipart(form))
            .await
            .unwrap()
            .build()
            .unwrap();

        let content_type = request.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
    }

    #[tokio::test]
    async fn empty_token_is_an_error() {
        let err = context("  ")
            .authorize(Client::new().get("http://localhost/files"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Token(_)));
    }
}
