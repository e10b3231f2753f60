use std::sync::{Arc, LazyLock};

use backend::{ChatImage, TutorMessage, TutorRepository};
use regex::Regex;
use studymate_core::model::{ConversationTurn, DocumentName};

use crate::error::TutorError;

/// Image descriptions the backend splices into stored user messages.
static IMAGE_CONTEXT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[CONTEXT FROM UPLOADED IMAGE:[\s\S]*?\]").ok());

/// Remove backend-injected image context so stored messages read as typed.
#[must_use]
pub fn clean_message(content: &str) -> String {
    match IMAGE_CONTEXT.as_ref() {
        Some(pattern) => pattern.replace_all(content, "").trim().to_string(),
        None => content.trim().to_string(),
    }
}

/// Questions about one document, answered by the backend tutor.
#[derive(Clone)]
pub struct TutorService {
    tutor: Arc<dyn TutorRepository>,
}

impl TutorService {
    #[must_use]
    pub fn new(tutor: Arc<dyn TutorRepository>) -> Self {
        Self { tutor }
    }

    /// Ask about `filename`, optionally with a picture.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::EmptyMessage` for a blank question with no image,
    /// `TutorError::Backend` if the call fails.
    pub async fn ask(
        &self,
        filename: &DocumentName,
        message: &str,
        image: Option<ChatImage>,
    ) -> Result<String, TutorError> {
        let message = message.trim();
        if message.is_empty() && image.is_none() {
            return Err(TutorError::EmptyMessage);
        }
        let request = TutorMessage {
            filename: filename.clone(),
            message: message.to_string(),
            image,
        };
        Ok(self.tutor.chat(&request).await?)
    }

    /// Earlier turns for `filename`, cleaned for display.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::Backend` if the call fails.
    pub async fn history(
        &self,
        filename: &DocumentName,
    ) -> Result<Vec<ConversationTurn>, TutorError> {
        let turns = self.tutor.chat_history(filename).await?;
        Ok(turns
            .into_iter()
            .map(|turn| ConversationTurn {
                content: clean_message(&turn.content),
                ..turn
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::InMemoryBackend;

    #[test]
    fn strips_image_context_blocks() {
        let stored = "What is shown here?\n[CONTEXT FROM UPLOADED IMAGE: a diagram\nof a cell]";
        assert_eq!(clean_message(stored), "What is shown here?");
        assert_eq!(clean_message("plain"), "plain");
    }

    #[tokio::test]
    async fn blank_questions_are_rejected_locally() {
        let backend = InMemoryBackend::new();
        let tutor = TutorService::new(Arc::new(backend.clone()));
        let err = tutor
            .ask(&DocumentName::new("a.pdf"), "   ", None)
            .await
            .unwrap_err();

        assert!(matches!(err, TutorError::EmptyMessage));
        assert_eq!(backend.calls(backend::Operation::Chat), 0);
    }

    #[tokio::test]
    async fn history_follows_the_conversation() {
        let backend = InMemoryBackend::new();
        backend.push_tutor_reply("Mitosis has four phases.");
        let tutor = TutorService::new(Arc::new(backend));
        let doc = DocumentName::new("a.pdf");

        let reply = tutor.ask(&doc, "phases of mitosis?", None).await.unwrap();
        let history = tutor.history(&doc).await.unwrap();

        assert_eq!(reply, "Mitosis has four phases.");
        assert_eq!(
            history,
            vec![
                ConversationTurn::user("phases of mitosis?"),
                ConversationTurn::assistant("Mitosis has four phases."),
            ]
        );
    }
}
