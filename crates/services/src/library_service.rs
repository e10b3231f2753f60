use std::sync::Arc;

use backend::{BackendError, DocumentRepository, ResultRepository, UploadFile};
use chrono::FixedOffset;
use studymate_core::model::{
    DailyHighlights, DocumentName, DocumentResults, HighlightWindow, group_by_file,
};
use tracing::info;

use crate::Clock;

/// The user's documents and their quiz history.
#[derive(Clone)]
pub struct LibraryService {
    clock: Clock,
    documents: Arc<dyn DocumentRepository>,
    results: Arc<dyn ResultRepository>,
}

impl LibraryService {
    #[must_use]
    pub fn new(
        clock: Clock,
        documents: Arc<dyn DocumentRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            clock,
            documents,
            results,
        }
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the backend call fails.
    pub async fn list_documents(&self) -> Result<Vec<DocumentName>, BackendError> {
        self.documents.list_documents().await
    }

    /// Upload a file; returns the name it is stored under.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend call fails.
    pub async fn upload_document(&self, file: UploadFile) -> Result<DocumentName, BackendError> {
        let stored = self.documents.upload_document(file).await?;
        info!(filename = %stored, "document uploaded");
        Ok(stored)
    }

    /// Delete a document and the results recorded against it.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend call fails.
    pub async fn delete_document(&self, filename: &DocumentName) -> Result<(), BackendError> {
        self.documents.delete_document(filename).await?;
        info!(%filename, "document deleted");
        Ok(())
    }

    /// Past attempts grouped by document, newest first within each group.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend call fails.
    pub async fn results_by_file(&self) -> Result<Vec<DocumentResults>, BackendError> {
        let results = self.results.list_results().await?;
        Ok(group_by_file(results))
    }

    /// Recap of attempts inside `window`, evaluated on the user's wall clock.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend call fails.
    pub async fn highlights(
        &self,
        window: HighlightWindow,
        offset: FixedOffset,
    ) -> Result<Option<DailyHighlights>, BackendError> {
        let results = self.results.list_results().await?;
        Ok(DailyHighlights::compute(
            &results,
            self.clock.now(),
            offset,
            window,
        ))
    }
}
