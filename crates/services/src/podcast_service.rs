use std::sync::Arc;

use backend::{BackendError, PodcastOutcome, PodcastRepository};
use tracing::info;

/// Audio recap of yesterday's mistakes.
#[derive(Clone)]
pub struct PodcastService {
    podcasts: Arc<dyn PodcastRepository>,
}

impl PodcastService {
    #[must_use]
    pub fn new(podcasts: Arc<dyn PodcastRepository>) -> Self {
        Self { podcasts }
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the recap could not be generated.
    pub async fn daily_briefing(&self) -> Result<PodcastOutcome, BackendError> {
        let outcome = self.podcasts.daily_podcast().await?;
        if let PodcastOutcome::Ready(url) = &outcome {
            info!(%url, "daily podcast ready");
        }
        Ok(outcome)
    }
}

/// Status line shown next to the player.
#[must_use]
pub fn briefing_message(outcome: &Result<PodcastOutcome, BackendError>) -> String {
    match outcome {
        Ok(PodcastOutcome::Ready(url)) => format!("Your daily briefing is ready: {url}"),
        Ok(PodcastOutcome::NoData) => "No mistakes recorded yesterday! Great job.".to_string(),
        Err(_) => "Could not generate briefing. Try again later.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{Failure, InMemoryBackend, Operation};

    #[tokio::test]
    async fn reports_each_outcome() {
        let backend = InMemoryBackend::new();
        let service = PodcastService::new(Arc::new(backend.clone()));

        let empty = service.daily_briefing().await;
        assert_eq!(
            briefing_message(&empty),
            "No mistakes recorded yesterday! Great job."
        );

        let url = "https://cdn.example.com/recap.mp3".parse().unwrap();
        backend.set_podcast(PodcastOutcome::Ready(url));
        let ready = service.daily_briefing().await;
        assert!(briefing_message(&ready).ends_with("recap.mp3"));

        backend.fail(Operation::DailyPodcast, Failure::Unavailable);
        let failed = service.daily_briefing().await;
        assert!(briefing_message(&failed).starts_with("Could not generate"));
    }
}
