use std::sync::Arc;

use backend::{BackendError, CalendarRepository};
use studymate_core::model::{CalendarEvent, CalendarEventDraft};
use tracing::info;

use crate::Clock;
use crate::error::CalendarServiceError;

/// The user's study plan.
#[derive(Clone)]
pub struct CalendarService {
    clock: Clock,
    calendar: Arc<dyn CalendarRepository>,
}

impl CalendarService {
    #[must_use]
    pub fn new(clock: Clock, calendar: Arc<dyn CalendarRepository>) -> Self {
        Self { clock, calendar }
    }

    /// All events ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend call fails.
    pub async fn list_events(&self) -> Result<Vec<CalendarEvent>, BackendError> {
        let mut events = self.calendar.list_events().await?;
        events.sort_by_key(|event| event.start_time);
        Ok(events)
    }

    /// Events that have not finished yet, soonest first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend call fails.
    pub async fn upcoming(&self) -> Result<Vec<CalendarEvent>, BackendError> {
        let now = self.clock.now();
        let mut events = self.list_events().await?;
        events.retain(|event| event.end_time >= now);
        Ok(events)
    }

    /// # Errors
    ///
    /// Returns `CalendarServiceError::Event` for an invalid draft (nothing is
    /// sent), `CalendarServiceError::Backend` if the call fails.
    pub async fn add_event(&self, draft: CalendarEventDraft) -> Result<(), CalendarServiceError> {
        let event = draft.validate()?;
        self.calendar.add_event(&event).await?;
        info!(title = %event.title, start = %event.start_time, "calendar event added");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{InMemoryBackend, Operation};
    use chrono::Duration;
    use studymate_core::model::{CalendarEventError, Priority};
    use studymate_core::time::{fixed_clock, fixed_now};

    fn draft(title: &str, start_offset_hours: i64) -> CalendarEventDraft {
        let start = fixed_now() + Duration::hours(start_offset_hours);
        CalendarEventDraft {
            title: title.into(),
            start_time: Some(start),
            end_time: Some(start + Duration::minutes(45)),
            priority: Priority::Medium,
            ..CalendarEventDraft::default()
        }
    }

    #[tokio::test]
    async fn invalid_drafts_never_reach_the_backend() {
        let backend = InMemoryBackend::new();
        let service = CalendarService::new(fixed_clock(), Arc::new(backend.clone()));

        let err = service.add_event(draft("  ", 1)).await.unwrap_err();

        assert!(matches!(
            err,
            CalendarServiceError::Event(CalendarEventError::EmptyTitle)
        ));
        assert_eq!(backend.calls(Operation::AddEvent), 0);
    }

    #[tokio::test]
    async fn upcoming_skips_finished_events_and_sorts() {
        let backend = InMemoryBackend::new();
        let service = CalendarService::new(fixed_clock(), Arc::new(backend.clone()));
        service.add_event(draft("Later", 5)).await.unwrap();
        service.add_event(draft("Yesterday", -24)).await.unwrap();
        service.add_event(draft("Soon", 1)).await.unwrap();

        let titles: Vec<_> = service
            .upcoming()
            .await
            .unwrap()
            .into_iter()
            .map(|event| event.title)
            .collect();

        assert_eq!(titles, ["Soon", "Later"]);
        assert_eq!(service.list_events().await.unwrap().len(), 3);
    }
}
