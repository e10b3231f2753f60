use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::EventId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CalendarEventError {
    #[error("event title cannot be empty")]
    EmptyTitle,

    #[error("event ends before it starts")]
    InvalidTimeRange,

    #[error("invalid priority value: {0}")]
    InvalidPriority(u8),
}

/// Priority of a study-plan entry; 1 (low) to 3 (high) on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    /// # Errors
    ///
    /// Returns `CalendarEventError::InvalidPriority` outside 1..=3.
    pub fn from_u8(value: u8) -> Result<Self, CalendarEventError> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            _ => Err(CalendarEventError::InvalidPriority(value)),
        }
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = CalendarEventError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value)
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.as_u8()
    }
}

pub const DEFAULT_CATEGORY: &str = "General";

/// A stored study-plan entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: EventId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
}

/// Validated payload for creating an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCalendarEvent {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub category: String,
    pub priority: Priority,
}

/// Unvalidated form input for a new event.
#[derive(Debug, Clone, Default)]
pub struct CalendarEventDraft {
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub priority: Priority,
}

impl CalendarEventDraft {
    /// Trim and check the draft.
    ///
    /// # Errors
    ///
    /// Returns `CalendarEventError` if the title is blank, a time is missing,
    /// or the event would end before it starts.
    pub fn validate(self) -> Result<NewCalendarEvent, CalendarEventError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(CalendarEventError::EmptyTitle);
        }
        let (Some(start_time), Some(end_time)) = (self.start_time, self.end_time) else {
            return Err(CalendarEventError::InvalidTimeRange);
        };
        if end_time < start_time {
            return Err(CalendarEventError::InvalidTimeRange);
        }

        Ok(NewCalendarEvent {
            title,
            description: normalize_optional(self.description),
            start_time,
            end_time,
            category: normalize_optional(self.category).unwrap_or_else(default_category),
            priority: self.priority,
        })
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
