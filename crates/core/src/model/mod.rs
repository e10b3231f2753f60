pub mod calendar;
mod document;
pub mod highlights;
mod ids;
mod question;
mod quiz;
pub mod result;
mod usage;
mod voice;

pub use document::{DocumentName, display_name};
pub use ids::{EventId, ParseIdError, QuestionId, ResultId, UserId, UserIdError};

pub use calendar::{CalendarEvent, CalendarEventDraft, CalendarEventError, NewCalendarEvent, Priority};
pub use highlights::{DailyHighlights, HighlightWindow, PracticeLink, TopicAverage, TrendPoint};
pub use question::{Question, QuestionError};
pub use quiz::{
    Answers, Difficulty, Mistake, QuestionCount, QuizConfig, QuizConfigError, QuizOutcome, SKIPPED,
    grade,
};
pub use result::{DocumentResults, NewQuizResult, QuizResult, group_by_file, percent};
pub use usage::UsageSummary;
pub use voice::{AssistantMode, ConversationHistory, ConversationTurn, Role};
