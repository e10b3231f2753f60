use chrono::{DateTime, FixedOffset, Utc};

use crate::model::document::DocumentName;
use crate::model::result::QuizResult;
use crate::time::local_midnight_days_ago;

/// Time range considered for the daily recap.
///
/// Covers results from local midnight `lookback_days` days ago up to now;
/// `lookback_days = 0` means "today only".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightWindow {
    pub lookback_days: u32,
}

impl HighlightWindow {
    pub const DEFAULT_LOOKBACK_DAYS: u32 = 2;

    #[must_use]
    pub fn new(lookback_days: u32) -> Self {
        Self { lookback_days }
    }

    #[must_use]
    pub fn start(&self, now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
        local_midnight_days_ago(now, offset, self.lookback_days)
    }

    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>, offset: FixedOffset) -> bool {
        at >= self.start(now, offset) && at <= now
    }
}

impl Default for HighlightWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LOOKBACK_DAYS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicAverage {
    pub topic: String,
    /// Document the most recent attempt on this topic used.
    pub filename: DocumentName,
    pub average_percent: u32,
    pub attempts: u32,
}

impl TopicAverage {
    /// Deep-link request for practising this topic again.
    #[must_use]
    pub fn practice_link(&self) -> PracticeLink {
        PracticeLink {
            filename: self.filename.clone(),
            topic: self.topic.clone(),
        }
    }
}

/// A `(document, topic)` pair that starts a quiz without manual setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeLink {
    pub filename: DocumentName,
    pub topic: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendPoint {
    /// 1-based attempt number in chronological order.
    pub attempt: u32,
    pub percent: u32,
}

/// Recap of recent quiz activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyHighlights {
    pub attempts: u32,
    pub average_percent: u32,
    pub best_percent: u32,
    pub worst_percent: u32,
    pub last: QuizResult,
    pub strongest: TopicAverage,
    pub weakest: TopicAverage,
    pub most_practiced: TopicAverage,
    pub trend: Vec<TrendPoint>,
}

impl DailyHighlights {
    /// Summarise results inside `window`. Returns `None` when nothing falls
    /// inside it.
    #[must_use]
    pub fn compute(
        results: &[QuizResult],
        now: DateTime<Utc>,
        offset: FixedOffset,
        window: HighlightWindow,
    ) -> Option<Self> {
        let mut recent: Vec<&QuizResult> = results
            .iter()
            .filter(|r| window.contains(r.created_at, now, offset))
            .collect();
        if recent.is_empty() {
            return None;
        }
        recent.sort_by_key(|r| r.created_at);

        let percents: Vec<u32> = recent.iter().map(|r| r.percent()).collect();
        let attempts = u32::try_from(percents.len()).unwrap_or(u32::MAX);
        let average_percent = rounded_mean(&percents);
        let best_percent = percents.iter().copied().max().unwrap_or(0);
        let worst_percent = percents.iter().copied().min().unwrap_or(0);

        let topics = topic_averages(&recent);
        // Ties go to the topic seen first, matching a stable sort.
        let strongest = pick(&topics, |a, b| b.average_percent > a.average_percent)?;
        let weakest = pick(&topics, |a, b| b.average_percent < a.average_percent)?;
        let most_practiced = pick(&topics, |a, b| b.attempts > a.attempts)?;

        let trend = percents
            .iter()
            .zip(1_u32..)
            .map(|(percent, attempt)| TrendPoint {
                attempt,
                percent: *percent,
            })
            .collect();

        let last = (*recent.last()?).clone();

        Some(Self {
            attempts,
            average_percent,
            best_percent,
            worst_percent,
            last,
            strongest,
            weakest,
            most_practiced,
            trend,
        })
    }
}

fn topic_averages(sorted: &[&QuizResult]) -> Vec<TopicAverage> {
    let mut buckets: Vec<(String, DocumentName, Vec<u32>)> = Vec::new();
    for result in sorted {
        match buckets.iter_mut().find(|(topic, _, _)| *topic == result.topic) {
            Some((_, filename, percents)) => {
                *filename = result.filename.clone();
                percents.push(result.percent());
            }
            None => buckets.push((
                result.topic.clone(),
                result.filename.clone(),
                vec![result.percent()],
            )),
        }
    }

    buckets
        .into_iter()
        .map(|(topic, filename, percents)| TopicAverage {
            topic,
            filename,
            average_percent: rounded_mean(&percents),
            attempts: u32::try_from(percents.len()).unwrap_or(u32::MAX),
        })
        .collect()
}

fn pick(
    topics: &[TopicAverage],
    better: impl Fn(&TopicAverage, &TopicAverage) -> bool,
) -> Option<TopicAverage> {
    let mut iter = topics.iter();
    let mut best = iter.next()?;
    for candidate in iter {
        if better(best, candidate) {
            best = candidate;
        }
    }
    Some(best.clone())
}

fn rounded_mean(values: &[u32]) -> u32 {
    if values.is_empty() {
        return 0;
    }
    let sum: u64 = values.iter().map(|v| u64::from(*v)).sum();
    let len = values.len() as u64;
    u32::try_from((sum * 2 + len) / (len * 2)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn attempt(topic: &str, score: u32, hours_ago: i64) -> QuizResult {
        QuizResult {
            id: None,
            filename: DocumentName::new(format!("u_{topic}.pdf")),
            topic: topic.into(),
            score,
            total_questions: 10,
            difficulty: None,
            mistakes: Vec::new(),
            created_at: fixed_now() - Duration::hours(hours_ago),
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn nothing_in_window() {
        let results = vec![attempt("Cells", 5, 24 * 10)];
        assert!(DailyHighlights::compute(&results, fixed_now(), utc(), HighlightWindow::new(0)).is_none());
    }

    #[test]
    fn summarises_recent_attempts() {
        // fixed_now is 22:13 UTC, so "today" starts 22h13m earlier.
        let results = vec![
            attempt("Cells", 9, 1),
            attempt("Genetics", 4, 3),
            attempt("Cells", 7, 5),
            attempt("Ecology", 10, 24 * 4),
        ];

        let recap =
            DailyHighlights::compute(&results, fixed_now(), utc(), HighlightWindow::new(0)).unwrap();

        assert_eq!(recap.attempts, 3);
        assert_eq!(recap.average_percent, 67);
        assert_eq!(recap.best_percent, 90);
        assert_eq!(recap.worst_percent, 40);
        assert_eq!(recap.last.score, 9);
        assert_eq!(recap.strongest.topic, "Cells");
        assert_eq!(recap.strongest.average_percent, 80);
        assert_eq!(recap.weakest.topic, "Genetics");
        assert_eq!(recap.most_practiced.topic, "Cells");
        assert_eq!(
            recap.trend.iter().map(|p| p.percent).collect::<Vec<_>>(),
            vec![70, 40, 90]
        );
    }

    #[test]
    fn weakest_topic_links_to_practice() {
        let results = vec![attempt("Genetics", 2, 1)];
        let recap =
            DailyHighlights::compute(&results, fixed_now(), utc(), HighlightWindow::default()).unwrap();
        let link = recap.weakest.practice_link();
        assert_eq!(link.topic, "Genetics");
        assert_eq!(link.filename.as_str(), "u_Genetics.pdf");
    }

    #[test]
    fn lookback_extends_window() {
        let results = vec![attempt("Cells", 5, 30)];
        assert!(DailyHighlights::compute(&results, fixed_now(), utc(), HighlightWindow::new(0)).is_none());
        assert!(DailyHighlights::compute(&results, fixed_now(), utc(), HighlightWindow::new(2)).is_some());
    }
}
