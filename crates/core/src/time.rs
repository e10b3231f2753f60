use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Local midnight `days_back` days before `now`, expressed in UTC.
///
/// `offset` is the user's UTC offset; "midnight" is evaluated on their wall clock.
#[must_use]
pub fn local_midnight_days_ago(
    now: DateTime<Utc>,
    offset: FixedOffset,
    days_back: u32,
) -> DateTime<Utc> {
    let local_date = now.with_timezone(&offset).date_naive() - Duration::days(i64::from(days_back));
    let midnight = local_date.and_time(NaiveTime::MIN);
    offset
        .from_local_datetime(&midnight)
        .single()
        .map_or(now, |dt| dt.with_timezone(&Utc))
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midnight_is_evaluated_on_the_local_wall_clock() {
        // 2023-11-14T22:13:20Z is already 2023-11-15 03:43 in UTC+05:30.
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let start = local_midnight_days_ago(fixed_now(), ist, 0);
        assert_eq!(start.to_rfc3339(), "2023-11-14T18:30:00+00:00");

        let two_days = local_midnight_days_ago(fixed_now(), ist, 2);
        assert_eq!(two_days.to_rfc3339(), "2023-11-12T18:30:00+00:00");
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), fixed_now() + Duration::minutes(5));
    }
}
