use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// Fires once per calendar day at a fixed wall-clock time in `tz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Daily {
    at: NaiveTime,
    tz: Tz,
}

impl Daily {
    pub fn at(at: NaiveTime, tz: Tz) -> Self {
        Self { at, tz }
    }

    pub fn midnight(tz: Tz) -> Self {
        Self::at(NaiveTime::MIN, tz)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// The calendar date `now` falls on in this schedule's timezone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    /// The first occurrence strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = self.today(now);

        loop {
            let candidate = self.resolve(date.and_time(self.at));
            if candidate > now {
                return candidate;
            }

            date = date.succ_opt().unwrap_or(NaiveDate::MAX);
        }
    }

    fn resolve(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            // Wall-clock time skipped by a DST jump, fire right after the gap
            LocalResult::None => self.resolve(naive + TimeDelta::hours(1)),
        }
    }
}
