use chrono::NaiveDate;

/// Last day since publish that gets its own `views_N` column.
pub(crate) const LAST_TRACKED_DAY: u8 = 30;

/// A day-since-publish slot, always within `1..=LAST_TRACKED_DAY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct DayBucket(u8);

impl DayBucket {
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Whole days between publish and `today`. Day 0 (publish day) and anything
/// past the last tracked day only ever refresh the current view count.
pub(crate) fn day_bucket(date_published: NaiveDate, today: NaiveDate) -> Option<DayBucket> {
    let days = (today - date_published).num_days();

    u8::try_from(days)
        .ok()
        .filter(|day| (1..=LAST_TRACKED_DAY).contains(day))
        .map(DayBucket)
}
