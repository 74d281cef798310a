use tracing::debug;

use shared_models::{BookedInterval, BookedSlot};

use crate::models::{BlockedMinuteSet, GRANULARITY_MINUTES};

/// Marks every 5-minute step of each booked `[start, end)` range.
/// Slots missing a start or end are skipped.
pub fn compute_blocked_minutes(slots: &[BookedSlot]) -> BlockedMinuteSet {
    let intervals: Vec<BookedInterval> = slots.iter().filter_map(BookedSlot::interval).collect();

    let skipped = slots.len() - intervals.len();
    if skipped > 0 {
        debug!("Skipped {} booked slot(s) without a usable start/end", skipped);
    }

    BlockedMinuteSet::from_intervals(&intervals)
}

pub fn is_hour_fully_blocked(hour24: u32, blocked: &BlockedMinuteSet) -> bool {
    blocked.is_hour_fully_blocked(hour24)
}

pub fn is_minute_blocked(hour24: u32, minute: u32, blocked: &BlockedMinuteSet) -> bool {
    blocked.is_minute_blocked(hour24, minute)
}

impl BlockedMinuteSet {
    pub fn from_intervals<'a, I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = &'a BookedInterval>,
    {
        let mut blocked = BlockedMinuteSet::new();

        for interval in intervals {
            let end = interval.end_minute();
            // end is exclusive: 08:00-08:30 stops at 08:25
            for minute_of_day in (interval.start_minute()..end).step_by(GRANULARITY_MINUTES as usize) {
                blocked.insert(minute_of_day / 60, minute_of_day % 60);
            }
        }

        blocked
    }
}
