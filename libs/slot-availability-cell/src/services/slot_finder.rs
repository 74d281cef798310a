use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

use shared_models::BookedInterval;

use crate::models::{ClinicHours, SlotRequest, SuggestedSlot};

/// Picks a start time for an appointment of `request.duration_minutes`.
///
/// Candidates start at clinic opening (rounded up to the step) and advance by
/// `hours.step_minutes` while the appointment still ends by closing time.
/// Candidates overlapping a booking are dropped, as are past ones when the
/// date is today. With a preferred time the earliest candidate at or after it
/// wins; otherwise, or when none qualifies, the earliest candidate overall.
pub fn find_next_available_slot(
    request: &SlotRequest,
    hours: &ClinicHours,
    booked: &[BookedInterval],
) -> Option<SuggestedSlot> {
    let today = request.now.date();
    if request.date < today || request.duration_minutes == 0 || hours.step_minutes == 0 {
        return None;
    }

    let open = request.date.and_time(round_up(hours.open, hours.step_minutes)?);
    let close = request.date.and_time(hours.close);
    let duration = Duration::minutes(i64::from(request.duration_minutes));
    let step = Duration::minutes(i64::from(hours.step_minutes));

    let preferred = request.preferred_time.map(|t| {
        let preferred = request.date.and_time(t);
        if request.date == today && preferred < request.now {
            request.now
        } else {
            preferred
        }
    });

    let mut earliest: Option<NaiveDateTime> = None;
    let mut current = open;

    while current + duration <= close {
        let is_past = request.date == today && current < request.now;

        if !is_past && fits(current, current + duration, booked) {
            match preferred {
                Some(p) if current >= p => return Some(SuggestedSlot::new(current.time(), request.duration_minutes)),
                _ => {
                    earliest.get_or_insert(current);
                }
            }
        }

        current += step;
    }

    earliest.map(|start| SuggestedSlot::new(start.time(), request.duration_minutes))
}

fn fits(start: NaiveDateTime, end: NaiveDateTime, booked: &[BookedInterval]) -> bool {
    // Candidates never cross midnight, so comparing times of day is enough.
    if end.date() != start.date() {
        return false;
    }
    !booked.iter().any(|b| b.overlaps(start.time(), end.time()))
}

fn round_up(time: NaiveTime, step_minutes: u32) -> Option<NaiveTime> {
    let remainder = time.minute() % step_minutes;
    let base = time.with_second(0)?.with_nanosecond(0)?;
    if remainder == 0 {
        return Some(base);
    }
    let (rounded, wrapped) = base.overflowing_add_signed(Duration::minutes(i64::from(step_minutes - remainder)));
    if wrapped != 0 { None } else { Some(rounded) }
}
