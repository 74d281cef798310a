use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One entry of the booked-times payload. Either side may be missing when
/// the appointment has no end time recorded yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSlot {
    #[serde(default, deserialize_with = "lenient_time_field")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient_time_field")]
    pub end: Option<String>,
}

impl BookedSlot {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: Some(start.to_string()),
            end: Some(end.to_string()),
        }
    }

    /// Typed interval, or `None` when either bound is missing or unparseable.
    pub fn interval(&self) -> Option<BookedInterval> {
        let start = parse_time_of_day(self.start.as_deref()?)?;
        let end = parse_time_of_day(self.end.as_deref()?)?;
        Some(BookedInterval { start, end })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookedTimesResponse {
    /// `null` reads as no bookings; entries that are not objects are dropped
    /// one by one instead of failing the whole payload.
    #[serde(default, deserialize_with = "lenient_booked_list")]
    pub booked: Vec<BookedSlot>,
}

fn lenient_time_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| v.as_str().map(str::to_string)))
}

fn lenient_booked_list<'de, D>(deserializer: D) -> Result<Vec<BookedSlot>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<BookedSlot>(entry).ok())
        .collect())
}

/// Half-open `[start, end)` range occupied by an existing appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookedInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl BookedInterval {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn start_minute(&self) -> u32 {
        minute_of_day(self.start)
    }

    pub fn end_minute(&self) -> u32 {
        minute_of_day(self.end)
    }

    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        !(end <= self.start || start >= self.end)
    }
}

pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Accepts "HH:MM" as sent by the booked-times endpoint, and "HH:MM:SS".
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}
