use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use shared_config::AppConfig;
use shared_models::AppError;

/// Width of one bookable slot.
pub const GRANULARITY_MINUTES: u32 = 5;

/// Minute offsets offered by the minute selector: 0, 5, ..., 55.
pub const MINUTE_OFFSETS: [u32; 12] = [0, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55];

pub const INCOMPLETE_SELECTION_PROMPT: &str = "Please select dentist, location, and date first.";

pub const BOOKED_TIMES_UNAVAILABLE_MESSAGE: &str =
    "Could not load booked times for this dentist. Please try again.";

// ==============================================================================
// HALF OF DAY
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HalfOfDay {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

impl HalfOfDay {
    /// Hour labels offered by the hour selector for this half of day.
    pub fn hour_labels(&self) -> &'static [u32] {
        match self {
            HalfOfDay::Am => &[8, 9, 10, 11],
            HalfOfDay::Pm => &[12, 1, 2, 3, 4, 5],
        }
    }

    pub fn display_hours(&self) -> Vec<DisplayHour> {
        self.hour_labels()
            .iter()
            .map(|&label| DisplayHour {
                label,
                hour24: to_24_hour(label, *self),
            })
            .collect()
    }

    pub fn of(time: NaiveTime) -> Self {
        if time.hour() >= 12 { HalfOfDay::Pm } else { HalfOfDay::Am }
    }
}

impl fmt::Display for HalfOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalfOfDay::Am => write!(f, "AM"),
            HalfOfDay::Pm => write!(f, "PM"),
        }
    }
}

impl FromStr for HalfOfDay {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AM" => Ok(HalfOfDay::Am),
            "PM" => Ok(HalfOfDay::Pm),
            other => Err(AppError::ValidationError(format!("Unknown half of day: '{}'", other))),
        }
    }
}

/// A 12-hour label paired with the 24-hour value it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayHour {
    pub label: u32,
    pub hour24: u32,
}

pub fn to_24_hour(label: u32, half: HalfOfDay) -> u32 {
    match half {
        HalfOfDay::Pm if label < 12 => label + 12,
        HalfOfDay::Am if label == 12 => 0,
        _ => label,
    }
}

/// "hh:mm AM" rendering used by the booking confirmation.
pub fn format_12_hour(time: NaiveTime) -> String {
    let half = HalfOfDay::of(time);
    let hour = match time.hour() % 12 {
        0 => 12,
        h => h,
    };
    format!("{:02}:{:02} {}", hour, time.minute(), half)
}

pub fn minute_label(minute: u32) -> String {
    format!("{:02}", minute)
}

// ==============================================================================
// BLOCKED MINUTES
// ==============================================================================

/// Hour (24h) to the minute offsets covered by some booking in that hour.
/// Hours without an entry are fully free.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockedMinuteSet {
    hours: BTreeMap<u32, BTreeSet<u32>>,
}

impl BlockedMinuteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hour24: u32, minute: u32) {
        self.hours.entry(hour24).or_default().insert(minute);
    }

    pub fn blocked_minutes(&self, hour24: u32) -> Option<&BTreeSet<u32>> {
        self.hours.get(&hour24)
    }

    pub fn is_minute_blocked(&self, hour24: u32, minute: u32) -> bool {
        self.hours
            .get(&hour24)
            .map_or(false, |minutes| minutes.contains(&minute))
    }

    pub fn is_hour_fully_blocked(&self, hour24: u32) -> bool {
        match self.hours.get(&hour24) {
            Some(minutes) => MINUTE_OFFSETS.iter().all(|m| minutes.contains(m)),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hours.values().all(|minutes| minutes.is_empty())
    }
}

// ==============================================================================
// QUERY & RESULT
// ==============================================================================

/// Everything one availability recomputation needs, taken from the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub clinician_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub location: Option<String>,
    pub half_of_day: Option<HalfOfDay>,
    /// Currently selected 12-hour label, if any.
    pub hour_label: Option<u32>,
}

impl AvailabilityQuery {
    pub fn new(clinician_id: impl Into<String>, date: NaiveDate, location: impl Into<String>) -> Self {
        Self {
            clinician_id: Some(clinician_id.into()),
            date: Some(date),
            location: Some(location.into()),
            half_of_day: None,
            hour_label: None,
        }
    }

    pub fn with_half_of_day(mut self, half: HalfOfDay) -> Self {
        self.half_of_day = Some(half);
        self
    }

    pub fn with_hour_label(mut self, label: u32) -> Self {
        self.hour_label = Some(label);
        self
    }

    pub fn display_hours(&self) -> Vec<DisplayHour> {
        self.half_of_day
            .map(|half| half.display_hours())
            .unwrap_or_default()
    }

    /// Clinician, date and location, or `None` while any of them is unset.
    pub fn selection(&self) -> Option<(&str, NaiveDate, &str)> {
        let clinician = self.clinician_id.as_deref().filter(|c| !c.trim().is_empty())?;
        let location = self.location.as_deref().filter(|l| !l.trim().is_empty())?;
        Some((clinician, self.date?, location))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourOption {
    pub label: u32,
    pub hour24: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinuteOption {
    pub label: String,
    pub minute: u32,
    pub enabled: bool,
}

/// Option states for one completed recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityState {
    pub half_of_day: Option<HalfOfDay>,
    pub hour_options: Vec<HourOption>,
    pub minute_options: Vec<MinuteOption>,
    pub blocked: BlockedMinuteSet,
    /// Booked times could not be loaded and nothing was blocked.
    pub degraded: bool,
}

impl AvailabilityState {
    pub fn new(
        half_of_day: Option<HalfOfDay>,
        hour_label: Option<u32>,
        blocked: BlockedMinuteSet,
        degraded: bool,
    ) -> Self {
        let hour_options = half_of_day
            .map(|half| {
                half.display_hours()
                    .into_iter()
                    .map(|h| HourOption {
                        label: h.label,
                        hour24: h.hour24,
                        enabled: !blocked.is_hour_fully_blocked(h.hour24),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut state = Self {
            half_of_day,
            hour_options,
            minute_options: Vec::new(),
            blocked,
            degraded,
        };
        state.minute_options = state.minute_options_for(hour_label);

        state
    }

    /// Hour selectors stay neutral until a half of day is chosen.
    pub fn is_hour_label_enabled(&self, label: u32) -> bool {
        match self.half_of_day {
            Some(half) => !self.blocked.is_hour_fully_blocked(to_24_hour(label, half)),
            None => true,
        }
    }

    /// Minute flags for a newly chosen hour; reuses the blocked set without refetching.
    pub fn minute_options_for(&self, hour_label: Option<u32>) -> Vec<MinuteOption> {
        let hour24 = match (hour_label, self.half_of_day) {
            (Some(label), Some(half)) => Some(to_24_hour(label, half)),
            _ => None,
        };

        MINUTE_OFFSETS
            .iter()
            .map(|&minute| MinuteOption {
                label: minute_label(minute),
                minute,
                enabled: hour24.map_or(true, |h| !self.blocked.is_minute_blocked(h, minute)),
            })
            .collect()
    }

    pub fn select_hour(&mut self, hour_label: Option<u32>) {
        self.minute_options = self.minute_options_for(hour_label);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AvailabilityResult {
    /// Clinician, date or location missing; every time control disabled.
    Incomplete { prompt: String },
    /// Booked times could not be loaded under a fail-closed policy.
    Unavailable { message: String },
    Ready(AvailabilityState),
}

impl AvailabilityResult {
    pub fn controls_enabled(&self) -> bool {
        matches!(self, AvailabilityResult::Ready(_))
    }

    pub fn state(&self) -> Option<&AvailabilityState> {
        match self {
            AvailabilityResult::Ready(state) => Some(state),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchFailurePolicy {
    /// Treat a failed fetch as "nothing booked".
    #[default]
    FailOpen,
    FailClosed,
}

impl FetchFailurePolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        if config.fail_closed_on_fetch_error {
            FetchFailurePolicy::FailClosed
        } else {
            FetchFailurePolicy::FailOpen
        }
    }
}

// ==============================================================================
// TIME SELECTION
// ==============================================================================

/// Hour label, minute and half of day as picked in the time selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSelection {
    pub hour_label: u32,
    pub minute: u32,
    pub half: HalfOfDay,
}

impl TimeSelection {
    pub fn new(hour_label: u32, minute: u32, half: HalfOfDay) -> Result<Self, AppError> {
        if !(1..=12).contains(&hour_label) {
            return Err(AppError::ValidationError(format!(
                "Hour must be between 1 and 12, got {}", hour_label
            )));
        }
        if minute >= 60 || minute % GRANULARITY_MINUTES != 0 {
            return Err(AppError::ValidationError(format!(
                "Minute must be a multiple of {} below 60, got {}", GRANULARITY_MINUTES, minute
            )));
        }

        Ok(Self { hour_label, minute, half })
    }

    /// Parses the raw select values; all three must be present.
    pub fn parse(hour: &str, minute: &str, half: &str) -> Result<Self, AppError> {
        if hour.trim().is_empty() || minute.trim().is_empty() || half.trim().is_empty() {
            return Err(AppError::ValidationError("Hour, minute and AM/PM are required".to_string()));
        }

        let hour_label = hour.trim().parse::<u32>()
            .map_err(|_| AppError::ValidationError(format!("Invalid hour: '{}'", hour)))?;
        let minute = minute.trim().parse::<u32>()
            .map_err(|_| AppError::ValidationError(format!("Invalid minute: '{}'", minute)))?;

        Self::new(hour_label, minute, half.parse()?)
    }

    pub fn hour24(&self) -> u32 {
        to_24_hour(self.hour_label, self.half)
    }

    /// Value of the hidden 24-hour time field, "HH:MM".
    pub fn to_time_value(&self) -> String {
        format!("{:02}:{:02}", self.hour24(), self.minute)
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour24(), self.minute, 0)
    }

    pub fn is_available(&self, blocked: &BlockedMinuteSet) -> bool {
        !blocked.is_minute_blocked(self.hour24(), self.minute)
    }
}

// ==============================================================================
// SLOT SUGGESTION
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClinicHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub step_minutes: u32,
}

impl Default for ClinicHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            step_minutes: 15,
        }
    }
}

impl ClinicHours {
    pub fn from_config(config: &AppConfig) -> Self {
        let defaults = Self::default();
        let open = NaiveTime::from_hms_opt(config.clinic_open_hour, 0, 0);
        // 24 means end of day; the last representable minute stands in for it.
        let close = match config.clinic_close_hour {
            24 => NaiveTime::from_hms_opt(23, 59, 0),
            h => NaiveTime::from_hms_opt(h, 0, 0),
        };

        match (open, close) {
            (Some(open), Some(close)) if open < close => Self { open, close, ..defaults },
            _ => defaults,
        }
    }
}

/// Inputs for picking the start of a new appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRequest {
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub preferred_time: Option<NaiveTime>,
    pub now: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuggestedSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SuggestedSlot {
    pub fn new(start: NaiveTime, duration_minutes: u32) -> Self {
        Self {
            start,
            end: start + Duration::minutes(i64::from(duration_minutes)),
        }
    }

    pub fn display(&self) -> String {
        format!("{} - {}", format_12_hour(self.start), format_12_hour(self.end))
    }
}
