use std::sync::Arc;

use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_models::{AppError, BookedInterval, BookedSlot};

use crate::models::{
    AvailabilityQuery, AvailabilityResult, AvailabilityState, ClinicHours, FetchFailurePolicy,
    SlotRequest, SuggestedSlot, TimeSelection, BOOKED_TIMES_UNAVAILABLE_MESSAGE,
    INCOMPLETE_SELECTION_PROMPT,
};
use crate::services::blocked_minutes::compute_blocked_minutes;
use crate::services::booked_times::{BookedTimesClient, BookedTimesSource};
use crate::services::slot_finder::find_next_available_slot;

/// Recomputes time-selector availability for the appointment and
/// reschedule forms. Holds no per-form state; every call gets its query.
pub struct AvailabilityService {
    source: Arc<dyn BookedTimesSource>,
    policy: FetchFailurePolicy,
    clinic_hours: ClinicHours,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            source: Arc::new(BookedTimesClient::new(config)),
            policy: FetchFailurePolicy::from_config(config),
            clinic_hours: ClinicHours::from_config(config),
        }
    }

    pub fn with_source(source: Arc<dyn BookedTimesSource>, policy: FetchFailurePolicy) -> Self {
        Self {
            source,
            policy,
            clinic_hours: ClinicHours::default(),
        }
    }

    pub fn with_clinic_hours(mut self, clinic_hours: ClinicHours) -> Self {
        self.clinic_hours = clinic_hours;
        self
    }

    pub fn policy(&self) -> FetchFailurePolicy {
        self.policy
    }

    /// Run on every change of dentist, date, location or AM/PM.
    pub async fn recompute_availability(&self, query: &AvailabilityQuery) -> AvailabilityResult {
        let Some((clinician_id, date, location)) = query.selection() else {
            debug!("Availability skipped: dentist, date or location not selected");
            return AvailabilityResult::Incomplete {
                prompt: INCOMPLETE_SELECTION_PROMPT.to_string(),
            };
        };

        debug!("Recomputing availability for dentist {} on {} at {}", clinician_id, date, location);

        let (booked, degraded) = match self.source.fetch_booked_times(clinician_id, date, location).await {
            Ok(booked) => (booked, false),
            Err(e) => match self.policy {
                FetchFailurePolicy::FailOpen => {
                    warn!("Error fetching booked times, treating as no bookings: {}", e);
                    (Vec::new(), true)
                }
                FetchFailurePolicy::FailClosed => {
                    warn!("Error fetching booked times, disabling time selection: {}", e);
                    return AvailabilityResult::Unavailable {
                        message: BOOKED_TIMES_UNAVAILABLE_MESSAGE.to_string(),
                    };
                }
            },
        };

        let blocked = compute_blocked_minutes(&booked);
        let state = AvailabilityState::new(query.half_of_day, query.hour_label, blocked, degraded);

        debug!(
            "Availability ready: {} of {} hour option(s) enabled",
            state.hour_options.iter().filter(|h| h.enabled).count(),
            state.hour_options.len()
        );

        AvailabilityResult::Ready(state)
    }

    /// Checks a full time pick against fresh bookings before the form is submitted.
    pub async fn is_selection_available(
        &self,
        query: &AvailabilityQuery,
        selection: &TimeSelection,
    ) -> Result<bool, AppError> {
        let booked = self.fetch_for(query).await?;
        Ok(selection.is_available(&compute_blocked_minutes(&booked)))
    }

    /// Earliest slot that fits `request.duration_minutes` around existing bookings.
    pub async fn suggest_slot(
        &self,
        query: &AvailabilityQuery,
        request: &SlotRequest,
    ) -> Result<Option<SuggestedSlot>, AppError> {
        if query.date != Some(request.date) {
            return Err(AppError::ValidationError(format!(
                "Slot request date {} does not match the selected date", request.date
            )));
        }

        let booked = self.fetch_for(query).await?;
        let intervals: Vec<BookedInterval> = booked.iter().filter_map(BookedSlot::interval).collect();

        let slot = find_next_available_slot(request, &self.clinic_hours, &intervals);
        match &slot {
            Some(s) => debug!("Suggested slot {} - {}", s.start, s.end),
            None => debug!("No slot of {} minute(s) available on {}", request.duration_minutes, request.date),
        }

        Ok(slot)
    }

    async fn fetch_for(&self, query: &AvailabilityQuery) -> Result<Vec<BookedSlot>, AppError> {
        let (clinician_id, date, location) = query.selection().ok_or_else(|| {
            AppError::ValidationError(INCOMPLETE_SELECTION_PROMPT.to_string())
        })?;

        self.source.fetch_booked_times(clinician_id, date, location).await
    }
}
