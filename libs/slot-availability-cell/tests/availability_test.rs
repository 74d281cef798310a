// libs/slot-availability-cell/tests/availability_test.rs

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_utils::test_utils::{MockClinicResponses, TestClinic, TestConfig};
use slot_availability_cell::{
    AppError, AvailabilityQuery, AvailabilityResult, AvailabilityService, BookedSlot,
    BookedTimesSource, ClinicHours, FetchFailurePolicy, HalfOfDay, SlotRequest, TimeSelection,
    INCOMPLETE_SELECTION_PROMPT,
};

// ==============================================================================
// TEST FIXTURES
// ==============================================================================

/// In-memory booked times that records every lookup it serves.
struct StaticBookings {
    booked: Vec<BookedSlot>,
    fail: bool,
    calls: Mutex<Vec<(String, NaiveDate, String)>>,
}

impl StaticBookings {
    fn new(booked: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            booked: booked.iter().map(|(s, e)| BookedSlot::new(s, e)).collect(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            booked: Vec::new(),
            fail: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl BookedTimesSource for StaticBookings {
    async fn fetch_booked_times(
        &self,
        clinician_id: &str,
        date: NaiveDate,
        location: &str,
    ) -> Result<Vec<BookedSlot>, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((clinician_id.to_string(), date, location.to_string()));

        if self.fail {
            return Err(AppError::ExternalService("connection refused".to_string()));
        }
        Ok(self.booked.clone())
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 3, 14).unwrap()
}

fn query() -> AvailabilityQuery {
    AvailabilityQuery::new("12", date(), "3")
}

fn service(source: Arc<StaticBookings>) -> AvailabilityService {
    AvailabilityService::with_source(source, FetchFailurePolicy::FailOpen)
}

fn enabled_hours(result: &AvailabilityResult) -> Vec<(u32, bool)> {
    result
        .state()
        .expect("availability should be ready")
        .hour_options
        .iter()
        .map(|h| (h.label, h.enabled))
        .collect()
}

// ==============================================================================
// INCOMPLETE SELECTION
// ==============================================================================

#[tokio::test]
async fn test_missing_selection_disables_controls_without_fetching() {
    let source = StaticBookings::new(&[("09:00", "10:00")]);
    let service = service(source.clone());

    let cases = vec![
        AvailabilityQuery { clinician_id: None, ..query() },
        AvailabilityQuery { date: None, ..query() },
        AvailabilityQuery { location: Some("   ".to_string()), ..query() },
        AvailabilityQuery::default(),
    ];

    for q in cases {
        let result = service.recompute_availability(&q).await;
        assert_matches!(
            &result,
            AvailabilityResult::Incomplete { prompt } if prompt == INCOMPLETE_SELECTION_PROMPT
        );
        assert!(!result.controls_enabled());
    }

    assert_eq!(source.call_count(), 0);
}

// ==============================================================================
// HOUR AND MINUTE OPTIONS
// ==============================================================================

#[tokio::test]
async fn test_no_half_of_day_leaves_hours_neutral() {
    let source = StaticBookings::new(&[("09:00", "10:00")]);
    let service = service(source.clone());

    let result = service.recompute_availability(&query()).await;
    let state = result.state().expect("ready");

    assert!(state.hour_options.is_empty());
    assert!(state.is_hour_label_enabled(9));
    assert!(state.minute_options.iter().all(|m| m.enabled));
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn test_morning_hours_disable_fully_booked_hour() {
    let service = service(StaticBookings::new(&[("09:00", "10:00"), ("10:00", "10:30")]));

    let result = service
        .recompute_availability(&query().with_half_of_day(HalfOfDay::Am))
        .await;

    assert_eq!(enabled_hours(&result), vec![(8, true), (9, false), (10, true), (11, true)]);
}

#[tokio::test]
async fn test_afternoon_labels_map_to_24_hour_values() {
    let service = service(StaticBookings::new(&[("12:00", "13:00"), ("15:00", "16:00")]));

    let result = service
        .recompute_availability(&query().with_half_of_day(HalfOfDay::Pm))
        .await;
    let state = result.state().unwrap();

    let hours24: Vec<u32> = state.hour_options.iter().map(|h| h.hour24).collect();
    assert_eq!(hours24, vec![12, 13, 14, 15, 16, 17]);
    assert_eq!(
        enabled_hours(&result),
        vec![(12, false), (1, true), (2, true), (3, false), (4, true), (5, true)]
    );
}

#[tokio::test]
async fn test_minute_options_follow_selected_hour() {
    let service = service(StaticBookings::new(&[("08:00", "08:30")]));

    let result = service
        .recompute_availability(&query().with_half_of_day(HalfOfDay::Am).with_hour_label(8))
        .await;
    let state = result.state().unwrap();

    let disabled: Vec<&str> = state
        .minute_options
        .iter()
        .filter(|m| !m.enabled)
        .map(|m| m.label.as_str())
        .collect();
    assert_eq!(disabled, vec!["00", "05", "10", "15", "20", "25"]);

    // switching hour re-evaluates minutes from the same blocked set
    let nine = state.minute_options_for(Some(9));
    assert!(nine.iter().all(|m| m.enabled));
}

#[tokio::test]
async fn test_select_hour_updates_state_in_place() {
    let service = service(StaticBookings::new(&[("14:20", "14:35")]));

    let result = service
        .recompute_availability(&query().with_half_of_day(HalfOfDay::Pm))
        .await;
    let AvailabilityResult::Ready(mut state) = result else {
        panic!("expected ready availability");
    };

    assert!(state.minute_options.iter().all(|m| m.enabled));

    state.select_hour(Some(2));
    let blocked: Vec<u32> = state
        .minute_options
        .iter()
        .filter(|m| !m.enabled)
        .map(|m| m.minute)
        .collect();
    assert_eq!(blocked, vec![20, 25, 30]);
}

// ==============================================================================
// FETCH FAILURE POLICY
// ==============================================================================

#[tokio::test]
async fn test_fetch_failure_fails_open_by_default() {
    let service = service(StaticBookings::failing());

    let result = service
        .recompute_availability(&query().with_half_of_day(HalfOfDay::Am).with_hour_label(9))
        .await;
    let state = result.state().expect("fail-open still renders options");

    assert!(state.degraded);
    assert!(state.blocked.is_empty());
    assert!(state.hour_options.iter().all(|h| h.enabled));
    assert!(state.minute_options.iter().all(|m| m.enabled));
}

#[tokio::test]
async fn test_fetch_failure_fail_closed_disables_controls() {
    let service = AvailabilityService::with_source(StaticBookings::failing(), FetchFailurePolicy::FailClosed);

    let result = service
        .recompute_availability(&query().with_half_of_day(HalfOfDay::Am))
        .await;

    assert_matches!(result, AvailabilityResult::Unavailable { .. });
    assert!(!result.controls_enabled());
}

// ==============================================================================
// SELECTION CHECK AND SLOT SUGGESTION
// ==============================================================================

#[tokio::test]
async fn test_selection_check_against_bookings() {
    let service = service(StaticBookings::new(&[("13:00", "13:30")]));

    let taken = TimeSelection::new(1, 15, HalfOfDay::Pm).unwrap();
    let free = TimeSelection::new(1, 30, HalfOfDay::Pm).unwrap();

    assert!(!service.is_selection_available(&query(), &taken).await.unwrap());
    assert!(service.is_selection_available(&query(), &free).await.unwrap());
}

#[tokio::test]
async fn test_selection_check_requires_complete_query() {
    let service = service(StaticBookings::new(&[]));
    let selection = TimeSelection::new(9, 0, HalfOfDay::Am).unwrap();

    let err = service
        .is_selection_available(&AvailabilityQuery::default(), &selection)
        .await
        .unwrap_err();

    assert_matches!(err, AppError::ValidationError(_));
}

#[tokio::test]
async fn test_suggest_slot_skips_booked_ranges() {
    let service = service(StaticBookings::new(&[("08:00", "09:00"), ("09:15", "09:45")]));
    let request = SlotRequest {
        date: date(),
        duration_minutes: 30,
        preferred_time: NaiveTime::from_hms_opt(8, 30, 0),
        now: NaiveDateTime::new(
            NaiveDate::from_ymd_opt(2030, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        ),
    };

    let slot = service.suggest_slot(&query(), &request).await.unwrap().unwrap();

    assert_eq!(slot.start, NaiveTime::from_hms_opt(9, 45, 0).unwrap());
    assert_eq!(slot.end, NaiveTime::from_hms_opt(10, 15, 0).unwrap());
}

#[tokio::test]
async fn test_suggest_slot_respects_custom_clinic_hours() {
    let hours = ClinicHours {
        open: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        close: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        step_minutes: 15,
    };
    let service = service(StaticBookings::new(&[("10:00", "10:30")])).with_clinic_hours(hours);
    let request = SlotRequest {
        date: date(),
        duration_minutes: 60,
        preferred_time: None,
        now: date().and_hms_opt(7, 0, 0).unwrap(),
    };

    let slot = service.suggest_slot(&query(), &request).await.unwrap().unwrap();
    assert_eq!(slot.start, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
    assert_eq!(slot.end, NaiveTime::from_hms_opt(11, 30, 0).unwrap());

    let too_long = SlotRequest { duration_minutes: 120, ..request };
    assert!(service.suggest_slot(&query(), &too_long).await.unwrap().is_none());
}

#[tokio::test]
async fn test_suggest_slot_rejects_mismatched_date() {
    let service = service(StaticBookings::new(&[]));
    let request = SlotRequest {
        date: date().succ_opt().unwrap(),
        duration_minutes: 30,
        preferred_time: None,
        now: date().and_hms_opt(7, 0, 0).unwrap(),
    };

    let err = service.suggest_slot(&query(), &request).await.unwrap_err();
    assert_matches!(err, AppError::ValidationError(_));
}

// ==============================================================================
// HTTP-BACKED SERVICE
// ==============================================================================

#[tokio::test]
async fn test_service_from_config_reads_booked_times_endpoint() {
    let mock_server = MockServer::start().await;
    let clinic = TestClinic::default();

    Mock::given(method("GET"))
        .and(path("/dashboard/appointment/get-booked-times/"))
        .and(query_param("dentist", clinic.dentist_id.as_str()))
        .and(query_param("date", "2030-03-14"))
        .and(query_param("location", clinic.location_id.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockClinicResponses::booked_times(&[("10:00", "11:00")]),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(mock_server.uri()).to_app_config();
    let service = AvailabilityService::new(&config);

    let q = AvailabilityQuery::new(clinic.dentist_id.clone(), date(), clinic.location_id.clone())
        .with_half_of_day(HalfOfDay::Am);
    let result = service.recompute_availability(&q).await;

    assert_eq!(enabled_hours(&result), vec![(8, true), (9, true), (10, false), (11, true)]);
    assert!(!result.state().unwrap().degraded);
}

#[tokio::test]
async fn test_service_from_config_server_error_policies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dashboard/appointment/get-booked-times/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(
            MockClinicResponses::error_response("boom"),
        ))
        .mount(&mock_server)
        .await;

    let q = query().with_half_of_day(HalfOfDay::Pm);

    let open = AvailabilityService::new(&TestConfig::with_base_url(mock_server.uri()).to_app_config());
    assert_eq!(open.policy(), FetchFailurePolicy::FailOpen);
    let result = open.recompute_availability(&q).await;
    assert!(result.state().unwrap().degraded);

    let closed = AvailabilityService::new(
        &TestConfig::with_base_url(mock_server.uri()).fail_closed().to_app_config(),
    );
    assert_matches!(closed.recompute_availability(&q).await, AvailabilityResult::Unavailable { .. });
}
