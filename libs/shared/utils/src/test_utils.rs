use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub clinic_api_base_url: String,
    pub clinic_api_token: Option<String>,
    pub fail_closed_on_fetch_error: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            clinic_api_base_url: "http://localhost:8000".to_string(),
            clinic_api_token: None,
            fail_closed_on_fetch_error: false,
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            clinic_api_base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn fail_closed(mut self) -> Self {
        self.fail_closed_on_fetch_error = true;
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            clinic_api_base_url: self.clinic_api_base_url.clone(),
            clinic_api_token: self.clinic_api_token.clone(),
            fail_closed_on_fetch_error: self.fail_closed_on_fetch_error,
            request_timeout_secs: 2,
            ..AppConfig::default()
        }
    }
}

/// Identifiers for a clinician/location pair as the dashboard forms send them.
pub struct TestClinic {
    pub dentist_id: String,
    pub location_id: String,
}

impl Default for TestClinic {
    fn default() -> Self {
        Self {
            dentist_id: "12".to_string(),
            location_id: "3".to_string(),
        }
    }
}

impl TestClinic {
    pub fn random() -> Self {
        Self {
            dentist_id: Uuid::new_v4().to_string(),
            location_id: Uuid::new_v4().to_string(),
        }
    }
}

pub struct MockClinicResponses;

impl MockClinicResponses {
    pub fn booked_times(slots: &[(&str, &str)]) -> Value {
        let booked: Vec<Value> = slots
            .iter()
            .map(|(start, end)| json!({ "start": start, "end": end }))
            .collect();

        json!({ "booked": booked })
    }

    /// Appointment saved without an end time, as the backend serializes it.
    pub fn open_ended_booking(start: &str) -> Value {
        json!({ "start": start, "end": null })
    }

    pub fn error_response(message: &str) -> Value {
        json!({ "error": message })
    }
}
