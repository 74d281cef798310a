use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use shared_client::{ApiStatusError, ClinicApiClient};
use shared_config::AppConfig;
use shared_models::{AppError, BookedSlot, BookedTimesResponse};

/// Where the booked appointments for a dentist/date/location come from.
#[async_trait]
pub trait BookedTimesSource: Send + Sync {
    async fn fetch_booked_times(
        &self,
        clinician_id: &str,
        date: NaiveDate,
        location: &str,
    ) -> Result<Vec<BookedSlot>, AppError>;
}

/// Reads booked times from the dashboard's `get-booked-times` endpoint.
pub struct BookedTimesClient {
    client: ClinicApiClient,
    path: String,
}

impl BookedTimesClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ClinicApiClient::new(config),
            path: config.booked_times_path.clone(),
        }
    }
}

#[async_trait]
impl BookedTimesSource for BookedTimesClient {
    async fn fetch_booked_times(
        &self,
        clinician_id: &str,
        date: NaiveDate,
        location: &str,
    ) -> Result<Vec<BookedSlot>, AppError> {
        debug!("Fetching booked times for dentist {} on {} at {}", clinician_id, date, location);

        let date_param = date.format("%Y-%m-%d").to_string();
        let query = [
            ("dentist", clinician_id),
            ("date", date_param.as_str()),
            ("location", location),
        ];

        let response: BookedTimesResponse = self.client
            .get(&self.path, &query)
            .await
            .map_err(classify_error)?;

        debug!("Received {} booked slot(s)", response.booked.len());
        Ok(response.booked)
    }
}

fn classify_error(err: anyhow::Error) -> AppError {
    match err.downcast_ref::<ApiStatusError>() {
        Some(status) if status.is_auth() => AppError::Auth(status.to_string()),
        Some(status) if status.is_not_found() => AppError::NotFound(status.to_string()),
        _ => AppError::ExternalService(format!("Failed to fetch booked times: {}", err)),
    }
}
