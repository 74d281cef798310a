use std::env;
use tracing::warn;

pub const DEFAULT_BOOKED_TIMES_PATH: &str = "/dashboard/appointment/get-booked-times/";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub clinic_api_base_url: String,
    pub clinic_api_token: Option<String>,
    pub booked_times_path: String,
    pub request_timeout_secs: u64,
    pub fail_closed_on_fetch_error: bool,
    pub clinic_open_hour: u32,
    pub clinic_close_hour: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            clinic_api_base_url: String::new(),
            clinic_api_token: None,
            booked_times_path: DEFAULT_BOOKED_TIMES_PATH.to_string(),
            request_timeout_secs: 10,
            fail_closed_on_fetch_error: false,
            clinic_open_hour: 8,
            clinic_close_hour: 17,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            clinic_api_base_url: env::var("CLINIC_API_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_API_BASE_URL not set, using empty value");
                    String::new()
                }),
            clinic_api_token: env::var("CLINIC_API_TOKEN").ok().filter(|t| !t.is_empty()),
            booked_times_path: env::var("BOOKED_TIMES_PATH")
                .unwrap_or_else(|_| defaults.booked_times_path.clone()),
            request_timeout_secs: parse_var("CLINIC_API_TIMEOUT_SECS", defaults.request_timeout_secs),
            fail_closed_on_fetch_error: parse_var("BOOKED_TIMES_FAIL_CLOSED", defaults.fail_closed_on_fetch_error),
            clinic_open_hour: parse_var("CLINIC_OPEN_HOUR", defaults.clinic_open_hour),
            clinic_close_hour: parse_var("CLINIC_CLOSE_HOUR", defaults.clinic_close_hour),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        if config.clinic_open_hour >= config.clinic_close_hour || config.clinic_close_hour > 24 {
            warn!(
                "Clinic hours {}-{} are invalid, falling back to {}-{}",
                config.clinic_open_hour, config.clinic_close_hour,
                defaults.clinic_open_hour, defaults.clinic_close_hour
            );
            return Self {
                clinic_open_hour: defaults.clinic_open_hour,
                clinic_close_hour: defaults.clinic_close_hour,
                ..config
            };
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.clinic_api_base_url.is_empty()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
