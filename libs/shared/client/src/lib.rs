pub mod clinic_api;

pub use clinic_api::{ApiStatusError, ClinicApiClient};
