use std::time::Duration;

use anyhow::Result;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

/// Non-2xx answer from the clinic backend. Carried inside the `anyhow::Error`
/// so callers can `downcast_ref` instead of matching on message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("API error ({status}): {body}")]
pub struct ApiStatusError {
    pub status: u16,
    pub body: String,
}

impl ApiStatusError {
    pub fn is_auth(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Thin JSON client for the clinic dashboard endpoints.
#[derive(Clone)]
pub struct ClinicApiClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl ClinicApiClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.clinic_api_base_url.trim_end_matches('/').to_string(),
            api_token: config.clinic_api_token.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        if let Some(token) = &self.api_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            query: &[(&str, &str)])
                            -> Result<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let headers = self.get_headers()?;

        let response = self.client.request(method, &url)
            .headers(headers)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(ApiStatusError {
                status: status.as_u16(),
                body: error_text,
            }.into());
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    pub async fn get<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T>
    where T: DeserializeOwned {
        self.request(Method::GET, path, query).await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
