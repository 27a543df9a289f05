//! HTTP client for a live DashClaw instance.
//!
//! Only the policy listing endpoint is used: `GET {base}/api/policies`,
//! authenticated with the `x-api-key` header.

use std::time::Duration;

use reqwest::{StatusCode, Url, redirect};
use serde_json::Value;
use tracing::{debug, info};

use super::DashClawPolicy;
use crate::error::DashClawError;

/// Policy listing path, relative to the base URL.
pub const POLICIES_PATH: &str = "api/policies";

/// Request timeout for DashClaw API calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the DashClaw policy API.
#[derive(Debug, Clone)]
pub struct DashClawClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl DashClawClient {
    /// Creates a client for the instance at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`DashClawError::InvalidUrl`] if `base_url` is not an
    /// `http`/`https` URL, or [`DashClawError::Http`] if the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, DashClawError> {
        let invalid = |message: String| DashClawError::InvalidUrl {
            url: base_url.to_string(),
            message,
        };

        // Joining is relative to the last path segment, so force a trailing slash
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let url = Url::parse(&normalized).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }

        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: url,
            api_key: api_key.into(),
        })
    }

    /// Base URL requests are made against (always ends with `/`).
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches every policy record from the instance.
    ///
    /// # Errors
    ///
    /// Returns [`DashClawError::Http`] on connection failure,
    /// [`DashClawError::Api`] on a non-2xx status, and
    /// [`DashClawError::InvalidResponse`] if the body has no `policies` array.
    pub async fn fetch_policies(&self) -> Result<Vec<DashClawPolicy>, DashClawError> {
        let body = self.get_policies_body().await?;

        let mut value: Value = serde_json::from_str(&body)
            .map_err(|e| DashClawError::InvalidResponse(e.to_string()))?;
        let list = value
            .get_mut("policies")
            .map(Value::take)
            .filter(Value::is_array)
            .ok_or_else(|| DashClawError::InvalidResponse("missing policies array".to_string()))?;

        let policies: Vec<DashClawPolicy> = serde_json::from_value(list)
            .map_err(|e| DashClawError::InvalidResponse(e.to_string()))?;

        info!(count = policies.len(), "fetched DashClaw policies");
        Ok(policies)
    }

    /// Checks that the API serves a well-formed policy listing.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_policies`](Self::fetch_policies).
    pub async fn check_connection(&self) -> Result<(), DashClawError> {
        self.fetch_policies().await.map(|_| ())
    }

    async fn get_policies_body(&self) -> Result<String, DashClawError> {
        let url = self
            .base_url
            .join(POLICIES_PATH)
            .map_err(|e| DashClawError::InvalidUrl {
                url: self.base_url.to_string(),
                message: e.to_string(),
            })?;

        debug!(url = %url, "requesting DashClaw policies");

        let response = self
            .http
            .get(url)
            .header("x-api-key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status, body));
        }

        Ok(body)
    }
}

fn api_error(status: StatusCode, body: String) -> DashClawError {
    DashClawError::Api {
        status: status.as_u16(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_trailing_slash() {
        let client = DashClawClient::new("https://dash.example.com/tenant", "key").unwrap();
        assert_eq!(
            client.base_url().join(POLICIES_PATH).unwrap().as_str(),
            "https://dash.example.com/tenant/api/policies"
        );

        let client = DashClawClient::new("https://dash.example.com//", "key").unwrap();
        assert_eq!(
            client.base_url().join(POLICIES_PATH).unwrap().as_str(),
            "https://dash.example.com/api/policies"
        );
    }

    #[test]
    fn test_new_rejects_bad_urls() {
        assert!(matches!(
            DashClawClient::new("not a url", "key"),
            Err(DashClawError::InvalidUrl { .. })
        ));
        assert!(matches!(
            DashClawClient::new("ftp://dash.example.com", "key"),
            Err(DashClawError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_api_error_carries_status() {
        let err = api_error(StatusCode::UNAUTHORIZED, "bad key".to_string());
        assert_eq!(err.to_string(), "DashClaw API error (401): bad key");
    }
}
