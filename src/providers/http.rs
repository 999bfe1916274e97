//! Shared HTTP plumbing for the upstream providers

use crate::{config::TrackerConfig, error::FetchError};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Builds the client every provider shares
///
/// Request timeouts are enforced here and nowhere else.
pub fn build_client(config: &TrackerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.as_str())
        .build()
}

/// GETs `url` and decodes the JSON body
///
/// Non-success statuses map to [`FetchError::HttpStatus`], transport failures
/// to [`FetchError::Network`] and undecodable bodies to
/// [`FetchError::InvalidResponse`].
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    upstream: &'static str,
    url: &str,
) -> Result<T, FetchError> {
    tracing::debug!(upstream, url, "Requesting upstream");

    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!(upstream, status = status.as_u16(), "Upstream returned error status");
        return Err(FetchError::HttpStatus {
            upstream,
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;

    serde_json::from_str(&body).map_err(|e| {
        FetchError::invalid(format!("Failed to parse {} response: {}", upstream, e))
    })
}
