use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::Session;

/// Build reason Tilt records for triggers coming from its web UI
/// (`BuildReasonFlagTriggerWeb`).
const BUILD_REASON_TRIGGER_WEB: u32 = 16;

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum TiltError {
    #[error("request to Tilt failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Tilt responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode Tilt response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid Tilt URL {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Serialize)]
struct TriggerRequest<'a> {
    manifest_names: [&'a str; 1],
    build_reason: u32,
}

/// Client for a running Tilt instance's HTTP API
#[derive(Debug, Clone)]
pub struct TiltClient {
    base_url: Url,
    session_name: String,
    client: Client,
}

impl TiltClient {
    /// `timeout` bounds each whole request, so a Tilt that accepts the
    /// connection but never answers is treated as unreachable.
    pub fn new(
        base_url: &str,
        session_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TiltError> {
        let parsed =
            Url::parse(base_url).map_err(|e| TiltError::InvalidUrl(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(TiltError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .build()?;

        Ok(Self {
            base_url: parsed,
            session_name: session_name.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Base URL with `segments` appended, each percent-encoded as one segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TiltError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TiltError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn session_url(&self) -> Result<Url, TiltError> {
        self.endpoint(&[
            "proxy",
            "apis",
            "tilt.dev",
            "v1alpha1",
            "sessions",
            &self.session_name,
        ])
    }

    /// Fetch the current session snapshot
    pub async fn get_session(&self) -> Result<Session, TiltError> {
        let url = self.session_url()?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TiltError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Ask Tilt to rebuild one resource
    pub async fn trigger_build(&self, resource_name: &str) -> Result<(), TiltError> {
        let url = self.endpoint(&["api", "trigger"])?;
        let request = TriggerRequest {
            manifest_names: [resource_name],
            build_reason: BUILD_REASON_TRIGGER_WEB,
        };

        debug!(resource = resource_name, "triggering build");
        let response = self.client.post(url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TiltError::Status { status, body });
        }

        Ok(())
    }
}
