//! `reqwest` implementation of [`ProgressService`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::types::{parse_solved_count, UserProfile};
use super::{ProgressService, ServiceError};

/// Default service location used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// HTTP client for the progress service.
///
/// Endpoints:
/// - `GET {base}/{username}`: user lookup
/// - `GET {base}/{username}/solved`: `{"solvedProblem": N}`
#[derive(Debug, Clone)]
pub struct HttpProgressClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpProgressClient {
    /// Build a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ServiceError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::InvalidBaseUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ServiceError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ProgressService for HttpProgressClient {
    async fn lookup_user(&self, username: &str) -> Result<UserProfile, ServiceError> {
        let url = self.endpoint(&[username])?;
        log::debug!("GET {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let profile: UserProfile = serde_json::from_str(&body)?;
        if profile.has_errors() {
            return Err(ServiceError::Rejected(username.to_string()));
        }
        Ok(profile)
    }

    async fn solved_count(&self, username: &str) -> Result<u32, ServiceError> {
        let url = self.endpoint(&[username, "solved"])?;
        log::debug!("GET {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_solved_count(&body)
    }
}
