use crate::models::{
    InitialProfiles, Profile, ProfilesResponse, RecordDecisionRequest, SwipeRequest,
};
use crate::services::{DecisionRecorder, ProfileSource, RecordError, SourceError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

/// Header carrying the acting user's identity
pub const USER_HEADER: &str = "user";

/// Header carrying the per-swipe idempotency key
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Errors that can occur when talking to the Lume API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned status {0}")]
    Status(StatusCode),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ApiError> for SourceError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status(StatusCode::NOT_FOUND) => SourceError::NotFound(err.to_string()),
            ApiError::InvalidResponse(msg) => SourceError::InvalidResponse(msg),
            other => SourceError::Request(other.to_string()),
        }
    }
}

impl From<ApiError> for RecordError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status(status) => RecordError::Rejected {
                status: status.as_u16(),
            },
            ApiError::InvalidRequest(msg) => RecordError::Invalid(msg),
            other => RecordError::Transport(other.to_string()),
        }
    }
}

/// Lume API client
///
/// Handles the request/response side of a swipe session:
/// - Loading the signed-in user and the candidate stack
/// - Recording like/dislike decisions
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a new API client with the default 30s request timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with {:?} timeout, using defaults: {}", timeout, e);
                Client::new()
            });

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Fetch the signed-in user and their candidate stack
    pub async fn get_profiles(&self, user_id: &str) -> Result<InitialProfiles, ApiError> {
        let url = self.url("/devs");

        tracing::debug!("Fetching candidates for user: {}", user_id);

        let response = self
            .client
            .get(&url)
            .header(USER_HEADER, user_id)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to fetch candidates for {}: {} - {}", user_id, status, body);
            return Err(ApiError::Status(status));
        }

        let payload: ProfilesResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse profiles: {}", e)))?;

        payload
            .user
            .validate()
            .map_err(|e| ApiError::InvalidResponse(format!("Invalid current user: {}", e)))?;

        let total = payload.users.len();
        let candidates: Vec<Profile> = payload
            .users
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<Profile>(raw) {
                Ok(profile) if profile.id == user_id => {
                    tracing::debug!("Leaving the signed-in user's own profile out of the stack");
                    None
                }
                Ok(profile) if profile.validate().is_ok() => Some(profile),
                Ok(profile) => {
                    tracing::warn!("Skipping invalid candidate {:?}", profile.id);
                    None
                }
                Err(e) => {
                    tracing::warn!("Skipping undecodable candidate: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Loaded {} candidates (of {}) for {}", candidates.len(), total, user_id);

        Ok(InitialProfiles {
            user: payload.user,
            candidates,
        })
    }

    /// Record a like or dislike
    pub async fn post_decision(&self, request: &SwipeRequest) -> Result<(), ApiError> {
        let body = RecordDecisionRequest::from(request);
        body.validate()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let url = self.url(&format!(
            "/devs/{}/{}",
            urlencoding::encode(&request.target_id),
            request.direction.endpoint()
        ));

        let response = self
            .client
            .post(&url)
            .header(USER_HEADER, &request.actor_id)
            .header(REQUEST_ID_HEADER, request.request_id.to_string())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        tracing::debug!(
            "Recorded {} #{}: {} -> {}",
            request.direction,
            request.sequence,
            request.actor_id,
            request.target_id
        );

        Ok(())
    }
}

#[async_trait]
impl ProfileSource for ApiClient {
    async fn fetch_initial(&self, identity: &str) -> Result<InitialProfiles, SourceError> {
        Ok(self.get_profiles(identity).await?)
    }
}

#[async_trait]
impl DecisionRecorder for ApiClient {
    async fn record(&self, request: &SwipeRequest) -> Result<(), RecordError> {
        Ok(self.post_decision(request).await?)
    }
}
