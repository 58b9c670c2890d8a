//! Bearer token verification against the external identity service

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Timeout for the verification call.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity service URL is not configured")]
    NotConfigured,
    #[error("Token rejected by identity service")]
    InvalidToken,
    #[error("Identity service request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user_id: String,
}

/// Client for the "verify bearer token, get user id" call
#[derive(Clone)]
pub struct IdentityClient {
    base_url: Option<String>,
    client: Client,
}

impl IdentityClient {
    pub fn new(base_url: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(VERIFY_TIMEOUT)
            .user_agent("bindflow-server/0.1")
            .build()?;

        Ok(Self { base_url, client })
    }

    /// Verify a bearer token and return the user id it belongs to.
    #[tracing::instrument(skip(self, token))]
    pub async fn verify_token(&self, token: &str) -> Result<String, IdentityError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or(IdentityError::NotConfigured)?;
        let url = format!("{}/verify", base_url.trim_end_matches('/'));

        let response = self.client.get(&url).bearer_auth(token).send().await?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "Identity service rejected token");
            return Err(IdentityError::InvalidToken);
        }

        let body: VerifyResponse = response.json().await?;
        Ok(body.user_id)
    }
}
