//! OAuth2 access-token handling for the upload endpoint.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use crate::config::{Credentials, OAUTH_PLAYGROUND_URL};

/// Tokens expiring within this window are refreshed before use.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error(
        "invalid OAuth credentials ({code}): {description}. Verify that the refresh token is \
         valid and not expired, that the client id and secret are correct, and that the YouTube \
         Data API v3 is enabled. A new refresh token can be generated at {playground}"
    )]
    InvalidGrant {
        code: String,
        description: String,
        playground: &'static str,
    },
    #[error(
        "access token rejected by the upload endpoint: {0}. The refresh token may have expired \
         or been revoked"
    )]
    Rejected(String),
    #[error("token refresh failed: {0}")]
    Refresh(String),
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|exp| now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) < exp)
            .unwrap_or(false)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct TokenErrorResponse {
    error: String,
    error_description: String,
}

/// Hands out access tokens, refreshing through the token endpoint when the
/// cached one is missing, expired, or of unknown age.
pub struct TokenProvider {
    client: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cached: Option<AccessToken>,
}

impl TokenProvider {
    pub fn new(client: reqwest::Client, token_endpoint: impl Into<String>, creds: &Credentials) -> Self {
        let cached = creds.access_token.clone().map(|value| AccessToken {
            value,
            expires_at: creds.access_token_expires_at,
        });
        Self {
            client,
            token_endpoint: token_endpoint.into(),
            client_id: creds.client_id.clone(),
            client_secret: creds.client_secret.clone(),
            refresh_token: creds.refresh_token.clone(),
            cached,
        }
    }

    /// A bearer token valid for at least the refresh margin.
    pub async fn access_token(&mut self) -> Result<String, CredentialError> {
        if let Some(token) = self.cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            debug!("reusing cached access token");
            return Ok(token.value.clone());
        }

        let token = self.refresh().await?;
        let value = token.value.clone();
        self.cached = Some(token);
        Ok(value)
    }

    async fn refresh(&self) -> Result<AccessToken, CredentialError> {
        info!("refreshing access token");
        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| CredentialError::Refresh(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CredentialError::Refresh(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_refresh_failure(status, &body));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| CredentialError::Refresh(format!("malformed token response: {e}")))?;
        info!("access token refreshed");

        Ok(AccessToken {
            value: parsed.access_token,
            expires_at: parsed
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}

fn classify_refresh_failure(status: reqwest::StatusCode, body: &str) -> CredentialError {
    let parsed: TokenErrorResponse = serde_json::from_str(body).unwrap_or_default();
    if matches!(parsed.error.as_str(), "invalid_grant" | "invalid_client") {
        return CredentialError::InvalidGrant {
            code: parsed.error,
            description: parsed.error_description,
            playground: OAUTH_PLAYGROUND_URL,
        };
    }
    if body.contains("Invalid Credentials") {
        return CredentialError::Rejected(body.to_string());
    }
    CredentialError::Refresh(format!("token endpoint returned {status}: {body}"))
}
