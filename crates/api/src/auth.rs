use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{header, HeaderMap};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::AuthSettings;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("authentication is not configured on this server")]
    NotConfigured,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("auth backend request failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    email: Option<String>,
}

/// Supabase-compatible `/auth/v1/user` lookup.
#[derive(Clone)]
struct RemoteResolver {
    http: Client,
    endpoint: Url,
    api_key: String,
}

impl RemoteResolver {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .header("apikey", self.api_key.as_str())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| AuthError::Backend(err.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            return Err(AuthError::Backend(format!("status {}", status.as_u16())));
        }

        let user: RemoteUser = response
            .json()
            .await
            .map_err(|err| AuthError::Backend(err.to_string()))?;
        if user.id.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(AuthenticatedUser {
            id: user.id,
            email: user.email,
        })
    }
}

/// Maps bearer tokens to user ids. Static tokens are checked first, then the
/// remote backend when one is configured.
#[derive(Clone, Default)]
pub struct TokenResolver {
    static_tokens: Arc<HashMap<String, String>>,
    remote: Option<RemoteResolver>,
}

impl TokenResolver {
    pub fn new(settings: &AuthSettings) -> anyhow::Result<Self> {
        let remote = match (&settings.remote_url, &settings.remote_key) {
            (Some(base), Some(key)) => {
                let base = Url::parse(&format!("{}/", base.trim_end_matches('/')))
                    .with_context(|| format!("invalid TRIPIT_AUTH_URL: {}", base))?;
                let endpoint = base
                    .join("auth/v1/user")
                    .context("failed to build auth endpoint")?;
                let http = Client::builder()
                    .connect_timeout(Duration::from_secs(5))
                    .timeout(Duration::from_secs(10))
                    .build()
                    .context("failed to build auth HTTP client")?;
                Some(RemoteResolver {
                    http,
                    endpoint,
                    api_key: key.clone(),
                })
            }
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(
                    "TRIPIT_AUTH_URL and TRIPIT_AUTH_KEY must both be set, remote auth disabled"
                );
                None
            }
            (None, None) => None,
        };

        Ok(Self {
            static_tokens: Arc::new(settings.dev_tokens.clone()),
            remote,
        })
    }

    pub fn from_static(tokens: HashMap<String, String>) -> Self {
        Self {
            static_tokens: Arc::new(tokens),
            remote: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.remote.is_some() || !self.static_tokens.is_empty()
    }

    pub async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(user_id) = self.static_tokens.get(token) {
            return Ok(AuthenticatedUser {
                id: user_id.clone(),
                email: None,
            });
        }
        match &self.remote {
            Some(remote) => remote.resolve(token).await,
            None if self.static_tokens.is_empty() => Err(AuthError::NotConfigured),
            None => Err(AuthError::InvalidToken),
        }
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
        let token = bearer_token(headers)?;
        self.resolve(token).await
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    let (scheme, token) = value.trim().split_once(' ').ok_or(AuthError::MissingToken)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}
