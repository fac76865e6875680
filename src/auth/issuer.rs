//! Token issuer
//!
//! Exchanges long-lived partner/client credentials for a short-lived bearer
//! token via the OAuth2 client-credentials flow. Issuing a new token
//! invalidates any previously issued one, so callers are expected to cache
//! through the credential store. No retry at this layer.

use super::types::CredentialRecord;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Capability interface for requesting bearer tokens
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Request a fresh access token for the given credentials
    async fn fetch_token(&self, credentials: &CredentialRecord) -> Result<String>;
}

/// Token issuer backed by the remote OAuth endpoint
pub struct OauthTokenIssuer {
    http_client: Client,
    token_url: String,
    scope: String,
}

impl OauthTokenIssuer {
    /// Build an issuer from the API configuration
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            http_client: Client::new(),
            token_url: config.endpoint_url("v1/oauth/access_token"),
            scope: config.oauth_scope.clone(),
        }
    }

    /// The token endpoint URL this issuer posts to
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl TokenIssuer for OauthTokenIssuer {
    async fn fetch_token(&self, credentials: &CredentialRecord) -> Result<String> {
        let form = [
            ("partner_id", credentials.partner_id.as_str()),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::token_request(format!(
                "token endpoint returned status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
        Ok(token_response.access_token)
    }
}

impl std::fmt::Debug for OauthTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OauthTokenIssuer")
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}
