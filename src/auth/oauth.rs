//! OAuth upstream client.
//!
//! Performs the confidential half of the PKCE flow: exchanging the
//! authorization code (plus verifier and client secret) for tokens, and
//! fetching the user profile with a bearer token.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;
use crate::error::RelayError;

/// Token set as issued by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Client for the vendor authorization server and platform userinfo endpoint.
pub struct OAuthClient {
    client: Client,
    auth_base_url: String,
    platform_url: String,
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
}

impl OAuthClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            auth_base_url: config.auth_base_url.trim_end_matches('/').to_string(),
            platform_url: config.platform_url.trim_end_matches('/').to_string(),
            client_id: config.oauth_client_id.clone(),
            client_secret: config.oauth_client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    /// Exchange an authorization code plus PKCE verifier for a token set.
    ///
    /// A non-success reply is surfaced as `UpstreamStatus` so the relay can
    /// pass the provider's status code and details through to its client.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, RelayError> {
        let body = json!({
            "grant_type": "authorization_code",
            "code": code,
            "redirect_uri": self.redirect_uri,
            "client_id": self.client_id,
            "client_secret": self.client_secret,
            "code_verifier": code_verifier,
        });

        let response = self
            .client
            .post(format!("{}/auth/v1/oauth/token", self.auth_base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("token exchange request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let details = serde_json::from_str(&text)
                .unwrap_or_else(|_| serde_json::Value::String(text.clone()));
            tracing::warn!(status = %status, "token exchange failed");
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                message: "Token exchange failed".to_string(),
                details,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| RelayError::Upstream(format!("bad token reply: {e}")))
    }

    /// Fetch the user profile for an access token, passing the upstream
    /// status through on failure.
    pub async fn user_info(&self, access_token: &str) -> Result<serde_json::Value, RelayError> {
        let response = self
            .client
            .get(format!("{}/api/oauth/userinfo", self.platform_url))
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("userinfo request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "userinfo fetch failed: {text}");
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                message: "Failed to fetch user info".to_string(),
                details: serde_json::Value::Null,
            });
        }

        response
            .json()
            .await
            .map_err(|e| RelayError::Upstream(format!("bad userinfo reply: {e}")))
    }
}

/// Fixed user-facing message for a provider error code. Unrecognized codes
/// get a generic wrapper instead of a raw passthrough.
pub fn provider_error_message(code: &str) -> String {
    match code {
        "access_denied" => "Access denied. You cancelled the authorization.".to_string(),
        "missing_parameters" => "Missing required parameters.".to_string(),
        "token_exchange_failed" => {
            "Failed to exchange authorization code for token.".to_string()
        }
        "authentication_failed" => "Authentication failed. Please try again.".to_string(),
        other => format!("An error occurred: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_provider_errors_map_to_fixed_messages() {
        assert_eq!(
            provider_error_message("access_denied"),
            "Access denied. You cancelled the authorization."
        );
        assert_eq!(
            provider_error_message("token_exchange_failed"),
            "Failed to exchange authorization code for token."
        );
    }

    #[test]
    fn unknown_provider_errors_get_generic_wrapper() {
        assert_eq!(
            provider_error_message("server_exploded"),
            "An error occurred: server_exploded"
        );
    }
}
