//! Relay error taxonomy.
//!
//! Every route handler returns `Result<_, RelayError>`; the `IntoResponse`
//! impl turns any failure into a JSON `{ "error": ... }` body with a matching
//! status code, so no raw error ever escapes to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// All the ways a relay request can fail.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Required input missing or malformed (400).
    #[error("{0}")]
    Validation(String),

    /// The upstream research or auth API failed or returned garbage (500).
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// The upstream replied with a non-success status worth passing through.
    /// `message` is the client-facing summary; `details` carries the raw
    /// upstream body when there is one.
    #[error("{message} (upstream status {status})")]
    UpstreamStatus {
        status: u16,
        message: String,
        details: serde_json::Value,
    },

    /// The OAuth provider reported an error at the callback.
    #[error("{0}")]
    AuthProvider(String),

    /// Returned `state` does not match the one stored for this attempt.
    #[error("Invalid state parameter. Please try again.")]
    Csrf,

    /// Callback arrived without an authorization code.
    #[error("No authorization code received. Please try again.")]
    MissingCode,

    /// The one-shot code verifier is gone (storage cleared, other tab).
    #[error("PKCE code verifier not found. Please try again.")]
    MissingVerifier,

    /// Missing or malformed `Authorization: Bearer` header (401).
    #[error("Missing or invalid authorization header")]
    Unauthorized,

    /// PDF generation failed or exceeded its time budget (500).
    #[error("PDF rendering failed: {0}")]
    Render(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Validation(_)
            | RelayError::AuthProvider(_)
            | RelayError::Csrf
            | RelayError::MissingCode
            | RelayError::MissingVerifier => StatusCode::BAD_REQUEST,
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::Upstream(_) | RelayError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }

    /// Client-facing message. Upstream and render detail is only exposed in
    /// debug builds; release builds answer with a generic message.
    fn public_message(&self) -> String {
        match self {
            RelayError::Upstream(_) if !cfg!(debug_assertions) => {
                "Upstream request failed".to_string()
            }
            RelayError::Render(_) if !cfg!(debug_assertions) => {
                "Failed to generate PDF".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            RelayError::UpstreamStatus {
                message, details, ..
            } => {
                if details.is_null() {
                    json!({ "error": message })
                } else {
                    json!({ "error": message, "details": details })
                }
            }
            other => json!({ "error": other.public_message() }),
        };
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::debug!(%status, error = %self, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            RelayError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(RelayError::Csrf.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RelayError::Upstream("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::UpstreamStatus {
                status: 403,
                message: "Token exchange failed".to_string(),
                details: json!({}),
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn upstream_status_body_carries_its_own_message() {
        let response = RelayError::UpstreamStatus {
            status: 401,
            message: "Failed to fetch user info".to_string(),
            details: serde_json::Value::Null,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Failed to fetch user info");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn upstream_status_body_keeps_exchange_details() {
        let response = RelayError::UpstreamStatus {
            status: 400,
            message: "Token exchange failed".to_string(),
            details: json!({ "error": "invalid_grant" }),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Token exchange failed");
        assert_eq!(body["details"]["error"], "invalid_grant");
    }
}
