//! Auth route handlers: server-side token exchange, userinfo passthrough,
//! and the provider callback redirect.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
    Json,
};

use super::routes::AppState;
use super::types::{CallbackQuery, TokenRequest};
use crate::auth::TokenResponse;
use crate::error::RelayError;

/// `POST /api/auth/token`: exchange an authorization code plus PKCE
/// verifier for a token set. The client secret never leaves this process.
pub async fn exchange_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, RelayError> {
    let code = req
        .code
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RelayError::Validation("Missing code or codeVerifier".to_string()))?;
    let verifier = req
        .code_verifier
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RelayError::Validation("Missing code or codeVerifier".to_string()))?;

    let tokens = state.oauth.exchange_code(code, verifier).await?;
    Ok(Json(tokens))
}

/// `GET /api/auth/user`: fetch the signed-in user's profile with the
/// bearer token from the Authorization header.
pub async fn user_info(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, RelayError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .unwrap_or("");

    if token.is_empty() {
        return Err(RelayError::Unauthorized);
    }

    let profile = state.oauth.user_info(token).await?;
    Ok(Json(profile))
}

/// `GET /api/auth/callback`: landing point for the provider redirect.
///
/// Hands `code`/`state` over to the application's completion page, which
/// holds the code verifier; provider errors and missing parameters bounce
/// back to the application root with an `error` query parameter. Either
/// way the user lands on a known-good page.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let app_url = state.config.app_url.trim_end_matches('/');

    if let Some(error) = &query.error {
        let reason = match &query.error_description {
            Some(desc) => format!("{error}: {desc}"),
            None => error.clone(),
        };
        tracing::warn!(error = %reason, "oauth provider returned an error");
        return Redirect::temporary(&format!(
            "{app_url}/?error={}",
            urlencoding::encode(&reason)
        ));
    }

    let (Some(code), Some(csrf_state)) = (&query.code, &query.state) else {
        return Redirect::temporary(&format!("{app_url}/?error=missing_parameters"));
    };

    Redirect::temporary(&format!(
        "{app_url}/auth/callback-complete?code={}&state={}",
        urlencoding::encode(code),
        urlencoding::encode(csrf_state),
    ))
}
