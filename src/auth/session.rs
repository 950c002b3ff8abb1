//! Authentication session and callback state machine.
//!
//! `AuthSession` is an explicit value object: the one-shot `state` and
//! `code_verifier` of the current attempt, an optional pending application
//! context to resume after the redirect, and the issued tokens. Persistence
//! is an injectable port so tests run against memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::oauth::{provider_error_message, OAuthClient, TokenResponse};
use super::pkce;
use crate::config::Config;
use crate::error::RelayError;

/// Tokens issued by the provider, with a locally computed expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// State of one authentication attempt.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    /// CSRF token, single-use.
    pub state: Option<String>,
    /// PKCE verifier, single-use, never leaves the relay except in the
    /// final token exchange.
    pub code_verifier: Option<String>,
    /// Application context to resume after sign-in (opaque to the relay).
    pub pending_context: Option<String>,
    /// Tokens from the last successful exchange.
    pub tokens: Option<TokenSet>,
}

/// Persistence port for the session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> AuthSession;
    async fn save(&self, session: AuthSession);
}

/// In-memory store; the production deployment scopes one per browser session.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<AuthSession>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> AuthSession {
        self.inner.read().await.clone()
    }

    async fn save(&self, session: AuthSession) {
        *self.inner.write().await = session;
    }
}

/// Seam over the server-side token exchange.
#[async_trait]
pub trait CodeExchanger: Send + Sync {
    async fn exchange(&self, code: &str, code_verifier: &str)
        -> Result<TokenResponse, RelayError>;
}

#[async_trait]
impl CodeExchanger for OAuthClient {
    async fn exchange(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, RelayError> {
        self.exchange_code(code, code_verifier).await
    }
}

/// Query parameters the provider sends back to the callback.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Validate a callback against the stored attempt artifacts.
///
/// Order matters: provider error first, then CSRF, then missing code, then
/// missing verifier. A CSRF mismatch must fail before any exchange happens.
/// A missing stored state is tolerated (fresh storage, different tab); only
/// a present-but-different one is a hard failure.
fn validate_callback(
    params: &CallbackParams,
    stored_state: Option<&str>,
    stored_verifier: Option<&str>,
) -> Result<(), RelayError> {
    if let Some(code) = params.error.as_deref() {
        return Err(RelayError::AuthProvider(provider_error_message(code)));
    }
    if let (Some(stored), Some(returned)) = (stored_state, params.state.as_deref()) {
        if stored != returned {
            return Err(RelayError::Csrf);
        }
    }
    match params.code.as_deref() {
        None | Some("") => return Err(RelayError::MissingCode),
        Some(_) => {}
    }
    if stored_verifier.is_none() {
        return Err(RelayError::MissingVerifier);
    }
    Ok(())
}

/// Drives one PKCE authorization attempt from start to token persistence.
pub struct Authenticator<S: SessionStore> {
    store: S,
    exchanger: Arc<dyn CodeExchanger>,
    auth_base_url: String,
    client_id: String,
    redirect_uri: String,
}

impl<S: SessionStore> Authenticator<S> {
    pub fn new(store: S, exchanger: Arc<dyn CodeExchanger>, config: &Config) -> Self {
        Self {
            store,
            exchanger,
            auth_base_url: config.auth_base_url.clone(),
            client_id: config.oauth_client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    /// Start an authorization attempt: generate and persist the one-shot
    /// artifacts, remember the pending context, and return the redirect URL.
    pub async fn begin_auth(&self, pending_context: Option<String>) -> String {
        let state = pkce::generate_state();
        let verifier = pkce::generate_code_verifier();
        let challenge = pkce::code_challenge(&verifier);

        let mut session = self.store.load().await;
        session.state = Some(state.clone());
        session.code_verifier = Some(verifier);
        if pending_context.is_some() {
            session.pending_context = pending_context;
        }
        self.store.save(session).await;

        pkce::authorization_url(
            &self.auth_base_url,
            &self.client_id,
            &self.redirect_uri,
            &state,
            &challenge,
        )
    }

    /// Complete the attempt from the provider callback.
    ///
    /// The one-shot artifacts are consumed before anything else happens, so
    /// they are gone regardless of the outcome.
    pub async fn complete_auth(&self, params: CallbackParams) -> Result<TokenSet, RelayError> {
        let mut session = self.store.load().await;
        let stored_state = session.state.take();
        let stored_verifier = session.code_verifier.take();
        self.store.save(session).await;

        validate_callback(&params, stored_state.as_deref(), stored_verifier.as_deref())?;

        // Both unwraps are guarded by validate_callback above.
        let code = params.code.as_deref().unwrap_or_default();
        let verifier = stored_verifier.unwrap_or_default();

        let reply = self.exchanger.exchange(code, &verifier).await?;

        let tokens = TokenSet {
            access_token: reply.access_token,
            refresh_token: reply.refresh_token,
            expires_at: reply
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        };

        let mut session = self.store.load().await;
        session.tokens = Some(tokens.clone());
        self.store.save(session).await;

        tracing::info!("authorization attempt completed");
        Ok(tokens)
    }

    /// Take the pending context stored at `begin_auth`, consuming it.
    pub async fn take_pending_context(&self) -> Option<String> {
        let mut session = self.store.load().await;
        let pending = session.pending_context.take();
        self.store.save(session).await;
        pending
    }

    /// Clear every persisted artifact. No remote revocation is performed.
    pub async fn logout(&self) {
        self.store.save(AuthSession::default()).await;
    }

    pub async fn tokens(&self) -> Option<TokenSet> {
        self.store.load().await.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            dev_mode: true,
            research_api_url: "http://unused".to_string(),
            research_api_key: "k".to_string(),
            research_model: "fast".to_string(),
            auth_base_url: "https://auth.example.com".to_string(),
            platform_url: "https://platform.example.com".to_string(),
            oauth_client_id: "client-1".to_string(),
            oauth_client_secret: Some("secret".to_string()),
            redirect_uri: "http://localhost:3000/api/auth/callback".to_string(),
            app_url: "http://localhost:3000".to_string(),
            poll_interval: std::time::Duration::from_secs(10),
            chromium_bin: "chromium".to_string(),
            pdf_timeout: std::time::Duration::from_secs(30),
        }
    }

    /// Counts exchange calls and returns a fixed token set.
    struct StubExchanger {
        calls: AtomicUsize,
    }

    impl StubExchanger {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CodeExchanger for StubExchanger {
        async fn exchange(
            &self,
            _code: &str,
            _code_verifier: &str,
        ) -> Result<TokenResponse, RelayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TokenResponse {
                access_token: "token-1".to_string(),
                refresh_token: Some("refresh-1".to_string()),
                expires_in: Some(3600),
                token_type: Some("Bearer".to_string()),
            })
        }
    }

    fn authenticator(
        exchanger: Arc<StubExchanger>,
    ) -> Authenticator<MemorySessionStore> {
        Authenticator::new(
            MemorySessionStore::default(),
            exchanger,
            &test_config(),
        )
    }

    #[tokio::test]
    async fn happy_path_round_trip() {
        let exchanger = StubExchanger::new();
        let auth = authenticator(exchanger.clone());

        let url = auth.begin_auth(Some("acme earnings call".to_string())).await;
        assert!(url.contains("code_challenge="));

        // Pull the state the authenticator stored so the callback matches.
        let stored_state = auth.store.load().await.state.clone().unwrap();
        let verifier = auth.store.load().await.code_verifier.clone().unwrap();
        assert!(url.contains(&urlencoding::encode(&pkce::code_challenge(&verifier)).to_string()));

        let tokens = auth
            .complete_auth(CallbackParams {
                code: Some("xyz".to_string()),
                state: Some(stored_state),
                error: None,
            })
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "token-1");
        assert!(tokens.expires_at.unwrap() > Utc::now());
        assert_eq!(exchanger.calls(), 1);

        // One-shot artifacts are consumed, tokens and context persist.
        let session = auth.store.load().await;
        assert!(session.state.is_none());
        assert!(session.code_verifier.is_none());
        assert!(session.tokens.is_some());
        assert_eq!(
            auth.take_pending_context().await.as_deref(),
            Some("acme earnings call")
        );
        assert_eq!(auth.take_pending_context().await, None);
    }

    #[tokio::test]
    async fn state_mismatch_fails_without_exchange() {
        let exchanger = StubExchanger::new();
        let auth = authenticator(exchanger.clone());
        auth.begin_auth(None).await;

        let err = auth
            .complete_auth(CallbackParams {
                code: Some("xyz".to_string()),
                state: Some("S2-not-what-we-stored".to_string()),
                error: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Csrf));
        assert_eq!(exchanger.calls(), 0);

        // Artifacts were still consumed.
        let session = auth.store.load().await;
        assert!(session.state.is_none());
        assert!(session.code_verifier.is_none());
    }

    #[tokio::test]
    async fn provider_error_maps_to_fixed_message() {
        let exchanger = StubExchanger::new();
        let auth = authenticator(exchanger.clone());
        auth.begin_auth(None).await;

        let err = auth
            .complete_auth(CallbackParams {
                error: Some("access_denied".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        match err {
            RelayError::AuthProvider(msg) => {
                assert_eq!(msg, "Access denied. You cancelled the authorization.");
            }
            other => panic!("expected AuthProvider, got {other:?}"),
        }
        assert_eq!(exchanger.calls(), 0);
    }

    #[tokio::test]
    async fn missing_code_and_missing_verifier() {
        let exchanger = StubExchanger::new();
        let auth = authenticator(exchanger.clone());
        auth.begin_auth(None).await;
        let stored_state = auth.store.load().await.state.clone().unwrap();

        let err = auth
            .complete_auth(CallbackParams {
                code: None,
                state: Some(stored_state),
                error: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingCode));

        // Verifier was consumed by the failed attempt; a replay with a code
        // now fails on the missing verifier.
        let err = auth
            .complete_auth(CallbackParams {
                code: Some("xyz".to_string()),
                state: None,
                error: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingVerifier));
        assert_eq!(exchanger.calls(), 0);
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let exchanger = StubExchanger::new();
        let auth = authenticator(exchanger.clone());
        auth.begin_auth(Some("ctx".to_string())).await;
        auth.logout().await;

        let session = auth.store.load().await;
        assert!(session.state.is_none());
        assert!(session.code_verifier.is_none());
        assert!(session.pending_context.is_none());
        assert!(session.tokens.is_none());
        assert!(auth.tokens().await.is_none());
    }
}
