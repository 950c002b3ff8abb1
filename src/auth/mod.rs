//! OAuth2 Authorization Code flow with PKCE.
//!
//! No client secret ever reaches the browser: the relay performs the token
//! exchange server-side. The one-shot `state` and `code_verifier` artifacts
//! live in a session port for exactly one authorization attempt.

pub mod oauth;
pub mod pkce;
pub mod session;

pub use oauth::{provider_error_message, OAuthClient, TokenResponse};
pub use session::{
    AuthSession, Authenticator, CallbackParams, CodeExchanger, MemorySessionStore, SessionStore,
    TokenSet,
};
