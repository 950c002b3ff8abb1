//! Relay configuration.
//!
//! Everything is driven by environment variables, with defaults suitable for
//! local development. Only the research API key is mandatory; the OAuth
//! client secret may be omitted when the sign-in flow is not used.

use anyhow::Context;
use std::time::Duration;

/// Runtime configuration for the relay.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Dev mode relaxes nothing security-wise here, but is reported by the
    /// health endpoint and controls log verbosity defaults.
    pub dev_mode: bool,

    /// Base URL of the deep-research vendor API.
    pub research_api_url: String,
    /// API key for the research API.
    pub research_api_key: String,
    /// Research model tier: "fast", "standard" or "heavy".
    pub research_model: String,

    /// Base URL of the vendor OAuth authorization server.
    pub auth_base_url: String,
    /// Base URL of the vendor platform (userinfo endpoint lives here).
    pub platform_url: String,
    /// OAuth client id (public).
    pub oauth_client_id: String,
    /// OAuth client secret (confidential, server-side only).
    pub oauth_client_secret: Option<String>,
    /// Redirect URI registered with the provider; points at this relay's
    /// `/api/auth/callback`.
    pub redirect_uri: String,
    /// Public base URL of the front-end application; callback results are
    /// redirected here.
    pub app_url: String,

    /// Interval between status polls for one task.
    pub poll_interval: Duration,

    /// Headless Chromium binary used for PDF printing.
    pub chromium_bin: String,
    /// Hard budget for one PDF render.
    pub pdf_timeout: Duration,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let research_api_key = std::env::var("RESEARCH_API_KEY")
            .context("RESEARCH_API_KEY must be set")?;

        let port = env_or("PORT", "3000")
            .parse::<u16>()
            .context("PORT must be a number")?;

        let poll_interval_secs = env_or("POLL_INTERVAL_SECS", "10")
            .parse::<u64>()
            .context("POLL_INTERVAL_SECS must be a number")?;

        let pdf_timeout_secs = env_or("PDF_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .context("PDF_TIMEOUT_SECS must be a number")?;

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port,
            dev_mode: env_or("DEV_MODE", "false") == "true",
            research_api_url: env_or("RESEARCH_API_URL", "https://api.valyu.network"),
            research_api_key,
            research_model: env_or("RESEARCH_MODEL", "fast"),
            auth_base_url: env_or("AUTH_BASE_URL", "https://auth.valyu.network"),
            platform_url: env_or("PLATFORM_URL", "https://platform.valyu.network"),
            oauth_client_id: env_or("OAUTH_CLIENT_ID", ""),
            oauth_client_secret: std::env::var("OAUTH_CLIENT_SECRET").ok(),
            redirect_uri: env_or(
                "OAUTH_REDIRECT_URI",
                "http://localhost:3000/api/auth/callback",
            ),
            app_url: env_or("APP_URL", "http://localhost:3000"),
            poll_interval: Duration::from_secs(poll_interval_secs),
            chromium_bin: env_or("CHROMIUM_BIN", "chromium"),
            pdf_timeout: Duration::from_secs(pdf_timeout_secs),
        })
    }
}
