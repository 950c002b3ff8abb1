//! HTTP router and server bootstrap.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{auth, pdf, research};
use super::types::HealthResponse;
use crate::auth::OAuthClient;
use crate::config::Config;
use crate::pdf::PdfRenderer;
use crate::research::{AnswerClient, DeepResearchClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Deep-research task client.
    pub research: Arc<DeepResearchClient>,
    /// Structured answer client (meeting briefs).
    pub answer: AnswerClient,
    /// OAuth authorization server client.
    pub oauth: OAuthClient,
    /// Headless-Chromium PDF renderer.
    pub pdf: PdfRenderer,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let research = Arc::new(DeepResearchClient::new(
            config.research_api_url.clone(),
            config.research_api_key.clone(),
            config.research_model.clone(),
        ));
        let answer = AnswerClient::new(
            config.research_api_url.clone(),
            config.research_api_key.clone(),
        );
        let oauth = OAuthClient::new(&config);
        let pdf = PdfRenderer::new(config.chromium_bin.clone(), config.pdf_timeout);

        Self {
            config,
            research,
            answer,
            oauth,
            pdf,
        }
    }
}

/// Build the relay router over the given state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/research-task", post(research::create_research))
        .route("/api/research-task/status", get(research::research_status))
        .route("/api/research-task/cancel", post(research::cancel_research))
        .route("/api/research-task/stream", get(research::stream_research))
        .route("/api/meeting-brief", post(research::meeting_brief))
        .route("/api/auth/token", post(auth::exchange_token))
        .route("/api/auth/user", get(auth::user_info))
        .route("/api/auth/callback", get(auth::callback))
        .route("/api/generate-pdf", post(pdf::generate_pdf))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and block until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Relay listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dev_mode: state.config.dev_mode,
    })
}
