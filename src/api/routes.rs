//! HTTP route handlers.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::github::GitHubClient;
use crate::llm::GeminiClient;
use crate::publish::{HttpNotifier, PublishSettings, Publisher};
use crate::task::TaskBrief;

use super::auth;
use super::error::ApiError;
use super::files;
use super::types::{HealthResponse, TaskResponse};
use super::view;

/// Shared application state.
pub struct AppState {
    pub publisher: Publisher,
    /// Secret every brief must carry.
    pub shared_secret: Option<String>,
}

impl AppState {
    pub fn data_dir(&self) -> &Path {
        &self.publisher.settings().data_dir
    }
}

/// Build the router over an existing state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/api/health", get(health))
        .route("/task", post(submit_task))
        .route("/files/:task/:name", get(files::serve_file))
        .route("/view/:task", get(view::view_task))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let generator = Arc::new(GeminiClient::new(&config.gemini));
    let host = Arc::new(GitHubClient::new(&config.github));
    let notifier = Arc::new(HttpNotifier::new(config.evaluation_timeout)?);

    tokio::fs::create_dir_all(&config.data_dir).await?;
    let publisher = Publisher::new(
        generator,
        host,
        notifier,
        PublishSettings {
            owner: config.github.owner.clone(),
            branch: config.github.branch.clone(),
            data_dir: config.data_dir.clone(),
        },
    );

    let state = Arc::new(AppState {
        publisher,
        shared_secret: config.shared_secret.clone(),
    });
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        model = %config.gemini.model,
        owner = %config.github.owner,
        data_dir = %config.data_dir.display(),
        "Server listening on {}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolve on SIGTERM/SIGINT. In-flight requests finish before exit.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Liveness string.
async fn liveness() -> &'static str {
    "API is running!"
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Accept a task brief and publish it.
///
/// The secret is checked on the raw JSON before the brief is validated, so an
/// unauthenticated caller learns nothing about the expected shape.
async fn submit_task(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TaskResponse>, ApiError> {
    let raw: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Rejected task: body is not JSON: {}", e);
        ApiError::InvalidJson
    })?;
    if raw.as_object().map_or(true, |o| o.is_empty()) {
        tracing::warn!("Rejected task: body is not a JSON object");
        return Err(ApiError::InvalidJson);
    }

    if !auth::secret_matches(&raw, state.shared_secret.as_deref()) {
        tracing::warn!("Unauthorized: secret mismatch");
        return Err(ApiError::Unauthorized);
    }

    let brief: TaskBrief = serde_json::from_value(raw.clone()).map_err(|e| {
        tracing::warn!("Rejected task: {}", e);
        ApiError::Validation(e.to_string())
    })?;

    tracing::info!(
        task = %brief.task,
        round = brief.round,
        checks = brief.checks.len(),
        attachments = brief.attachments.len(),
        "Secret verified, processing task"
    );

    let result = state.publisher.publish(&brief, &raw).await?;
    Ok(Json(TaskResponse::from(&result)))
}
