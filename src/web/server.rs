use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::dispatch::{AlertDispatcher, BackendClient, DispatchError, LogFeedback, StatusBoard};
use crate::session::Monitor;

use super::api::assist as assist_handlers;
use super::api::deliveries as delivery_handlers;
use super::api::samples as sample_handlers;
use super::api::session as session_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend client: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Wires the monitor to a running dispatcher. Must be called from within
/// the tokio runtime.
pub fn build_state(config: Config) -> Result<AppState, ServerError> {
    let client = BackendClient::new(&config.backend)?;
    let board = StatusBoard::new();
    let (alerts, alert_rx) = mpsc::channel(config.web.queue_depth);
    AlertDispatcher::new(client, board.clone(), Arc::new(LogFeedback)).spawn(alert_rx);

    let monitor = Monitor::new(
        config.detection.clone(),
        config.fingerprint.clone(),
        config.device.identifier.clone(),
        config.web.queue_depth,
        alerts.clone(),
    );

    Ok(AppState {
        config: Arc::new(config),
        monitor: Arc::new(Mutex::new(monitor)),
        alerts,
        board,
    })
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Session API endpoints
        .route("/api/session/start", post(session_handlers::start))
        .route("/api/session/stop", post(session_handlers::stop))
        .route("/api/session/status", get(session_handlers::status))
        .route("/api/samples", post(sample_handlers::submit))
        // Assistance endpoints
        .route("/api/nurse-call", post(assist_handlers::nurse_call))
        .route("/api/deliveries", get(delivery_handlers::list))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let bind_addr = config.web.bind.clone();
    let state = build_state(config)?;
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
