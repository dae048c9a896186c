use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::config::Permission;
use crate::session::{MonitorMode, MonitorStatus, SessionInfo};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{ApiCaller, AppState};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartRequest {
    /// Overrides the configured device identifier for this session.
    #[serde(default)]
    pub identifier: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/session/start",
    request_body = StartRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Session started", body = SessionInfo),
        (status = 409, description = "Session already running", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn start(
    State(state): State<AppState>,
    user: ApiCaller,
    Json(request): Json<StartRequest>,
) -> ApiResult<Json<SessionInfo>> {
    user.require(Permission::Control)?;

    let identifier = request
        .identifier
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let mut monitor = state.monitor.lock().await;
    let info = monitor.start(identifier)?;
    Ok(Json(info))
}

#[utoipa::path(
    post,
    path = "/api/session/stop",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Session stopped", body = MonitorMode),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn stop(
    State(state): State<AppState>,
    user: ApiCaller,
) -> ApiResult<Json<MonitorMode>> {
    user.require(Permission::Control)?;
    let mut monitor = state.monitor.lock().await;
    if monitor.stop().await.is_none() {
        log::debug!("stop requested by {} with no session running", user.name);
    }
    Ok(Json(monitor.status().mode))
}

#[utoipa::path(
    get,
    path = "/api/session/status",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Monitor status", body = MonitorStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn status(
    State(state): State<AppState>,
    user: ApiCaller,
) -> ApiResult<Json<MonitorStatus>> {
    user.require(Permission::ReadStatus)?;
    let monitor = state.monitor.lock().await;
    Ok(Json(monitor.status()))
}
