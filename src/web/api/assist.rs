use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Permission;
use crate::dispatch::Alert;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{ApiCaller, AppState};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NurseCallRequest {
    #[serde(default)]
    pub identifier: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NurseCallResponse {
    pub identifier: String,
}

#[utoipa::path(
    post,
    path = "/api/nurse-call",
    request_body = NurseCallRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 202, description = "Nurse call queued", body = NurseCallResponse),
        (status = 400, description = "No identifier available", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "assist"
)]
pub async fn nurse_call(
    State(state): State<AppState>,
    user: ApiCaller,
    Json(request): Json<NurseCallRequest>,
) -> ApiResult<(StatusCode, Json<NurseCallResponse>)> {
    user.require(Permission::Ingest)?;

    // Explicit identifier, then the running session's, then the device default.
    let identifier = match request.identifier.filter(|s| !s.trim().is_empty()) {
        Some(identifier) => identifier,
        None => {
            let monitor = state.monitor.lock().await;
            let resolved = match monitor.session() {
                Some(info) => info.identifier.clone(),
                None => monitor.default_identifier().to_string(),
            };
            resolved
        }
    };
    let identifier = identifier.trim().to_string();
    if identifier.is_empty() {
        return Err(ApiError::Validation("no identifier configured".into()));
    }

    state
        .alerts
        .send(Alert::NurseCall {
            identifier: identifier.clone(),
        })
        .await
        .map_err(|_| ApiError::Unavailable("dispatcher_stopped"))?;

    log::info!("nurse call for {} queued by {}", identifier, user.name);
    Ok((StatusCode::ACCEPTED, Json(NurseCallResponse { identifier })))
}
