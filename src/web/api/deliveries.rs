use axum::{extract::State, Json};

use crate::config::Permission;
use crate::dispatch::DeliveryReport;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{ApiCaller, AppState};

#[utoipa::path(
    get,
    path = "/api/deliveries",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Delivery outcomes", body = DeliveryReport),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "assist"
)]
pub async fn list(
    State(state): State<AppState>,
    user: ApiCaller,
) -> ApiResult<Json<DeliveryReport>> {
    user.require(Permission::ReadStatus)?;
    Ok(Json(state.board.report()))
}
