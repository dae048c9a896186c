use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::config::{Config, Permission};
use crate::dispatch::{Alert, StatusBoard};
use crate::session::Monitor;
use crate::web::api::error::ErrorResponse;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub monitor: Arc<Mutex<Monitor>>,
    pub alerts: mpsc::Sender<Alert>,
    pub board: StatusBoard,
}

/// Caller identified by a configured API key.
#[derive(Debug, Clone)]
pub struct ApiCaller {
    pub name: String,
    permissions: HashSet<Permission>,
}

impl ApiCaller {
    pub fn require(&self, permission: Permission) -> Result<(), PermissionDenied> {
        if self.permissions.contains(&permission) {
            return Ok(());
        }
        log::warn!("{} denied: missing {:?}", self.name, permission);
        Err(PermissionDenied(permission))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingKey,
    MalformedHeader,
    UnknownKey,
}

impl AuthRejection {
    pub fn code(self) -> &'static str {
        match self {
            AuthRejection::MissingKey => "missing_api_key",
            AuthRejection::MalformedHeader => "invalid_auth_format",
            AuthRejection::UnknownKey => "invalid_api_key",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(self.code()))).into_response()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PermissionDenied(pub Permission);

impl IntoResponse for PermissionDenied {
    fn into_response(self) -> Response {
        let needed = format!("requires the {:?} permission", self.0);
        (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::with_message("insufficient_permission", &needed)),
        )
            .into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthRejection> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthRejection::MissingKey)?;
    let value = value.to_str().map_err(|_| AuthRejection::MalformedHeader)?;
    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthRejection::MalformedHeader)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthRejection::MalformedHeader);
    }
    Ok(token)
}

impl FromRequestParts<AppState> for ApiCaller {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let key = state
            .config
            .find_api_key(token)
            .ok_or(AuthRejection::UnknownKey)?;

        log::debug!("request from {}", key.name);
        Ok(ApiCaller {
            name: key.name.clone(),
            permissions: key.permissions.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(&headers("bearer  abc ")), Ok("abc"));
        assert_eq!(
            bearer_token(&headers("Basic abc")),
            Err(AuthRejection::MalformedHeader)
        );
        assert_eq!(
            bearer_token(&headers("Bearer ")),
            Err(AuthRejection::MalformedHeader)
        );
        assert_eq!(
            bearer_token(&HeaderMap::new()),
            Err(AuthRejection::MissingKey)
        );
    }

    #[test]
    fn test_require_permission() {
        let caller = ApiCaller {
            name: "dashboard".into(),
            permissions: [Permission::ReadStatus].into_iter().collect(),
        };
        assert!(caller.require(Permission::ReadStatus).is_ok());
        assert!(matches!(
            caller.require(Permission::Control),
            Err(PermissionDenied(Permission::Control))
        ));
    }
}
