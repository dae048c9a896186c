use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::assist::{NurseCallRequest, NurseCallResponse};
use super::api::error::ErrorResponse;
use super::api::samples::{SampleRequest, SubmitResponse};
use super::api::session::StartRequest;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::session::start,
        super::api::session::stop,
        super::api::session::status,
        super::api::samples::submit,
        super::api::assist::nurse_call,
        super::api::deliveries::list,
    ),
    components(
        schemas(
            StartRequest,
            SampleRequest,
            SubmitResponse,
            NurseCallRequest,
            NurseCallResponse,
            ErrorResponse,
            crate::session::SessionInfo,
            crate::session::SessionCounters,
            crate::session::MonitorMode,
            crate::session::MonitorStatus,
            crate::dispatch::DeliveryKind,
            crate::dispatch::DeliveryStatus,
            crate::dispatch::DeliveryReport,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Fall-O-Mat API",
        description = "Sensor ingest, session control and alert delivery status",
        version = "0.1.0"
    ),
    tags(
        (name = "session", description = "Detection sessions and sensor ingest"),
        (name = "assist", description = "Nurse calls and backend deliveries")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
