use reqwest::{header, Client, RequestBuilder, Url};

use super::error::DispatchError;
use super::payload::{IdentifierPayload, LocationPayload, PatientRegistration};
use crate::config::BackendConfig;
use crate::fingerprint::FingerprintBatch;

/// HTTP client for the care backend.
///
/// One attempt per call; failures are returned, never retried.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, DispatchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn send_emergency(&self, identifier: &str) -> Result<(), DispatchError> {
        let identifier = require_identifier(identifier)?;
        let url = self.endpoint(&["api", "emergency"]);
        log::info!("POST {} for {}", url, identifier);
        self.execute(
            self.client
                .post(url)
                .json(&IdentifierPayload { ssid: identifier }),
        )
        .await
    }

    pub async fn send_nurse_call(&self, identifier: &str) -> Result<(), DispatchError> {
        let identifier = require_identifier(identifier)?;
        let url = self.endpoint(&["api", "nurse-call"]);
        log::info!("POST {} for {}", url, identifier);
        self.execute(
            self.client
                .post(url)
                .json(&IdentifierPayload { ssid: identifier }),
        )
        .await
    }

    pub async fn send_fingerprint(
        &self,
        identifier: &str,
        batch: &FingerprintBatch,
    ) -> Result<(), DispatchError> {
        let identifier = require_identifier(identifier)?;
        let url = self.endpoint(&["api", "patient", identifier]);
        for (i, snapshot) in batch.snapshots().iter().enumerate() {
            log::debug!("location{}: {:?}", i + 1, snapshot);
        }
        self.execute(
            self.client
                .put(url)
                .json(&LocationPayload(batch.snapshots())),
        )
        .await
    }

    pub async fn register_patient(
        &self,
        registration: &PatientRegistration,
    ) -> Result<(), DispatchError> {
        if registration.name.trim().is_empty() {
            return Err(DispatchError::MissingField("name"));
        }
        if registration.birth.trim().is_empty() {
            return Err(DispatchError::MissingField("birth"));
        }
        require_identifier(&registration.ssid)?;
        let url = self.endpoint(&["api", "patient"]);
        log::info!("POST {} for {}", url, registration.name);
        self.execute(self.client.post(url).json(registration)).await
    }

    async fn execute(&self, request: RequestBuilder) -> Result<(), DispatchError> {
        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        log::debug!("backend responded {}: {}", status, body);

        if status.is_success() {
            Ok(())
        } else {
            Err(DispatchError::Server {
                code: status.as_u16(),
                body,
            })
        }
    }
}

fn require_identifier(identifier: &str) -> Result<&str, DispatchError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        Err(DispatchError::EmptyIdentifier)
    } else {
        Ok(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use axum::http::{Method, StatusCode};
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn test_endpoint_joins_segments() {
        let backend = FakeBackend::start(StatusCode::OK).await;
        let client = BackendClient::new(&backend.config()).unwrap();
        let url = client.endpoint(&["api", "patient", "ward 3/bed"]);
        assert_eq!(url.path(), "/api/patient/ward%203%2Fbed");
    }

    #[tokio::test]
    async fn test_emergency_request() {
        let backend = FakeBackend::start(StatusCode::OK).await;
        let client = BackendClient::new(&backend.config()).unwrap();

        client.send_emergency(" 1111 ").await.unwrap();

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].path, "/api/emergency");
        assert_eq!(requests[0].body, json!({"ssid": "1111"}));
    }

    #[tokio::test]
    async fn test_fingerprint_request() {
        let backend = FakeBackend::start(StatusCode::OK).await;
        let client = BackendClient::new(&backend.config()).unwrap();

        let mut window = crate::fingerprint::FingerprintWindow::default();
        let now = Utc::now();
        window.push([("aa", -40)].into_iter().collect(), now);
        window.push([("aa", -41)].into_iter().collect(), now);
        let batch = window.push([("bb", -60)].into_iter().collect(), now).unwrap();

        client.send_fingerprint("1111", &batch).await.unwrap();

        let requests = backend.requests();
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[0].path, "/api/patient/1111");
        assert_eq!(
            requests[0].body,
            json!({
                "location1": {"bb": -60},
                "location2": {"aa": -41},
                "location3": {"aa": -40}
            })
        );
    }

    #[tokio::test]
    async fn test_server_error_carries_code() {
        let backend = FakeBackend::start(StatusCode::SERVICE_UNAVAILABLE).await;
        let client = BackendClient::new(&backend.config()).unwrap();

        let err = client.send_nurse_call("1111").await.unwrap_err();
        assert!(matches!(err, DispatchError::Server { code: 503, .. }));
        assert_eq!(err.error_code(), "503");
        assert_eq!(backend.requests()[0].path, "/api/nurse-call");
    }

    #[tokio::test]
    async fn test_empty_identifier_skips_io() {
        let backend = FakeBackend::start(StatusCode::OK).await;
        let client = BackendClient::new(&backend.config()).unwrap();

        let err = client.send_emergency("   ").await.unwrap_err();
        assert!(matches!(err, DispatchError::EmptyIdentifier));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let config = FakeBackend::unreachable_config().await;
        let client = BackendClient::new(&config).unwrap();

        let err = client.send_emergency("1111").await.unwrap_err();
        assert!(matches!(err, DispatchError::Network(_)));
        assert_eq!(err.error_code(), "NETWORK_ERROR");
    }

    #[tokio::test]
    async fn test_registration_validates_fields() {
        let backend = FakeBackend::start(StatusCode::CREATED).await;
        let client = BackendClient::new(&backend.config()).unwrap();

        let mut registration = PatientRegistration {
            name: "Kim".into(),
            birth: "".into(),
            ssid: "1111".into(),
        };
        assert!(matches!(
            client.register_patient(&registration).await,
            Err(DispatchError::MissingField("birth"))
        ));

        registration.birth = "1950-04-02".into();
        client.register_patient(&registration).await.unwrap();
        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/api/patient");
        assert_eq!(
            requests[0].body,
            json!({"name": "Kim", "birth": "1950-04-02", "ssid": "1111"})
        );
    }
}
