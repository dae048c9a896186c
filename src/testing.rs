//! In-process stand-in for the care backend, used by the async tests.

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::Router;
use reqwest::Url;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::BackendConfig;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Value,
}

#[derive(Clone)]
struct BackendState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    status: StatusCode,
}

pub struct FakeBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeBackend {
    /// Serves every request with `status`, recording it.
    pub async fn start(status: StatusCode) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = BackendState {
            requests: requests.clone(),
            status,
        };
        let app = Router::new().fallback(record).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, requests }
    }

    pub fn config(&self) -> BackendConfig {
        BackendConfig {
            base_url: Url::parse(&format!("http://{}/", self.addr)).unwrap(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Points at a port nothing listens on.
    pub async fn unreachable_config() -> BackendConfig {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        BackendConfig {
            base_url: Url::parse(&format!("http://{}/", addr)).unwrap(),
            timeout: Duration::from_secs(2),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Polls until at least `count` requests arrived or two seconds passed.
    pub async fn wait_for(&self, count: usize) -> Vec<RecordedRequest> {
        for _ in 0..200 {
            let requests = self.requests();
            if requests.len() >= count {
                return requests;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.requests()
    }
}

async fn record(
    State(state): State<BackendState>,
    method: Method,
    uri: Uri,
    body: String,
) -> (StatusCode, String) {
    let body = serde_json::from_str(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        body,
    });
    let reply = if state.status.is_success() {
        "{}"
    } else {
        "backend unavailable"
    };
    (state.status, reply.to_string())
}
