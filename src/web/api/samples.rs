use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Permission;
use crate::detector::MotionSample;
use crate::fingerprint::{ScanResult, SignalSnapshot};
use crate::session::SensorInput;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{ApiCaller, AppState};

/// One sensor reading as posted by a device. Readings without a timestamp
/// are stamped on arrival.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampleRequest {
    Accelerometer {
        x: f32,
        y: f32,
        z: f32,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    Gyroscope {
        x: f32,
        y: f32,
        z: f32,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    Scan {
        stations: SignalSnapshot,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
}

impl SampleRequest {
    pub fn into_input(self, now: DateTime<Utc>) -> SensorInput {
        match self {
            SampleRequest::Accelerometer { x, y, z, timestamp } => SensorInput::Motion(
                MotionSample::accelerometer(x, y, z, timestamp.unwrap_or(now)),
            ),
            SampleRequest::Gyroscope { x, y, z, timestamp } => {
                SensorInput::Motion(MotionSample::gyroscope(x, y, z, timestamp.unwrap_or(now)))
            }
            SampleRequest::Scan {
                stations,
                timestamp,
            } => SensorInput::Scan(ScanResult {
                snapshot: stations,
                captured_at: timestamp.unwrap_or(now),
            }),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            SampleRequest::Accelerometer { x, y, z, .. }
            | SampleRequest::Gyroscope { x, y, z, .. } => {
                if [x, y, z].iter().all(|v| v.is_finite()) {
                    Ok(())
                } else {
                    Err("motion axes must be finite".into())
                }
            }
            SampleRequest::Scan { .. } => Ok(()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub accepted: usize,
}

#[utoipa::path(
    post,
    path = "/api/samples",
    request_body = Vec<SampleRequest>,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Samples queued", body = SubmitResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "No session running", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn submit(
    State(state): State<AppState>,
    user: ApiCaller,
    Json(samples): Json<Vec<SampleRequest>>,
) -> ApiResult<Json<SubmitResponse>> {
    user.require(Permission::Ingest)?;

    for (i, sample) in samples.iter().enumerate() {
        sample
            .validate()
            .map_err(|e| ApiError::Validation(format!("sample {}: {}", i, e)))?;
    }

    let now = Utc::now();
    let inputs = samples.into_iter().map(|s| s.into_input(now));

    let monitor = state.monitor.lock().await;
    let accepted = monitor.submit(inputs).await?;
    Ok(Json(SubmitResponse { accepted }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sample_request_parsing() {
        let json = r#"[
            {"kind": "accelerometer", "x": 0.1, "y": 0.2, "z": 9.8},
            {"kind": "gyroscope", "x": 0, "y": 0, "z": 1, "timestamp": "2026-01-12T10:00:00Z"},
            {"kind": "scan", "stations": {"aa:bb": -40}}
        ]"#;
        let samples: Vec<SampleRequest> = serde_json::from_str(json).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 12, 11, 0, 0).unwrap();
        let inputs: Vec<SensorInput> = samples.into_iter().map(|s| s.into_input(now)).collect();

        assert_eq!(inputs[0].timestamp(), now);
        assert_eq!(
            inputs[1].timestamp(),
            Utc.with_ymd_and_hms(2026, 1, 12, 10, 0, 0).unwrap()
        );
        let SensorInput::Scan(scan) = &inputs[2] else {
            panic!("expected scan");
        };
        assert_eq!(scan.snapshot.strength("aa:bb"), Some(-40));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let json = r#"[{"kind": "barometer", "x": 0, "y": 0, "z": 0}]"#;
        assert!(serde_json::from_str::<Vec<SampleRequest>>(json).is_err());
    }
}
