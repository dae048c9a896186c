use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
}

/// One 3-axis reading from either motion sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub kind: SensorKind,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub timestamp: DateTime<Utc>,
}

impl MotionSample {
    pub fn accelerometer(x: f32, y: f32, z: f32, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: SensorKind::Accelerometer,
            x,
            y,
            z,
            timestamp,
        }
    }

    pub fn gyroscope(x: f32, y: f32, z: f32, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: SensorKind::Gyroscope,
            x,
            y,
            z,
            timestamp,
        }
    }
}

/// Probable fall, raised on the gyroscope sample that confirmed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct FallEvent {
    pub detected_at: DateTime<Utc>,
    /// Acceleration magnitude (gravity removed) held at decision time.
    pub magnitude: f32,
    /// Largest per-axis angular delta of the confirming sample.
    pub angular_delta: f32,
}
