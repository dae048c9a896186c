use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::detector::{FallEvent, MotionSample};
use crate::fingerprint::{FingerprintBatch, ScanResult};

/// Anything a sample source can hand to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorInput {
    Motion(MotionSample),
    Scan(ScanResult),
}

impl SensorInput {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            SensorInput::Motion(sample) => sample.timestamp,
            SensorInput::Scan(scan) => scan.captured_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Fall(FallEvent),
    Fingerprint(FingerprintBatch),
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct SessionInfo {
    pub id: Uuid,
    pub identifier: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, utoipa::ToSchema)]
pub struct SessionCounters {
    pub motion_samples: u64,
    pub scans: u64,
    /// Empty scans and scans identical to the previous one.
    pub ignored_scans: u64,
    pub falls: u64,
    pub batches: u64,
    pub last_fall_at: Option<DateTime<Utc>>,
    pub last_batch_at: Option<DateTime<Utc>>,
}
