use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Station identifier (BSSID) to signal strength (dBm) for one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct SignalSnapshot(BTreeMap<String, i32>);

impl SignalSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strength(&self, station: &str) -> Option<i32> {
        self.0.get(station).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i32)> for SignalSnapshot {
    fn from_iter<I: IntoIterator<Item = (S, i32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A snapshot together with the instant its scan completed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub snapshot: SignalSnapshot,
    pub captured_at: DateTime<Utc>,
}

/// A full window of snapshots, most recent first.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintBatch {
    snapshots: Vec<SignalSnapshot>,
    pub captured_at: DateTime<Utc>,
    /// Time since the previously accepted scan.
    pub interval: Option<Duration>,
}

impl FingerprintBatch {
    pub(super) fn new(
        snapshots: Vec<SignalSnapshot>,
        captured_at: DateTime<Utc>,
        interval: Option<Duration>,
    ) -> Self {
        Self {
            snapshots,
            captured_at,
            interval,
        }
    }

    pub fn snapshots(&self) -> &[SignalSnapshot] {
        &self.snapshots
    }

    pub fn current(&self) -> Option<&SignalSnapshot> {
        self.snapshots.first()
    }

    pub fn previous(&self) -> Option<&SignalSnapshot> {
        self.snapshots.get(1)
    }

    pub fn previous_previous(&self) -> Option<&SignalSnapshot> {
        self.snapshots.get(2)
    }
}
