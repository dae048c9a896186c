//! Fingerprint window.
//!
//! Keeps the last few distinct Wi-Fi snapshots, most recent first, and hands
//! out a [`FingerprintBatch`] every time a new distinct snapshot arrives while
//! the history is full. Repeated identical scans (a stationary device) are
//! dropped without touching the history.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::VecDeque;

use super::types::{FingerprintBatch, SignalSnapshot};

pub const DEFAULT_CAPACITY: usize = 3;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Number of snapshots in a batch.
    pub capacity: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FingerprintWindow {
    capacity: usize,
    history: VecDeque<SignalSnapshot>,
    last_captured_at: Option<DateTime<Utc>>,
}

impl FingerprintWindow {
    /// Capacity is clamped to at least one snapshot.
    pub fn new(config: &FingerprintConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            capacity,
            history: VecDeque::with_capacity(capacity + 1),
            last_captured_at: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.history.len() == self.capacity
    }

    /// The last accepted snapshot, used as the change-detection reference.
    pub fn latest(&self) -> Option<&SignalSnapshot> {
        self.history.front()
    }

    pub fn last_captured_at(&self) -> Option<DateTime<Utc>> {
        self.last_captured_at
    }

    /// Offers a snapshot to the window.
    ///
    /// A snapshot equal to the latest one (same stations, same strengths) is
    /// a no-op. Otherwise it becomes the newest entry, the oldest is evicted
    /// past capacity, and a batch is returned once the history is full.
    pub fn push(
        &mut self,
        snapshot: SignalSnapshot,
        captured_at: DateTime<Utc>,
    ) -> Option<FingerprintBatch> {
        if self.latest() == Some(&snapshot) {
            return None;
        }

        let interval = self.last_captured_at.map(|previous| captured_at - previous);
        self.history.push_front(snapshot);
        self.history.truncate(self.capacity);
        self.last_captured_at = Some(captured_at);

        if !self.is_full() {
            log::debug!(
                "fingerprint window warming up ({}/{})",
                self.history.len(),
                self.capacity
            );
            return None;
        }

        Some(FingerprintBatch::new(
            self.history.iter().cloned().collect(),
            captured_at,
            interval,
        ))
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.last_captured_at = None;
    }
}

impl Default for FingerprintWindow {
    fn default() -> Self {
        Self::new(&FingerprintConfig::default())
    }
}
