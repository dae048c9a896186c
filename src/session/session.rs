use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{SensorInput, SessionCounters, SessionEvent, SessionInfo};
use crate::detector::{DetectorConfig, FallClassifier};
use crate::fingerprint::{FingerprintConfig, FingerprintWindow, ScanResult};

/// One detection session: a classifier and a fingerprint window that live
/// from a start command to the matching stop. Dropping the session discards
/// all of its state.
#[derive(Debug)]
pub struct Session {
    info: SessionInfo,
    classifier: FallClassifier,
    window: FingerprintWindow,
    counters: SessionCounters,
}

impl Session {
    pub fn new(
        identifier: impl Into<String>,
        detection: DetectorConfig,
        fingerprint: &FingerprintConfig,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            info: SessionInfo {
                id: Uuid::new_v4(),
                identifier: identifier.into(),
                started_at,
            },
            classifier: FallClassifier::new(detection),
            window: FingerprintWindow::new(fingerprint),
            counters: SessionCounters::default(),
        }
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn counters(&self) -> &SessionCounters {
        &self.counters
    }

    pub fn handle(&mut self, input: SensorInput) -> Option<SessionEvent> {
        match input {
            SensorInput::Motion(sample) => {
                self.counters.motion_samples += 1;
                let event = self.classifier.process(&sample)?;
                self.counters.falls += 1;
                self.counters.last_fall_at = Some(event.detected_at);
                log::warn!(
                    "session {}: fall detected at {} (magnitude {:.1}, gyro interval {} ms)",
                    self.info.id,
                    event.detected_at,
                    event.magnitude,
                    self.classifier
                        .last_interval()
                        .map_or(0, |d| d.num_milliseconds())
                );
                Some(SessionEvent::Fall(event))
            }
            SensorInput::Scan(scan) => self.handle_scan(scan),
        }
    }

    fn handle_scan(&mut self, scan: ScanResult) -> Option<SessionEvent> {
        self.counters.scans += 1;
        if scan.snapshot.is_empty() || self.window.latest() == Some(&scan.snapshot) {
            self.counters.ignored_scans += 1;
            return None;
        }

        let stations = scan.snapshot.len();
        let batch = self.window.push(scan.snapshot, scan.captured_at)?;
        self.counters.batches += 1;
        self.counters.last_batch_at = Some(batch.captured_at);
        log::info!(
            "session {}: fingerprint batch ready ({} stations, scan interval {} ms)",
            self.info.id,
            stations,
            batch.interval.map_or(0, |d| d.num_milliseconds())
        );
        Some(SessionEvent::Fingerprint(batch))
    }

    /// Feeds inputs in order and collects every event they produce.
    pub fn replay<I>(&mut self, inputs: I) -> Vec<SessionEvent>
    where
        I: IntoIterator<Item = SensorInput>,
    {
        inputs.into_iter().filter_map(|i| self.handle(i)).collect()
    }
}
