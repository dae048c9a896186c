//! Fall classifier.
//!
//! Fuses the accelerometer and gyroscope streams into a fall/no-fall
//! decision. The accelerometer side only keeps the latest magnitude; every
//! gyroscope sample after the first compares its per-axis change against the
//! previous reading and, if the held magnitude is also above threshold,
//! raises a [`FallEvent`].
//!
//! Decisions are driven by gyroscope samples only. An acceleration spike on
//! its own (a dropped phone, a bump) never raises an event without a
//! coincident orientation change.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::types::{FallEvent, MotionSample, SensorKind};

/// Thresholds for the fall classifier.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    /// Acceleration magnitude (m/s², gravity removed) that must be exceeded.
    pub acceleration_threshold: f32,
    /// Per-axis angular velocity change (rad/s) that must be exceeded on at
    /// least one axis.
    pub angular_delta_threshold: f32,
    /// Gravity bias subtracted from the z axis before taking the magnitude.
    pub gravity: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            acceleration_threshold: 35.0,
            angular_delta_threshold: 2.0,
            gravity: 9.8,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GyroBaseline {
    x: f32,
    y: f32,
    z: f32,
    at: DateTime<Utc>,
}

impl From<&MotionSample> for GyroBaseline {
    fn from(sample: &MotionSample) -> Self {
        Self {
            x: sample.x,
            y: sample.y,
            z: sample.z,
            at: sample.timestamp,
        }
    }
}

/// Stateful accelerometer + gyroscope fall filter.
///
/// Not re-entrant: callers feeding both streams from different threads must
/// serialize the calls themselves.
#[derive(Debug, Clone)]
pub struct FallClassifier {
    config: DetectorConfig,
    last_magnitude: f32,
    baseline: Option<GyroBaseline>,
    last_interval: Option<Duration>,
}

impl FallClassifier {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            last_magnitude: 0.0,
            baseline: None,
            last_interval: None,
        }
    }

    /// Latest acceleration magnitude, 0 until the first accelerometer sample.
    pub fn last_magnitude(&self) -> f32 {
        self.last_magnitude
    }

    /// Time between the last two gyroscope samples.
    ///
    /// Tracked for callers that want rate information; the decision rule
    /// compares raw deltas and never scales by it.
    pub fn last_interval(&self) -> Option<Duration> {
        self.last_interval
    }

    pub fn is_seeded(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn on_accelerometer(&mut self, sample: &MotionSample) {
        let z = sample.z - self.config.gravity;
        self.last_magnitude = (sample.x * sample.x + sample.y * sample.y + z * z).sqrt();
    }

    pub fn on_gyroscope(&mut self, sample: &MotionSample) -> Option<FallEvent> {
        // The first reading only seeds the baseline.
        let previous = self.baseline.replace(GyroBaseline::from(sample))?;
        self.last_interval = Some(sample.timestamp - previous.at);

        let dx = (sample.x - previous.x).abs();
        let dy = (sample.y - previous.y).abs();
        let dz = (sample.z - previous.z).abs();

        let threshold = self.config.angular_delta_threshold;
        let rotated = dx > threshold || dy > threshold || dz > threshold;
        let impact = self.last_magnitude > self.config.acceleration_threshold;

        if impact && rotated {
            log::debug!(
                "fall decision at {}: magnitude {:.2}, deltas ({:.2}, {:.2}, {:.2})",
                sample.timestamp,
                self.last_magnitude,
                dx,
                dy,
                dz
            );
            Some(FallEvent {
                detected_at: sample.timestamp,
                magnitude: self.last_magnitude,
                angular_delta: dx.max(dy).max(dz),
            })
        } else {
            None
        }
    }

    /// Routes a sample to the matching entry point.
    pub fn process(&mut self, sample: &MotionSample) -> Option<FallEvent> {
        match sample.kind {
            SensorKind::Accelerometer => {
                self.on_accelerometer(sample);
                None
            }
            SensorKind::Gyroscope => self.on_gyroscope(sample),
        }
    }

    pub fn process_batch(&mut self, samples: &[MotionSample]) -> Vec<FallEvent> {
        samples.iter().filter_map(|s| self.process(s)).collect()
    }

    /// Forgets the held magnitude and the gyroscope baseline.
    pub fn reset(&mut self) {
        self.last_magnitude = 0.0;
        self.baseline = None;
        self.last_interval = None;
    }
}

impl Default for FallClassifier {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
