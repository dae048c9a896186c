use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::detector::MotionSample;
use crate::fingerprint::{ScanResult, SignalSnapshot};
use crate::session::SensorInput;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("record {0}: {1}")]
    Record(usize, String),
}

/// A recorded sensor trace: timestamped accelerometer, gyroscope and scan
/// records relative to a start instant.
#[derive(Debug, Clone)]
pub struct Trace {
    pub start: DateTime<Utc>,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub at: Duration,
    /// `start + at`, resolved when the trace is parsed.
    pub timestamp: DateTime<Utc>,
    pub reading: Reading,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Accelerometer([f32; 3]),
    Gyroscope([f32; 3]),
    Scan(SignalSnapshot),
}

impl Reading {
    pub fn name(&self) -> &'static str {
        match self {
            Reading::Accelerometer(_) => "accelerometer",
            Reading::Gyroscope(_) => "gyroscope",
            Reading::Scan(_) => "scan",
        }
    }
}

impl Trace {
    pub fn from_str(yaml: &str) -> Result<Self, ParseError> {
        let root: serde_yaml::Value = serde_yaml::from_str(yaml)?;

        let start = match root.get("start") {
            Some(value) => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| ParseError::Record(0, "'start' must be a string".into()))?;
                DateTime::parse_from_rfc3339(raw.trim())
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| ParseError::Record(0, format!("invalid start: {}", e)))?
            }
            None => Utc::now(),
        };

        let records = root
            .get("samples")
            .and_then(|v| v.as_sequence())
            .ok_or_else(|| ParseError::Record(0, "missing 'samples'".into()))?
            .iter()
            .enumerate()
            .map(|(i, v)| parse_record(i, v, start))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Trace { start, records })
    }

    /// Resolves every record to an absolute input, ordered by time. Records
    /// sharing an offset keep their file order.
    pub fn inputs(&self) -> Vec<SensorInput> {
        let mut records: Vec<&Record> = self.records.iter().collect();
        records.sort_by_key(|r| r.at);

        records
            .into_iter()
            .map(|record| {
                let timestamp = record.timestamp;
                match &record.reading {
                    Reading::Accelerometer([x, y, z]) => {
                        SensorInput::Motion(MotionSample::accelerometer(*x, *y, *z, timestamp))
                    }
                    Reading::Gyroscope([x, y, z]) => {
                        SensorInput::Motion(MotionSample::gyroscope(*x, *y, *z, timestamp))
                    }
                    Reading::Scan(snapshot) => SensorInput::Scan(ScanResult {
                        snapshot: snapshot.clone(),
                        captured_at: timestamp,
                    }),
                }
            })
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.reading.name() == name)
            .count()
    }
}

fn parse_record(
    i: usize,
    value: &serde_yaml::Value,
    start: DateTime<Utc>,
) -> Result<Record, ParseError> {
    let err = |msg: &str| ParseError::Record(i, msg.into());
    let map = value.as_mapping().ok_or_else(|| err("expected mapping"))?;

    let at = map
        .get("at")
        .ok_or_else(|| err("missing 'at'"))?
        .as_str()
        .ok_or_else(|| err("'at' must be a duration string"))
        .and_then(|s| parse_offset(s).map_err(|e| err(&e)))?;
    let timestamp = start
        .checked_add_signed(at)
        .ok_or_else(|| err("offset out of range"))?;

    // Exactly one sensor key besides "at"
    let mut sensors = map.iter().filter(|(k, _)| k.as_str() != Some("at"));
    let (sensor, value) = sensors.next().ok_or_else(|| err("no sensor reading found"))?;
    if sensors.next().is_some() {
        return Err(err("expected exactly one sensor reading"));
    }

    let sensor = sensor
        .as_str()
        .ok_or_else(|| err("sensor name must be a string"))?;
    let value = value.clone();

    let reading = match sensor {
        "accelerometer" => {
            Reading::Accelerometer(serde_yaml::from_value(value).map_err(|e| err(&e.to_string()))?)
        }
        "gyroscope" => {
            Reading::Gyroscope(serde_yaml::from_value(value).map_err(|e| err(&e.to_string()))?)
        }
        "scan" => Reading::Scan(serde_yaml::from_value(value).map_err(|e| err(&e.to_string()))?),
        _ => return Err(err(&format!("unknown sensor: {}", sensor))),
    };

    Ok(Record {
        at,
        timestamp,
        reading,
    })
}

fn parse_offset(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    humantime::parse_duration(s)
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = r#"
start: 2026-01-12T10:00:00Z
samples:
  - at: 20ms
    gyroscope: [0.0, 0.0, 0.0]
  - at: 0ms
    accelerometer: [0.1, 0.2, 9.8]
  - at: 1s
    scan:
      "aa:bb:cc:dd:ee:01": -42
      "aa:bb:cc:dd:ee:02": -77
"#;

    #[test]
    fn test_parse_trace() {
        let trace = Trace::from_str(TRACE).unwrap();
        assert_eq!(trace.start.to_rfc3339(), "2026-01-12T10:00:00+00:00");
        assert_eq!(trace.records.len(), 3);
        assert_eq!(trace.records[0].at, Duration::milliseconds(20));
        assert_eq!(trace.count("scan"), 1);
        let Reading::Scan(snapshot) = &trace.records[2].reading else {
            panic!("expected scan");
        };
        assert_eq!(snapshot.strength("aa:bb:cc:dd:ee:02"), Some(-77));
    }

    #[test]
    fn test_inputs_are_time_ordered() {
        let trace = Trace::from_str(TRACE).unwrap();
        let inputs = trace.inputs();
        assert_eq!(inputs.len(), 3);
        assert!(matches!(&inputs[0], SensorInput::Motion(s) if s.x == 0.1));
        assert_eq!(inputs[1].timestamp(), trace.start + Duration::milliseconds(20));
        assert!(matches!(&inputs[2], SensorInput::Scan(_)));
    }

    #[test]
    fn test_replay_is_deterministic() {
        use crate::detector::DetectorConfig;
        use crate::fingerprint::FingerprintConfig;
        use crate::session::{Session, SessionEvent};

        let yaml = r#"
start: 2026-01-12T10:00:00Z
samples:
  - at: 0ms
    accelerometer: [40.0, 0.0, 9.8]
  - at: 10ms
    gyroscope: [0.0, 0.0, 0.0]
  - at: 20ms
    gyroscope: [0.0, 0.0, 3.0]
  - at: 1s
    scan: {"aa": -40}
  - at: 2s
    scan: {"aa": -40}
  - at: 3s
    scan: {"aa": -41}
  - at: 4s
    scan: {"bb": -60}
"#;
        let trace = Trace::from_str(yaml).unwrap();
        let run = || {
            let mut session = Session::new(
                "1111",
                DetectorConfig::default(),
                &FingerprintConfig::default(),
                trace.start,
            );
            let events = session.replay(trace.inputs());
            (events, session.counters().clone())
        };

        let (first, counters) = run();
        let (second, _) = run();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert!(matches!(
            &first[0],
            SessionEvent::Fall(e) if e.detected_at == trace.start + Duration::milliseconds(20)
        ));
        assert!(matches!(
            &first[1],
            SessionEvent::Fingerprint(b) if b.captured_at == trace.start + Duration::seconds(4)
        ));
        assert_eq!(counters.ignored_scans, 1);
        assert_eq!(counters.falls, 1);
        assert_eq!(counters.batches, 1);
    }

    #[test]
    fn test_missing_start_defaults_to_now() {
        let before = Utc::now();
        let trace = Trace::from_str("samples: []\n").unwrap();
        assert!(trace.start >= before);
        assert!(trace.records.is_empty());
    }

    #[test]
    fn test_rejects_bad_records() {
        let cases = [
            "samples:\n  - accelerometer: [1, 2, 3]\n",
            "samples:\n  - at: soon\n    accelerometer: [1, 2, 3]\n",
            "samples:\n  - at: 1s\n",
            "samples:\n  - at: 1s\n    accelerometer: [1, 2, 3]\n    gyroscope: [1, 2, 3]\n",
            "samples:\n  - at: 1s\n    barometer: [1, 2, 3]\n",
            "samples:\n  - at: 1s\n    gyroscope: [1, 2]\n",
            "samples:\n  - at: 1s\n    scan: [1, 2]\n",
            "samples:\n  - at: 300000years\n    gyroscope: [1, 2, 3]\n",
        ];
        for yaml in cases {
            assert!(
                matches!(Trace::from_str(yaml), Err(ParseError::Record(0, _))),
                "accepted: {}",
                yaml
            );
        }
        assert!(matches!(
            Trace::from_str("start: yesterday\nsamples: []\n"),
            Err(ParseError::Record(0, _))
        ));
        match Trace::from_str(
            "start: 2026-01-12T10:00:00Z\nsamples:\n  - at: 1s\n    scan: {}\n  - at: 300000years\n    scan: {}\n",
        ) {
            Err(ParseError::Record(1, msg)) => assert_eq!(msg, "offset out of range"),
            other => panic!("unexpected: {:?}", other.map(|t| t.records.len())),
        }
        assert!(Trace::from_str("samples: [").is_err());
        assert!(Trace::from_str("start: 2026-01-12T10:00:00Z\n").is_err());
    }
}
