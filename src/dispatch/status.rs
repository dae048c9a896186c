use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::error::DispatchError;

const HISTORY_LIMIT: usize = 50;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    strum_macros::Display,
    utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryKind {
    Emergency,
    NurseCall,
    Fingerprint,
    Registration,
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct DeliveryStatus {
    pub kind: DeliveryKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// `%Y-%m-%d %H:%M:%S`, UTC.
    pub timestamp: String,
}

impl DeliveryStatus {
    pub fn new(kind: DeliveryKind, result: &Result<(), DispatchError>, at: DateTime<Utc>) -> Self {
        let (error_code, error_message) = match result {
            Ok(()) => (None, None),
            Err(DispatchError::Server { code, body }) if !body.is_empty() => {
                (Some(code.to_string()), Some(body.clone()))
            }
            Err(e) => (Some(e.error_code()), Some(e.to_string())),
        };
        Self {
            kind,
            success: result.is_ok(),
            error_code,
            error_message,
            timestamp: at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DeliveryReport {
    /// Latest status per delivery kind.
    pub latest: Vec<DeliveryStatus>,
    /// Most recent first.
    pub history: Vec<DeliveryStatus>,
}

#[derive(Debug, Default)]
struct Board {
    latest: BTreeMap<DeliveryKind, DeliveryStatus>,
    history: VecDeque<DeliveryStatus>,
}

/// Shared record of delivery outcomes, read by the status API.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<Mutex<Board>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Board> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, status: DeliveryStatus) {
        let mut board = self.lock();
        board.latest.insert(status.kind, status.clone());
        board.history.push_front(status);
        board.history.truncate(HISTORY_LIMIT);
    }

    pub fn latest(&self, kind: DeliveryKind) -> Option<DeliveryStatus> {
        self.lock().latest.get(&kind).cloned()
    }

    pub fn report(&self) -> DeliveryReport {
        let board = self.lock();
        DeliveryReport {
            latest: board.latest.values().cloned().collect(),
            history: board.history.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap() + chrono::Duration::seconds(secs)
    }

    #[test]
    fn test_status_from_result() {
        let ok = DeliveryStatus::new(DeliveryKind::Emergency, &Ok(()), at(5));
        assert!(ok.success);
        assert_eq!(ok.error_code, None);
        assert_eq!(ok.timestamp, "2026-03-01 08:00:05");

        let server = DeliveryStatus::new(
            DeliveryKind::NurseCall,
            &Err(DispatchError::Server {
                code: 503,
                body: "busy".into(),
            }),
            at(0),
        );
        assert!(!server.success);
        assert_eq!(server.error_code.as_deref(), Some("503"));
        assert_eq!(server.error_message.as_deref(), Some("busy"));

        let empty = DeliveryStatus::new(
            DeliveryKind::Fingerprint,
            &Err(DispatchError::EmptyIdentifier),
            at(0),
        );
        assert_eq!(empty.error_code.as_deref(), Some("EMPTY_IDENTIFIER"));
    }

    #[test]
    fn test_board_keeps_latest_per_kind() {
        let board = StatusBoard::new();
        board.record(DeliveryStatus::new(DeliveryKind::Emergency, &Ok(()), at(0)));
        board.record(DeliveryStatus::new(
            DeliveryKind::Emergency,
            &Err(DispatchError::EmptyIdentifier),
            at(1),
        ));
        board.record(DeliveryStatus::new(DeliveryKind::Fingerprint, &Ok(()), at(2)));

        let latest = board.latest(DeliveryKind::Emergency).unwrap();
        assert!(!latest.success);
        assert!(board.latest(DeliveryKind::NurseCall).is_none());

        let report = board.report();
        assert_eq!(report.latest.len(), 2);
        assert_eq!(report.history.len(), 3);
        assert_eq!(report.history[0].kind, DeliveryKind::Fingerprint);
    }

    #[test]
    fn test_history_is_bounded() {
        let board = StatusBoard::new();
        for i in 0..(HISTORY_LIMIT as i64 + 10) {
            board.record(DeliveryStatus::new(DeliveryKind::Fingerprint, &Ok(()), at(i)));
        }
        assert_eq!(board.report().history.len(), HISTORY_LIMIT);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(DeliveryKind::NurseCall.to_string(), "nurse_call");
    }
}
