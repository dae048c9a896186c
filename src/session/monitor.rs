use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::error::MonitorError;
use super::session::Session;
use super::types::{SensorInput, SessionCounters, SessionInfo};
use crate::detector::DetectorConfig;
use crate::dispatch::Alert;
use crate::fingerprint::FingerprintConfig;

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub enum MonitorMode {
    Idle,
    Running {
        session_id: Uuid,
        identifier: String,
        started_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct MonitorStatus {
    pub mode: MonitorMode,
    /// Counters of the running session, or of the last one once stopped.
    pub counters: SessionCounters,
}

#[derive(Debug)]
struct WorkerHandle {
    info: SessionInfo,
    input_tx: mpsc::Sender<SensorInput>,
    join: JoinHandle<SessionCounters>,
}

/// Owns at most one running detection session.
///
/// The session lives on a worker task that drains a single input queue, so
/// accelerometer, gyroscope and scan inputs are handled one at a time in
/// arrival order no matter which thread submitted them.
pub struct Monitor {
    detection: DetectorConfig,
    fingerprint: FingerprintConfig,
    default_identifier: String,
    queue_depth: usize,
    alerts: mpsc::Sender<Alert>,
    status: Arc<StdMutex<MonitorStatus>>,
    worker: Option<WorkerHandle>,
}

impl Monitor {
    pub fn new(
        detection: DetectorConfig,
        fingerprint: FingerprintConfig,
        default_identifier: impl Into<String>,
        queue_depth: usize,
        alerts: mpsc::Sender<Alert>,
    ) -> Self {
        Self {
            detection,
            fingerprint,
            default_identifier: default_identifier.into(),
            queue_depth: queue_depth.max(1),
            alerts,
            status: Arc::new(StdMutex::new(MonitorStatus {
                mode: MonitorMode::Idle,
                counters: SessionCounters::default(),
            })),
            worker: None,
        }
    }

    fn lock_status(&self) -> MutexGuard<'_, MonitorStatus> {
        lock(&self.status)
    }

    pub fn status(&self) -> MonitorStatus {
        self.lock_status().clone()
    }

    pub fn session(&self) -> Option<&SessionInfo> {
        self.worker.as_ref().map(|w| &w.info)
    }

    pub fn default_identifier(&self) -> &str {
        &self.default_identifier
    }

    /// Starts a session for `identifier`, or the configured default.
    pub fn start(&mut self, identifier: Option<String>) -> Result<SessionInfo, MonitorError> {
        if self.worker.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        let identifier = identifier.unwrap_or_else(|| self.default_identifier.clone());
        if identifier.trim().is_empty() {
            log::warn!("starting session without an identifier; alerts will not be delivered");
        }

        let session = Session::new(
            identifier,
            self.detection.clone(),
            &self.fingerprint,
            Utc::now(),
        );
        let info = session.info().clone();
        let (input_tx, input_rx) = mpsc::channel(self.queue_depth);

        {
            let mut status = self.lock_status();
            status.mode = MonitorMode::Running {
                session_id: info.id,
                identifier: info.identifier.clone(),
                started_at: info.started_at,
            };
            status.counters = SessionCounters::default();
        }

        let join = tokio::spawn(run_session_loop(
            session,
            input_rx,
            self.alerts.clone(),
            self.status.clone(),
        ));
        log::info!(
            "detection session {} started for '{}'",
            info.id,
            info.identifier
        );

        self.worker = Some(WorkerHandle {
            info: info.clone(),
            input_tx,
            join,
        });
        Ok(info)
    }

    /// Ends the running session after the inputs already queued are handled.
    /// Returns `None` when nothing was running.
    pub async fn stop(&mut self) -> Option<SessionInfo> {
        let worker = self.worker.take()?;
        drop(worker.input_tx);

        let counters = match worker.join.await {
            Ok(counters) => Some(counters),
            Err(e) => {
                log::error!("session {} worker failed: {}", worker.info.id, e);
                None
            }
        };

        let mut status = self.lock_status();
        status.mode = MonitorMode::Idle;
        if let Some(counters) = counters {
            status.counters = counters;
        }
        log::info!("detection session {} stopped", worker.info.id);
        Some(worker.info)
    }

    /// Queues inputs for the running session, returning how many were queued.
    pub async fn submit<I>(&self, inputs: I) -> Result<usize, MonitorError>
    where
        I: IntoIterator<Item = SensorInput>,
    {
        let worker = self.worker.as_ref().ok_or(MonitorError::NotRunning)?;
        let mut queued = 0;
        for input in inputs {
            worker
                .input_tx
                .send(input)
                .await
                .map_err(|_| MonitorError::WorkerStopped)?;
            queued += 1;
        }
        Ok(queued)
    }
}

fn lock(status: &StdMutex<MonitorStatus>) -> MutexGuard<'_, MonitorStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_session_loop(
    mut session: Session,
    mut inputs: mpsc::Receiver<SensorInput>,
    alerts: mpsc::Sender<Alert>,
    status: Arc<StdMutex<MonitorStatus>>,
) -> SessionCounters {
    while let Some(input) = inputs.recv().await {
        let event = session.handle(input);
        lock(&status).counters = session.counters().clone();

        if let Some(event) = event {
            let alert = Alert::from_session_event(&session.info().identifier, event);
            if alerts.send(alert).await.is_err() {
                log::warn!("alert channel closed; dropping event");
            }
        }
    }
    session.counters().clone()
}
