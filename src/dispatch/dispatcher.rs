use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::client::BackendClient;
use super::error::DispatchError;
use super::feedback::AlertFeedback;
use super::payload::PatientRegistration;
use super::status::{DeliveryKind, DeliveryStatus, StatusBoard};
use crate::detector::FallEvent;
use crate::fingerprint::FingerprintBatch;
use crate::session::SessionEvent;

/// Work item for the dispatcher.
#[derive(Debug, Clone)]
pub enum Alert {
    Fall {
        identifier: String,
        event: FallEvent,
    },
    Fingerprint {
        identifier: String,
        batch: FingerprintBatch,
    },
    NurseCall {
        identifier: String,
    },
}

impl Alert {
    pub fn from_session_event(identifier: &str, event: SessionEvent) -> Self {
        let identifier = identifier.to_string();
        match event {
            SessionEvent::Fall(event) => Alert::Fall { identifier, event },
            SessionEvent::Fingerprint(batch) => Alert::Fingerprint { identifier, batch },
        }
    }

    pub fn kind(&self) -> DeliveryKind {
        match self {
            Alert::Fall { .. } => DeliveryKind::Emergency,
            Alert::Fingerprint { .. } => DeliveryKind::Fingerprint,
            Alert::NurseCall { .. } => DeliveryKind::NurseCall,
        }
    }
}

/// Turns alerts into backend calls and user feedback, recording every
/// outcome on the [`StatusBoard`].
#[derive(Clone)]
pub struct AlertDispatcher {
    client: Arc<BackendClient>,
    board: StatusBoard,
    feedback: Arc<dyn AlertFeedback>,
}

impl AlertDispatcher {
    pub fn new(client: BackendClient, board: StatusBoard, feedback: Arc<dyn AlertFeedback>) -> Self {
        Self {
            client: Arc::new(client),
            board,
            feedback,
        }
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    /// Drains `alerts` until every sender is gone. Each delivery runs on its
    /// own task, so a slow backend never holds up the next alert.
    pub fn spawn(self, mut alerts: mpsc::Receiver<Alert>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(alert) = alerts.recv().await {
                let dispatcher = self.clone();
                tokio::spawn(async move {
                    dispatcher.deliver(alert).await;
                });
            }
            log::debug!("alert channel closed, dispatcher exiting");
        })
    }

    pub async fn deliver(&self, alert: Alert) -> DeliveryStatus {
        let kind = alert.kind();
        let result = match &alert {
            Alert::Fall { identifier, event } => {
                self.feedback.haptic();
                self.feedback.notify(
                    "Fall detected",
                    &format!("Fall detected at {}", event.detected_at.format("%H:%M:%S")),
                );
                self.client.send_emergency(identifier).await
            }
            Alert::NurseCall { identifier } => {
                self.feedback
                    .notify("Nurse call", "Sending nurse call request...");
                let result = self.client.send_nurse_call(identifier).await;
                match &result {
                    Ok(()) => self.feedback.notify("Nurse call", "Nurse call sent"),
                    Err(e) => self.feedback.notify(
                        "Nurse call",
                        &format!("Nurse call failed: {}", e.error_code()),
                    ),
                }
                result
            }
            Alert::Fingerprint { identifier, batch } => {
                self.client.send_fingerprint(identifier, batch).await
            }
        };
        self.record(kind, result)
    }

    pub async fn register(&self, registration: &PatientRegistration) -> DeliveryStatus {
        let result = self.client.register_patient(registration).await;
        self.record(DeliveryKind::Registration, result)
    }

    fn record(&self, kind: DeliveryKind, result: Result<(), DispatchError>) -> DeliveryStatus {
        match &result {
            Ok(()) => log::info!("{} delivered", kind),
            Err(e) => log::error!("{} delivery failed: {}", kind, e),
        }
        let status = DeliveryStatus::new(kind, &result, Utc::now());
        self.board.record(status.clone());
        status
    }
}
