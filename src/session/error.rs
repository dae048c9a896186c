use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("detection session already running")]
    AlreadyRunning,
    #[error("no detection session running")]
    NotRunning,
    #[error("session worker stopped unexpectedly")]
    WorkerStopped,
}
