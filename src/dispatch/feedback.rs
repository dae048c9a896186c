/// User-facing feedback for alerts (vibration, local notifications).
///
/// The platform shim provides the real implementation; [`LogFeedback`] just
/// writes to the log.
pub trait AlertFeedback: Send + Sync {
    fn haptic(&self);
    fn notify(&self, title: &str, body: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogFeedback;

impl AlertFeedback for LogFeedback {
    fn haptic(&self) {
        log::info!("haptic feedback requested");
    }

    fn notify(&self, title: &str, body: &str) {
        log::info!("notification: {}: {}", title, body);
    }
}
