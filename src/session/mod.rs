mod error;
mod monitor;
mod session;
mod types;

pub use error::MonitorError;
pub use monitor::{Monitor, MonitorMode, MonitorStatus};
pub use session::Session;
pub use types::{SensorInput, SessionCounters, SessionEvent, SessionInfo};
