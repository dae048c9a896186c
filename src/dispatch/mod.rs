mod client;
mod dispatcher;
mod error;
mod feedback;
mod payload;
mod status;

pub use client::BackendClient;
pub use dispatcher::{Alert, AlertDispatcher};
pub use error::DispatchError;
pub use feedback::{AlertFeedback, LogFeedback};
pub use payload::PatientRegistration;
pub use status::{DeliveryKind, DeliveryReport, DeliveryStatus, StatusBoard};
