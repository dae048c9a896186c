pub mod assist;
pub mod deliveries;
pub mod error;
pub mod samples;
pub mod session;
