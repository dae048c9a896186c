mod types;
mod window;

pub use types::{FingerprintBatch, ScanResult, SignalSnapshot};
pub use window::{FingerprintConfig, FingerprintWindow};
