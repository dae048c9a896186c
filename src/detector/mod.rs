mod classifier;
mod types;

pub use classifier::{DetectorConfig, FallClassifier};
pub use types::{FallEvent, MotionSample, SensorKind};
