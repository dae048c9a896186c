use reqwest::Url;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use crate::detector::DetectorConfig;
use crate::fingerprint::FingerprintConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub detection: DetectorConfig,
    #[serde(default)]
    pub fingerprint: FingerprintConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceConfig {
    /// Device/patient identifier sent with every backend call.
    #[serde(default)]
    pub identifier: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(deserialize_with = "deserialize_base_url")]
    pub base_url: Url,
    #[serde(
        default = "default_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            queue_depth: default_queue_depth(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_queue_depth() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Ingest,
    Control,
    ReadStatus,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let detection = &self.detection;
        for (name, value) in [
            ("detection.acceleration_threshold", detection.acceleration_threshold),
            ("detection.angular_delta_threshold", detection.angular_delta_threshold),
            ("detection.gravity", detection.gravity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a finite, non-negative number",
                    name
                )));
            }
        }
        if self.fingerprint.capacity == 0 {
            return Err(ConfigError::Invalid(
                "fingerprint.capacity must be at least 1".into(),
            ));
        }
        if self.web.queue_depth == 0 {
            return Err(ConfigError::Invalid(
                "web.queue_depth must be at least 1".into(),
            ));
        }
        if self.device.identifier.trim().is_empty() {
            log::warn!("device.identifier is empty; backend calls will be refused");
        }
        Ok(())
    }
}

fn deserialize_base_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let url = Url::parse(raw.trim()).map_err(serde::de::Error::custom)?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(serde::de::Error::custom(format!(
            "backend url must be http(s): {}",
            raw
        )));
    }
    Ok(url)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}
