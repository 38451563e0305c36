use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("backend_url must start with http:// or https://: {0}")]
    InvalidBackendUrl(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("upload_sample_rate_hz must be between 8000 and 48000: {0}")]
    InvalidSampleRate(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub backend_url: String,
    pub connect_timeout_ms: u64,
    pub auth_timeout_ms: u64,
    pub upload_timeout_ms: u64,
    pub stop_timeout_ms: u64,
    pub playback_enabled: bool,

    // None selects the host's default input device.
    pub microphone_device: Option<String>,
    pub upload_sample_rate_hz: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            connect_timeout_ms: 10_000,
            auth_timeout_ms: 15_000,
            upload_timeout_ms: 60_000,
            stop_timeout_ms: 3_000,
            playback_enabled: true,
            microphone_device: None,
            upload_sample_rate_hz: 16_000,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBackendUrl(self.backend_url.clone()));
        }
        for (name, v) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("auth_timeout_ms", self.auth_timeout_ms),
            ("upload_timeout_ms", self.upload_timeout_ms),
            ("stop_timeout_ms", self.stop_timeout_ms),
        ] {
            if v == 0 {
                return Err(ConfigError::ZeroTimeout(name));
            }
        }
        if !(8_000..=48_000).contains(&self.upload_sample_rate_hz) {
            return Err(ConfigError::InvalidSampleRate(self.upload_sample_rate_hz));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}
