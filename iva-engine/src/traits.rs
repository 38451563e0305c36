use async_trait::async_trait;
use iva_core::types::{AccessToken, Credentials, Identity, Registration};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{AuthError, NetworkError, RegError, UploadError};

/// One assembled recording. Fragments are mono PCM samples at
/// `sample_rate_hz`, kept in the order the device delivered them.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub sample_rate_hz: u32,
    pub fragments: Vec<Vec<f32>>,
}

impl Clip {
    pub fn samples(&self) -> Vec<f32> {
        self.fragments.concat()
    }

    pub fn sample_count(&self) -> usize {
        self.fragments.iter().map(Vec::len).sum()
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate_hz == 0 {
            return 0;
        }
        (self.sample_count() as u64 * 1000) / self.sample_rate_hz as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeReply {
    pub user_text: Option<String>,
    pub response_text: String,
    pub audio_url: Option<String>,
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, creds: &Credentials) -> Result<Identity, AuthError>;

    async fn register(&self, reg: &Registration) -> Result<(), RegError>;

    async fn submit_voice(&self, clip: &Clip, token: &AccessToken)
    -> Result<ExchangeReply, UploadError>;

    async fn send_text(&self, message: &str, token: &AccessToken) -> Result<String, UploadError>;

    async fn health(&self) -> Result<bool, NetworkError>;
}

#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Fetch and play a reply clip once.
    async fn play(&self, audio_url: &str) -> anyhow::Result<()>;
}

/// Stops a running capture. After `stop` the device delivers any buffered
/// fragment and then closes the fragment channel.
pub trait CaptureControl: Send {
    fn stop(&mut self);
}

pub struct CaptureHandle {
    pub sample_rate_hz: u32,
    pub fragments: mpsc::UnboundedReceiver<Vec<f32>>,
    pub control: Box<dyn CaptureControl>,
}

#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Request exclusive access and start delivering fragments.
    async fn open(&self) -> anyhow::Result<CaptureHandle>;
}
