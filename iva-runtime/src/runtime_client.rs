use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use iva_audio::file_source::FileCaptureDevice;
use iva_audio::playback::PlaybackSink;
use iva_core::config::ClientConfig;
use iva_engine::traits::CaptureDevice;
use iva_engine::{EngineConfig, VoiceClient};

use crate::backend::HttpBackend;
use crate::player::HttpAudioPlayer;

/// Build a ready client from config plus the device and sink chosen by the
/// front end.
pub fn build_client_from_config(
    cfg: &ClientConfig,
    device: Arc<dyn CaptureDevice>,
    sink: Arc<dyn PlaybackSink>,
) -> anyhow::Result<VoiceClient> {
    cfg.validate().context("invalid client config")?;
    log::info!("backend: {}", cfg.backend_url);

    let backend = Arc::new(HttpBackend::new(cfg));
    let player = Arc::new(HttpAudioPlayer::new(cfg, sink));
    Ok(VoiceClient::new(EngineConfig::from(cfg), backend, device, player))
}

/// A file replay when `clip` is given, otherwise the microphone.
pub fn capture_device(
    cfg: &ClientConfig,
    clip: Option<&Path>,
) -> anyhow::Result<Arc<dyn CaptureDevice>> {
    if let Some(path) = clip {
        return Ok(Arc::new(FileCaptureDevice::from_path(path)?));
    }
    microphone(cfg)
}

#[cfg(feature = "audio-io")]
fn microphone(cfg: &ClientConfig) -> anyhow::Result<Arc<dyn CaptureDevice>> {
    Ok(Arc::new(iva_audio::mic::CpalCaptureDevice::new(
        cfg.microphone_device.clone(),
    )))
}

#[cfg(not(feature = "audio-io"))]
fn microphone(_cfg: &ClientConfig) -> anyhow::Result<Arc<dyn CaptureDevice>> {
    anyhow::bail!("built without microphone support; pass a WAV file with --clip")
}

/// Input device names usable as `microphone_device`.
#[cfg(feature = "audio-io")]
pub fn list_microphones() -> anyhow::Result<Vec<String>> {
    iva_audio::mic::list_input_device_names()
}

#[cfg(not(feature = "audio-io"))]
pub fn list_microphones() -> anyhow::Result<Vec<String>> {
    anyhow::bail!("built without microphone support")
}

pub fn playback_sink() -> Arc<dyn PlaybackSink> {
    #[cfg(feature = "audio-io")]
    {
        Arc::new(iva_audio::playback::CpalSink)
    }
    #[cfg(not(feature = "audio-io"))]
    {
        Arc::new(iva_audio::playback::UnavailableSink)
    }
}
