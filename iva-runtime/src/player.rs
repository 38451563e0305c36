use std::sync::Arc;

use anyhow::Context;
use iva_audio::decode::decode_to_mono;
use iva_audio::playback::PlaybackSink;
use iva_core::config::ClientConfig;
use iva_engine::traits::AudioPlayer;
use iva_providers::backend::build_audio_fetch_request;
use iva_providers::runtime::{Timeouts, execute};

/// Fetches a reply clip from the backend, decodes it and hands it to a sink.
pub struct HttpAudioPlayer {
    base_url: String,
    timeouts: Timeouts,
    sink: Arc<dyn PlaybackSink>,
}

impl HttpAudioPlayer {
    pub fn new(cfg: &ClientConfig, sink: Arc<dyn PlaybackSink>) -> Self {
        Self {
            base_url: cfg.backend_url.clone(),
            timeouts: Timeouts {
                connect: cfg.connect_timeout(),
                total: cfg.upload_timeout(),
            },
            sink,
        }
    }
}

fn extension_hint(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then_some(ext)
}

#[async_trait::async_trait]
impl AudioPlayer for HttpAudioPlayer {
    async fn play(&self, audio_url: &str) -> anyhow::Result<()> {
        let req = build_audio_fetch_request(&self.base_url, audio_url);
        let resp = execute(&req, &self.timeouts)
            .await
            .with_context(|| format!("fetch {}", req.url))?;
        if !resp.is_success() {
            anyhow::bail!("fetch {} failed: status={}", req.url, resp.status);
        }

        let ext = extension_hint(audio_url).map(str::to_string);
        let sink = self.sink.clone();
        tokio::task::spawn_blocking(move || {
            let audio = decode_to_mono(resp.body, ext.as_deref()).context("decode reply audio")?;
            log::info!("playing reply audio (~{}ms)", audio.duration_ms());
            sink.play(audio)
        })
        .await
        .context("playback task")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_comes_from_the_last_path_segment() {
        assert_eq!(extension_hint("/clip/1.mp3"), Some("mp3"));
        assert_eq!(extension_hint("/static/a.b/reply.wav?sig=1"), Some("wav"));
        assert_eq!(extension_hint("/clip/1"), None);
    }
}
