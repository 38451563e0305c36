use std::sync::Arc;
use std::time::Duration;

use iva_core::text;
use iva_core::types::AccessToken;

use crate::error::{NetworkError, UploadError};
use crate::session_store::bounded;
use crate::state::SharedState;
use crate::traits::{AudioPlayer, Backend, Clip, ExchangeReply};

/// Sends clips (or typed messages) to the backend and folds the outcome into
/// the conversation log.
///
/// Overlapping exchanges are applied in the order their responses arrive.
/// Responses that come back after a logout are dropped.
#[derive(Clone)]
pub struct UploadPipeline {
    backend: Arc<dyn Backend>,
    player: Arc<dyn AudioPlayer>,
    state: SharedState,
    upload_timeout: Duration,
    playback_enabled: bool,
}

impl UploadPipeline {
    pub(crate) fn new(
        backend: Arc<dyn Backend>,
        player: Arc<dyn AudioPlayer>,
        state: SharedState,
        upload_timeout: Duration,
        playback_enabled: bool,
    ) -> Self {
        Self {
            backend,
            player,
            state,
            upload_timeout,
            playback_enabled,
        }
    }

    /// `token` is the bearer captured when the upload was dispatched.
    pub async fn submit(&self, clip: Clip, token: AccessToken) -> Result<ExchangeReply, UploadError> {
        log::info!(
            "uploading clip: {} fragments, ~{}ms",
            clip.fragments.len(),
            clip.duration_ms()
        );

        let pending = self.state.begin();
        let res = bounded(self.upload_timeout, self.backend.submit_voice(&clip, &token))
            .await
            .unwrap_or(Err(UploadError::Network(NetworkError::Timeout)))
            .and_then(|reply| {
                if reply.response_text.trim().is_empty() {
                    Err(UploadError::Network(NetworkError::Malformed(
                        "empty response_text".into(),
                    )))
                } else {
                    Ok(reply)
                }
            });

        let outcome = pending.settle(|s, current| {
            if !current {
                return Err(UploadError::Stale);
            }
            match res {
                Ok(reply) => {
                    // Both turns go in under one lock so no other exchange lands between them.
                    s.log.push_exchange(
                        text::user_text_or_placeholder(reply.user_text.as_deref()),
                        reply.response_text.clone(),
                    );
                    Ok(reply)
                }
                Err(e) => {
                    s.log.push_assistant(text::VOICE_FAILED);
                    Err(e)
                }
            }
        });

        match &outcome {
            Ok(reply) => {
                if let Some(url) = reply.audio_url.as_deref() {
                    self.spawn_playback(url);
                }
            }
            Err(UploadError::Stale) => log::info!("dropping voice reply for an ended session"),
            Err(e) => log::warn!("voice exchange failed: {e}"),
        }
        outcome
    }

    pub async fn send_text(&self, message: &str, token: AccessToken) -> Result<String, UploadError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(UploadError::EmptyMessage);
        }

        let pending = self.state.begin();
        let res = bounded(self.upload_timeout, self.backend.send_text(message, &token))
            .await
            .unwrap_or(Err(UploadError::Network(NetworkError::Timeout)));

        let outcome = pending.settle(|s, current| {
            if !current {
                return Err(UploadError::Stale);
            }
            match res {
                Ok(reply) if !reply.trim().is_empty() => {
                    s.log.push_exchange(message, reply.clone());
                    Ok(reply)
                }
                Ok(_) => {
                    s.log.push_assistant(text::MESSAGE_FAILED);
                    Err(UploadError::Network(NetworkError::Malformed(
                        "empty chat response".into(),
                    )))
                }
                Err(e) => {
                    s.log.push_assistant(text::MESSAGE_FAILED);
                    Err(e)
                }
            }
        });

        if let Err(e) = &outcome {
            log::warn!("text exchange failed: {e}");
        }
        outcome
    }

    fn spawn_playback(&self, url: &str) {
        if !self.playback_enabled {
            log::debug!("playback disabled; skipping {url}");
            return;
        }
        let player = self.player.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            if let Err(e) = player.play(&url).await {
                log::warn!("audio playback failed for {url}: {e:#}");
            }
        });
    }
}
