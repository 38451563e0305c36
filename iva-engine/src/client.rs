use std::sync::Arc;
use std::time::Duration;

use iva_core::config::ClientConfig;
use iva_core::types::{Identity, Message, RecorderState, Registration, View};
use iva_core::view::{ViewModel, render};

use crate::error::{AuthError, NetworkError, RecorderError, RegError, UploadError};
use crate::pipeline::UploadPipeline;
use crate::recorder::RecorderController;
use crate::session_store::{Registered, SessionStore, bounded};
use crate::state::SharedState;
use crate::traits::{AudioPlayer, Backend, CaptureDevice, ExchangeReply};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub auth_timeout: Duration,
    pub upload_timeout: Duration,
    pub stop_timeout: Duration,
    pub playback_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for EngineConfig {
    fn from(cfg: &ClientConfig) -> Self {
        Self {
            auth_timeout: cfg.auth_timeout(),
            upload_timeout: cfg.upload_timeout(),
            stop_timeout: cfg.stop_timeout(),
            playback_enabled: cfg.playback_enabled,
        }
    }
}

/// Entry point for a front end: dispatches user intents to the session store,
/// recorder and upload pipeline, and renders the current screen.
#[derive(Clone)]
pub struct VoiceClient {
    state: SharedState,
    backend: Arc<dyn Backend>,
    sessions: SessionStore,
    recorder: RecorderController,
    pipeline: UploadPipeline,
}

impl VoiceClient {
    pub fn new(
        cfg: EngineConfig,
        backend: Arc<dyn Backend>,
        device: Arc<dyn CaptureDevice>,
        player: Arc<dyn AudioPlayer>,
    ) -> Self {
        let state = SharedState::default();
        let recorder = RecorderController::new(device, cfg.stop_timeout);
        let sessions = SessionStore::new(
            backend.clone(),
            state.clone(),
            recorder.clone(),
            cfg.auth_timeout,
        );
        let pipeline = UploadPipeline::new(
            backend.clone(),
            player,
            state.clone(),
            cfg.upload_timeout,
            cfg.playback_enabled,
        );

        Self {
            state,
            backend,
            sessions,
            recorder,
            pipeline,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn recorder(&self) -> &RecorderController {
        &self.recorder
    }

    pub fn pipeline(&self) -> &UploadPipeline {
        &self.pipeline
    }

    pub fn view(&self) -> ViewModel {
        // Read recorder state first; the two locks are never nested.
        let recorder = self.recorder.state();
        let s = self.state.lock();
        render(&s.session, &s.log, s.pending > 0, recorder)
    }

    pub fn current_view(&self) -> View {
        self.sessions.view()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.sessions.identity()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().log.messages().to_vec()
    }

    pub fn loading(&self) -> bool {
        self.state.lock().pending > 0
    }

    pub fn recorder_state(&self) -> RecorderState {
        self.recorder.state()
    }

    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Identity, AuthError> {
        self.sessions.login(email, password).await
    }

    pub async fn register(&self, reg: Registration) -> Result<Registered, RegError> {
        self.sessions.register(reg).await
    }

    pub fn logout(&self) {
        self.sessions.logout();
    }

    pub fn show_register(&self) -> bool {
        self.sessions.show_register()
    }

    pub fn show_login(&self) -> bool {
        self.sessions.show_login()
    }

    pub async fn start_recording(&self) -> Result<(), RecorderError> {
        if !self.state.lock().session.is_authenticated() {
            return Err(RecorderError::NotAuthenticated);
        }
        self.recorder.start().await
    }

    /// Finish the current recording and run the voice exchange for it.
    /// Returns `None` when there was no recording to finish.
    pub async fn stop_recording(&self) -> Option<Result<ExchangeReply, UploadError>> {
        let clip = self.recorder.stop().await?;

        // The token is read once, here, and travels with this upload.
        let token = self.state.lock().session.token().cloned();
        let Some(token) = token else {
            log::info!("dropping clip recorded by a session that has ended");
            return Some(Err(UploadError::NotAuthenticated));
        };
        Some(self.pipeline.submit(clip, token).await)
    }

    pub async fn send_text(&self, message: &str) -> Result<String, UploadError> {
        let token = self.state.lock().session.token().cloned();
        let token = token.ok_or(UploadError::NotAuthenticated)?;
        self.pipeline.send_text(message, token).await
    }

    pub async fn health(&self, limit: Duration) -> Result<bool, NetworkError> {
        bounded(limit, self.backend.health())
            .await
            .unwrap_or(Err(NetworkError::Timeout))
    }
}
