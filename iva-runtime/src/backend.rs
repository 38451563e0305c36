use anyhow::Context;
use iva_audio::resample::resample_mono_f32;
use iva_audio::wav::{WAV_MIME, encode_wav_mono_i16};
use iva_core::config::ClientConfig;
use iva_core::text;
use iva_core::types::{AccessToken, Credentials, Identity, Registration};
use iva_engine::error::{AuthError, NetworkError, RegError, UploadError};
use iva_engine::traits::{Backend, Clip, ExchangeReply};
use iva_providers::backend::{
    AudioFile, build_chat_request, build_health_request, build_login_request,
    build_register_request, build_voice_request,
};
use iva_providers::parse::{parse_chat, parse_error_detail, parse_health, parse_login, parse_voice};
use iva_providers::request::HttpRequest;
use iva_providers::runtime::{HttpResponse, Timeouts, TransportError, execute};

pub const UPLOAD_FILENAME: &str = "recording.wav";

/// Talks to the assistant backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    auth: Timeouts,
    upload: Timeouts,
    upload_sample_rate_hz: u32,
}

impl HttpBackend {
    pub fn new(cfg: &ClientConfig) -> Self {
        Self {
            base_url: cfg.backend_url.clone(),
            auth: Timeouts {
                connect: cfg.connect_timeout(),
                total: cfg.auth_timeout(),
            },
            upload: Timeouts {
                connect: cfg.connect_timeout(),
                total: cfg.upload_timeout(),
            },
            upload_sample_rate_hz: cfg.upload_sample_rate_hz,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, req: &HttpRequest, timeouts: &Timeouts) -> Result<HttpResponse, NetworkError> {
        log::debug!("-> {req:?}");
        let resp = execute(req, timeouts).await.map_err(network_error)?;
        log::debug!("<- {} {} ({} bytes)", resp.status, req.url, resp.body.len());
        Ok(resp)
    }
}

fn network_error(e: TransportError) -> NetworkError {
    match e {
        TransportError::Timeout => NetworkError::Timeout,
        TransportError::Connect(msg) | TransportError::InvalidRequest(msg) | TransportError::Other(msg) => {
            NetworkError::Unreachable(msg)
        }
    }
}

fn malformed(e: anyhow::Error) -> NetworkError {
    NetworkError::Malformed(format!("{e:#}"))
}

/// Resample a clip to the upload rate and wrap it as a 16-bit WAV file.
pub fn package_clip(clip: &Clip, target_sample_rate_hz: u32) -> anyhow::Result<AudioFile> {
    let samples = resample_mono_f32(&clip.samples(), clip.sample_rate_hz, target_sample_rate_hz)
        .context("resample clip for upload")?;
    Ok(AudioFile {
        filename: UPLOAD_FILENAME.into(),
        mime_type: WAV_MIME.into(),
        bytes: encode_wav_mono_i16(&samples, target_sample_rate_hz)?,
    })
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn login(&self, creds: &Credentials) -> Result<Identity, AuthError> {
        let req = build_login_request(&self.base_url, creds);
        let resp = self.send(&req, &self.auth).await?;

        if !resp.is_success() {
            let detail = parse_error_detail(&resp.body);
            return Err(AuthError::Rejected {
                status: resp.status,
                message: text::detail_or(detail.as_deref(), text::LOGIN_FAILED),
            });
        }

        let login = parse_login(&resp.body).map_err(malformed)?;
        Ok(Identity {
            name: login.user.name,
            email: login.user.email,
            token: AccessToken::new(login.access_token),
        })
    }

    async fn register(&self, reg: &Registration) -> Result<(), RegError> {
        let req = build_register_request(&self.base_url, reg)
            .map_err(|e| NetworkError::Malformed(format!("encode registration: {e}")))?;
        let resp = self.send(&req, &self.auth).await?;

        if !resp.is_success() {
            let detail = parse_error_detail(&resp.body);
            return Err(RegError::Rejected {
                status: resp.status,
                message: text::detail_or(detail.as_deref(), text::REGISTRATION_FAILED),
            });
        }
        Ok(())
    }

    async fn submit_voice(
        &self,
        clip: &Clip,
        token: &AccessToken,
    ) -> Result<ExchangeReply, UploadError> {
        let clip = clip.clone();
        let rate = self.upload_sample_rate_hz;
        let file = tokio::task::spawn_blocking(move || package_clip(&clip, rate))
            .await
            .map_err(|e| NetworkError::Malformed(format!("packaging task failed: {e}")))?
            .map_err(malformed)?;

        let req = build_voice_request(&self.base_url, token, &file);
        let resp = self.send(&req, &self.upload).await?;

        if !resp.is_success() {
            if let Some(detail) = parse_error_detail(&resp.body) {
                log::warn!("voice upload rejected ({}): {detail}", resp.status);
            }
            return Err(UploadError::Rejected {
                status: resp.status,
            });
        }

        let voice = parse_voice(&resp.body).map_err(malformed)?;
        Ok(ExchangeReply {
            user_text: voice.user_text,
            response_text: voice.response_text,
            audio_url: voice.audio_url,
        })
    }

    async fn send_text(&self, message: &str, token: &AccessToken) -> Result<String, UploadError> {
        let req = build_chat_request(&self.base_url, token, message);
        let resp = self.send(&req, &self.upload).await?;

        if !resp.is_success() {
            return Err(UploadError::Rejected {
                status: resp.status,
            });
        }
        Ok(parse_chat(&resp.body).map_err(malformed)?)
    }

    async fn health(&self) -> Result<bool, NetworkError> {
        let req = build_health_request(&self.base_url);
        let resp = self.send(&req, &self.auth).await?;
        if !resp.is_success() {
            return Ok(false);
        }
        parse_health(&resp.body).map_err(malformed)
    }
}
