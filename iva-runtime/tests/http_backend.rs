use std::sync::{Arc, Mutex};
use std::time::Duration;

use iva_audio::decode::DecodedAudio;
use iva_audio::file_source::FileCaptureDevice;
use iva_audio::playback::PlaybackSink;
use iva_audio::wav::encode_wav_mono_i16;
use iva_core::config::ClientConfig;
use iva_core::text;
use iva_core::types::{AccessToken, Credentials, Registration, Role};
use iva_engine::error::{AuthError, NetworkError, RegError, UploadError};
use iva_engine::traits::{Backend, Clip};
use iva_runtime::{HttpBackend, build_client_from_config};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        backend_url: server.uri(),
        ..ClientConfig::default()
    }
}

fn registration() -> Registration {
    Registration {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.com".into(),
        password: "secret".into(),
        registration_number: "R-1".into(),
    }
}

fn clip() -> Clip {
    Clip {
        sample_rate_hz: 16_000,
        fragments: vec![vec![0.0; 160], vec![0.25; 160]],
    }
}

#[tokio::test]
async fn login_success_builds_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("username=ada%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok-1",
            "token_type": "bearer",
            "user": { "name": "Ada", "email": "ada@example.com" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config(&server));
    let id = backend
        .login(&Credentials::new("ada@example.com", "secret"))
        .await
        .unwrap();
    assert_eq!(id.name, "Ada");
    assert_eq!(id.token.as_str(), "tok-1");
}

#[tokio::test]
async fn login_rejection_carries_backend_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({ "detail": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config(&server));
    let err = backend
        .login(&Credentials::new("ada@example.com", "nope"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AuthError::Rejected {
            status: 401,
            message: "Invalid credentials".into()
        }
    );
}

#[tokio::test]
async fn login_rejection_without_detail_uses_generic_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config(&server));
    let err = backend
        .login(&Credentials::new("ada@example.com", "secret"))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), text::LOGIN_FAILED);
}

#[tokio::test]
async fn login_with_malformed_body_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config(&server));
    let err = backend
        .login(&Credentials::new("ada@example.com", "secret"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Network(NetworkError::Malformed(_))));
    assert_eq!(err.user_message(), text::CONNECTION_FAILED);
}

#[tokio::test]
async fn register_joins_validation_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_string_contains("\"registration_number\":\"R-1\""))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "detail": [
                { "loc": ["body", "email"], "msg": "invalid email" },
                { "loc": ["body", "password"], "msg": "too short" }
            ]
        })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config(&server));
    let err = backend.register(&registration()).await.unwrap_err();
    assert_eq!(err.user_message(), "invalid email; too short");
    assert!(matches!(err, RegError::Rejected { status: 422, .. }));
}

#[tokio::test]
async fn voice_upload_sends_wav_with_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/voice"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user_text": "what's the weather",
            "response_text": "Sunny.",
            "audio_url": "/clip/1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config(&server));
    let reply = backend
        .submit_voice(&clip(), &AccessToken::new("tok-1"))
        .await
        .unwrap();
    assert_eq!(reply.user_text.as_deref(), Some("what's the weather"));
    assert_eq!(reply.response_text, "Sunny.");
    assert_eq!(reply.audio_url.as_deref(), Some("/clip/1"));

    // The body holds binary WAV data, so search it as bytes.
    let requests = server.received_requests().await.unwrap();
    let body = &requests[0].body;
    let contains = |needle: &[u8]| body.windows(needle.len()).any(|w| w == needle);
    assert!(contains(&b"name=\"file\"; filename=\"recording.wav\""[..]));
    assert!(contains(&b"Content-Type: audio/wav\r\n\r\nRIFF"[..]));
}

#[tokio::test]
async fn voice_upload_failure_status_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/voice"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config(&server));
    let err = backend
        .submit_voice(&clip(), &AccessToken::new("tok-1"))
        .await
        .unwrap_err();
    assert_eq!(err, UploadError::Rejected { status: 500 });
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let cfg = ClientConfig {
        backend_url: "http://127.0.0.1:1".into(),
        connect_timeout_ms: 500,
        ..ClientConfig::default()
    };
    let backend = HttpBackend::new(&cfg);
    let err = backend
        .login(&Credentials::new("ada@example.com", "secret"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Network(_)));
}

#[tokio::test]
async fn chat_and_health() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_string_contains("\"message\":\"hello\""))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "hi" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config(&server));
    assert_eq!(
        backend.send_text("hello", &AccessToken::new("t")).await.unwrap(),
        "hi"
    );
    assert!(backend.health().await.unwrap());
}

#[derive(Default)]
struct RecordingSink {
    played: Mutex<Vec<DecodedAudio>>,
}

impl PlaybackSink for RecordingSink {
    fn play(&self, audio: DecodedAudio) -> anyhow::Result<()> {
        self.played.lock().unwrap().push(audio);
        Ok(())
    }
}

#[tokio::test]
async fn voice_round_trip_through_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok-1",
            "user": { "name": "Ada", "email": "ada@example.com" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/voice"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response_text": "Hello",
            "audio_url": "/clip/1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/clip/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/wav")
                .set_body_bytes(encode_wav_mono_i16(&[0.1; 1_600], 16_000).unwrap()),
        )
        .mount(&server)
        .await;

    let mic = FileCaptureDevice::new(DecodedAudio {
        sample_rate_hz: 16_000,
        samples: vec![0.2; 4_800],
    })
    .paced(false);
    let sink = Arc::new(RecordingSink::default());
    let client = build_client_from_config(&config(&server), Arc::new(mic), sink.clone()).unwrap();

    client.login("ada@example.com", "secret").await.unwrap();
    client.start_recording().await.unwrap();
    let reply = client.stop_recording().await.unwrap().unwrap();
    assert_eq!(reply.response_text, "Hello");

    let log: Vec<(Role, String)> = client
        .messages()
        .into_iter()
        .map(|m| (m.role, m.text))
        .collect();
    assert_eq!(
        log,
        vec![
            (Role::User, text::VOICE_PLACEHOLDER.to_string()),
            (Role::Assistant, "Hello".to_string()),
        ]
    );

    for _ in 0..100 {
        if !sink.played.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let played = sink.played.lock().unwrap();
    assert_eq!(played.len(), 1);
    assert_eq!(played[0].samples.len(), 1_600);
}
