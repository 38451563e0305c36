use crate::request::{Body, HttpRequest};
use iva_core::types::{AccessToken, Credentials, Registration};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Password-grant style login: the backend reads `username`/`password` form fields.
pub fn build_login_request(base_url: &str, creds: &Credentials) -> HttpRequest {
    let form = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("username", &creds.email)
        .append_pair("password", &creds.password)
        .finish();

    HttpRequest {
        method: "POST".into(),
        url: join_url(base_url, "/login"),
        headers: vec![
            (
                "Content-Type".into(),
                "application/x-www-form-urlencoded".into(),
            ),
            ("Accept".into(), "application/json".into()),
        ],
        body: Body::Form(form),
    }
}

pub fn build_register_request(
    base_url: &str,
    reg: &Registration,
) -> serde_json::Result<HttpRequest> {
    Ok(HttpRequest {
        method: "POST".into(),
        url: join_url(base_url, "/register"),
        headers: vec![
            ("Content-Type".into(), "application/json".into()),
            ("Accept".into(), "application/json".into()),
        ],
        body: Body::Json(serde_json::to_string(reg)?),
    })
}

pub fn build_voice_request(base_url: &str, token: &AccessToken, audio: &AudioFile) -> HttpRequest {
    let boundary = format!("Boundary-{}", uuid::Uuid::new_v4());

    let mut body: Vec<u8> = Vec::new();
    append_file(
        &mut body,
        &boundary,
        "file",
        &audio.filename,
        &audio.mime_type,
        &audio.bytes,
    );
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    HttpRequest {
        method: "POST".into(),
        url: join_url(base_url, "/voice"),
        headers: vec![
            (
                "Content-Type".into(),
                format!("multipart/form-data; boundary={}", boundary),
            ),
            ("Accept".into(), "application/json".into()),
            bearer(token),
        ],
        body: Body::MultipartFormData {
            boundary,
            bytes: body,
        },
    }
}

pub fn build_chat_request(base_url: &str, token: &AccessToken, message: &str) -> HttpRequest {
    HttpRequest {
        method: "POST".into(),
        url: join_url(base_url, "/chat"),
        headers: vec![
            ("Content-Type".into(), "application/json".into()),
            ("Accept".into(), "application/json".into()),
            bearer(token),
        ],
        body: Body::Json(json!({ "message": message }).to_string()),
    }
}

pub fn build_health_request(base_url: &str) -> HttpRequest {
    HttpRequest {
        method: "GET".into(),
        url: join_url(base_url, "/health"),
        headers: vec![("Accept".into(), "application/json".into())],
        body: Body::Empty,
    }
}

/// Fetch a reply clip. `audio_url` is relative to the backend origin unless it
/// is already absolute.
pub fn build_audio_fetch_request(base_url: &str, audio_url: &str) -> HttpRequest {
    let url = if audio_url.starts_with("http://") || audio_url.starts_with("https://") {
        audio_url.to_string()
    } else {
        join_url(base_url, audio_url)
    };

    HttpRequest {
        method: "GET".into(),
        url,
        headers: vec![],
        body: Body::Empty,
    }
}

fn bearer(token: &AccessToken) -> (String, String) {
    ("Authorization".into(), format!("Bearer {}", token.as_str()))
}

pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(
            join_url("http://localhost:8000/", "/login"),
            "http://localhost:8000/login"
        );
        assert_eq!(
            join_url("http://localhost:8000", "audio/x.mp3"),
            "http://localhost:8000/audio/x.mp3"
        );
    }

    #[test]
    fn login_is_form_encoded() {
        let req = build_login_request(
            "http://localhost:8000",
            &Credentials::new("a@b.com", "p&ss word"),
        );
        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "http://localhost:8000/login");
        assert_eq!(
            req.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(req.header("authorization"), None);
        match req.body {
            Body::Form(s) => assert_eq!(s, "username=a%40b.com&password=p%26ss+word"),
            _ => panic!("expected form"),
        }
    }

    #[test]
    fn register_is_json() {
        let reg = Registration {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "pw".into(),
            registration_number: "LN-42".into(),
        };
        let req = build_register_request("http://localhost:8000", &reg).unwrap();
        assert!(req.url.ends_with("/register"));
        match req.body {
            Body::Json(s) => {
                let v: serde_json::Value = serde_json::from_str(&s).unwrap();
                assert_eq!(v["last_name"], "Lovelace");
                assert_eq!(v["registration_number"], "LN-42");
            }
            _ => panic!("expected json"),
        }
    }

    #[test]
    fn voice_is_authorized_multipart_with_file_part() {
        let audio = AudioFile {
            filename: "recording.wav".into(),
            mime_type: "audio/wav".into(),
            bytes: vec![1, 2, 3],
        };
        let req = build_voice_request("http://localhost:8000", &AccessToken::new("k"), &audio);
        assert!(req.url.ends_with("/voice"));
        assert_eq!(req.header("authorization"), Some("Bearer k"));

        match req.body {
            Body::MultipartFormData { boundary, bytes } => {
                assert_eq!(
                    req.headers
                        .iter()
                        .find(|(k, _)| k == "Content-Type")
                        .map(|(_, v)| v.clone()),
                    Some(format!("multipart/form-data; boundary={boundary}"))
                );
                let s = String::from_utf8_lossy(&bytes);
                assert!(s.contains("name=\"file\"; filename=\"recording.wav\""));
                assert!(s.contains("Content-Type: audio/wav"));
                assert!(s.ends_with(&format!("--{boundary}--\r\n")));
            }
            _ => panic!("expected multipart"),
        }
    }

    #[test]
    fn audio_url_resolves_against_backend_origin() {
        let req = build_audio_fetch_request("http://localhost:8000/", "/audio/abc_out.mp3");
        assert_eq!(req.url, "http://localhost:8000/audio/abc_out.mp3");

        let req = build_audio_fetch_request("http://localhost:8000", "https://cdn.example.com/a.mp3");
        assert_eq!(req.url, "https://cdn.example.com/a.mp3");
    }

    #[test]
    fn chat_carries_message_and_token() {
        let req = build_chat_request("http://localhost:8000", &AccessToken::new("k"), "hi");
        assert_eq!(req.header("authorization"), Some("Bearer k"));
        assert_eq!(req.body, Body::Json(r#"{"message":"hi"}"#.into()));
    }
}
