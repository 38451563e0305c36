use anyhow::{Context, anyhow};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: LoginUser,
}

pub fn parse_login(body: &[u8]) -> anyhow::Result<LoginResponse> {
    let resp: LoginResponse = serde_json::from_slice(body).context("decode login JSON")?;
    if resp.access_token.trim().is_empty() {
        return Err(anyhow!("login response has an empty access_token"));
    }
    Ok(resp)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoiceResponse {
    #[serde(default)]
    pub user_text: Option<String>,
    pub response_text: String,
    #[serde(default)]
    pub audio_url: Option<String>,
}

pub fn parse_voice(body: &[u8]) -> anyhow::Result<VoiceResponse> {
    let mut resp: VoiceResponse = serde_json::from_slice(body).context("decode voice JSON")?;
    if resp.response_text.trim().is_empty() {
        return Err(anyhow!("voice response has no response_text"));
    }
    resp.audio_url = resp.audio_url.filter(|u| !u.trim().is_empty());
    Ok(resp)
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: Option<String>,
}

pub fn parse_chat(body: &[u8]) -> anyhow::Result<String> {
    let resp: ChatResponse = serde_json::from_slice(body).context("decode chat JSON")?;
    resp.response
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| anyhow!("no response in chat reply"))
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

pub fn parse_health(body: &[u8]) -> anyhow::Result<bool> {
    let resp: HealthResponse = serde_json::from_slice(body).context("decode health JSON")?;
    Ok(resp.status == "ok")
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Extract the human-readable `detail` from an error body.
///
/// Accepts a plain string or a validation list of `{ "msg": ... }` objects.
/// Returns `None` for bodies that are not JSON or carry no usable detail.
pub fn parse_error_detail(body: &[u8]) -> Option<String> {
    let resp: ErrorBody = serde_json::from_slice(body).ok()?;
    let detail = match resp.detail? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s.clone()),
                other => other.get("msg").and_then(|m| m.as_str()).map(str::to_string),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => return None,
    };
    let detail = detail.trim();
    (!detail.is_empty()).then(|| detail.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_login_and_ignores_extra_user_fields() {
        let body = br#"{"access_token":"abc","token_type":"bearer","user":{"name":"Ada L","email":"ada@example.com","id":7}}"#;
        let resp = parse_login(body).unwrap();
        assert_eq!(resp.access_token, "abc");
        assert_eq!(resp.user.name, "Ada L");
    }

    #[test]
    fn login_without_token_errors() {
        assert!(parse_login(br#"{"user":{"name":"a","email":"b"}}"#).is_err());
        assert!(parse_login(br#"{"access_token":" ","user":{"name":"a","email":"b"}}"#).is_err());
    }

    #[test]
    fn parses_voice_with_optional_fields() {
        let resp = parse_voice(br#"{"response_text":"Hello","audio_url":"/clip/1"}"#).unwrap();
        assert_eq!(resp.user_text, None);
        assert_eq!(resp.response_text, "Hello");
        assert_eq!(resp.audio_url.as_deref(), Some("/clip/1"));

        let resp = parse_voice(br#"{"user_text":"hi","response_text":"Hello","audio_url":""}"#).unwrap();
        assert_eq!(resp.user_text.as_deref(), Some("hi"));
        assert_eq!(resp.audio_url, None);
    }

    #[test]
    fn voice_without_response_text_errors() {
        assert!(parse_voice(br#"{"user_text":"hi"}"#).is_err());
        assert!(parse_voice(br#"{"response_text":""}"#).is_err());
    }

    #[test]
    fn error_detail_string_and_list() {
        assert_eq!(
            parse_error_detail(br#"{"detail":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            parse_error_detail(
                br#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"},{"msg":"field required"}]}"#
            )
            .as_deref(),
            Some("value is not a valid email address; field required")
        );
        assert_eq!(parse_error_detail(br#"{"detail":""}"#), None);
        assert_eq!(parse_error_detail(br#"{}"#), None);
        assert_eq!(parse_error_detail(b"<html>502</html>"), None);
    }

    #[test]
    fn parses_chat_and_health() {
        assert_eq!(parse_chat(br#"{"response":"Sure."}"#).unwrap(), "Sure.");
        assert!(parse_chat(br#"{}"#).is_err());
        assert!(parse_health(br#"{"status":"ok"}"#).unwrap());
        assert!(!parse_health(br#"{"status":"degraded"}"#).unwrap());
    }
}
