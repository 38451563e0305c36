// User-facing strings shown by the client.

pub const VOICE_PLACEHOLDER: &str = "(Voice input received)";
pub const VOICE_FAILED: &str = "Voice processing failed.";
pub const MESSAGE_FAILED: &str = "Message failed.";
pub const PROCESSING: &str = "Processing...";
pub const VERIFYING: &str = "Verifying...";

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const REGISTRATION_SUCCEEDED: &str = "Registration successful! Please login.";
pub const CONNECTION_FAILED: &str = "Error connecting to server";
pub const MICROPHONE_DENIED: &str = "Microphone access denied";

pub const LOG_IN: &str = "Log In";
pub const REGISTER: &str = "Register";
pub const HOLD_TO_TALK: &str = "Hold to Talk";
pub const LISTENING: &str = "Listening...";

/// Text for the user's side of a voice exchange: the transcript when the
/// backend returned one with visible content, otherwise the placeholder.
pub fn user_text_or_placeholder(transcript: Option<&str>) -> String {
    match transcript {
        Some(t) if !t.trim().is_empty() => t.trim().to_string(),
        _ => VOICE_PLACEHOLDER.to_string(),
    }
}

/// Backend error detail if it has visible content, else the fallback.
pub fn detail_or(detail: Option<&str>, fallback: &str) -> String {
    detail
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

pub fn conversation_title(name: &str) -> String {
    format!("IVA - {name}")
}
